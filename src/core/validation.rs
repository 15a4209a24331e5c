use crate::core::errors::ChiefPayError;
use chrono::NaiveDateTime;

/// Timestamp layout accepted by the history endpoints: `YYYY-MM-DDTHH:MM:SS.sssZ`
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Check that `value` is a millisecond-precision UTC timestamp
pub fn validate_date(field: &str, value: &str) -> Result<(), ChiefPayError> {
    let invalid = |reason: String| {
        ChiefPayError::ValidationError(format!(
            "{} '{}' is not a YYYY-MM-DDTHH:MM:SS.sssZ timestamp: {}",
            field, value, reason
        ))
    };

    // chrono treats the fractional part as optional; the API does not
    if value.len() != DATE_LEN {
        return Err(invalid(format!("expected {} characters", DATE_LEN)));
    }

    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|e| invalid(e.to_string()))
}

const DATE_LEN: usize = "2000-01-01T00:00:00.000Z".len();

/// Build the `id`/`orderId` query for a single-record lookup.
///
/// The two keys are combinable filters; at least one must be non-empty.
pub fn lookup_params<'a>(
    id: Option<&'a str>,
    order_id: Option<&'a str>,
) -> Result<Vec<(&'static str, &'a str)>, ChiefPayError> {
    let mut params = Vec::with_capacity(2);
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        params.push(("id", id));
    }
    if let Some(order_id) = order_id.filter(|s| !s.is_empty()) {
        params.push(("orderId", order_id));
    }

    if params.is_empty() {
        return Err(ChiefPayError::ValidationError(
            "either id or order_id must be provided".to_string(),
        ));
    }
    Ok(params)
}

pub fn validate_limit(limit: u32) -> Result<(), ChiefPayError> {
    if limit == 0 {
        return Err(ChiefPayError::ValidationError(
            "limit must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
