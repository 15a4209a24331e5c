pub mod config;
pub mod endpoints;
pub mod errors;
pub mod kernel;
pub mod types;
pub mod validation;
