#![allow(dead_code)]

use chiefpay::{AsyncClient, ChiefPayBuilder};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{self, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use wiremock::{MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test_api_key";

/// Builder pointed at `base_url` with short backoffs
pub fn test_builder(base_url: &str) -> ChiefPayBuilder {
    ChiefPayBuilder::new()
        .with_base_url(base_url)
        .with_api_key(TEST_API_KEY)
        .with_default_retry_after(Duration::from_millis(20))
        .with_handshake_timeout(Duration::from_secs(2))
}

pub fn async_client(server: &MockServer) -> AsyncClient {
    test_builder(&server.uri()).build_async_client().unwrap()
}

/// 200 response wrapping `data` in the API envelope
pub fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

pub fn rates_json() -> Value {
    json!([
        {"name": "BTC", "rate": "65000.12"},
        {"name": "USDT", "rate": "1"}
    ])
}

pub fn invoice_json(id: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "orderId": format!("order-{}", id),
        "description": "Test Invoice",
        "amount": "15.4",
        "payedAmount": "0",
        "feeIncluded": false,
        "accuracy": "0.01",
        "discount": "0",
        "feeRate": "0.01",
        "createdAt": created_at,
        "expiredAt": "2025-03-02T00:00:00.000Z",
        "status": "pending",
        "addresses": [
            {"chain": "TRON", "token": "USDT", "address": "TXyz", "tokenRate": "1"}
        ]
    })
}

pub fn wallet_json(id: &str, order_id: &str) -> Value {
    json!({
        "id": id,
        "orderId": order_id,
        "addresses": [
            {"chain": "BSC", "token": "USDT", "address": "0xabc", "tokenRate": "1"}
        ]
    })
}

pub fn transaction_json(txid: &str, created_at: &str) -> Value {
    json!({
        "txid": txid,
        "chain": "TRON",
        "token": "USDT",
        "value": "15.4",
        "usd": "15.4",
        "fee": "0.1",
        "wallet": wallet_json("w-1", "o-1"),
        "createdAt": created_at,
        "blockCreatedAt": created_at
    })
}

/// How the in-process event-stream server answers the namespace connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    Accept,
    ConnectError,
    /// Upgrade succeeds but no Engine.IO open packet is ever sent
    Silent,
}

/// In-process Socket.IO server speaking the text frames the client expects
///
/// Frames pushed with [`SocketServer::push`] go to the active connection;
/// text frames sent by the client are collected for [`SocketServer::expect_frame`].
pub struct SocketServer {
    pub base_url: String,
    push: mpsc::UnboundedSender<String>,
    received: mpsc::UnboundedReceiver<String>,
}

impl SocketServer {
    pub async fn spawn(handshake: Handshake, ping_interval_ms: u64) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (recv_tx, recv_rx) = mpsc::unbounded_channel();
        let push_rx = Arc::new(Mutex::new(push_rx));

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(
                    stream,
                    handshake,
                    ping_interval_ms,
                    Arc::clone(&push_rx),
                    recv_tx.clone(),
                ));
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            push: push_tx,
            received: recv_rx,
        }
    }

    pub fn push(&self, frame: impl Into<String>) {
        self.push.send(frame.into()).unwrap();
    }

    pub fn push_rates(&self, rates: &Value) {
        self.push(format!("42{}", json!(["rates", rates])));
    }

    pub fn push_notification(&self, notification: &Value) {
        self.push(format!("42{}", json!(["notification", notification])));
    }

    /// Wait until the client sends `expected`, skipping other frames
    pub async fn expect_frame(&mut self, expected: &str) {
        let wait = async {
            while let Some(frame) = self.received.recv().await {
                if frame == expected {
                    return;
                }
            }
            panic!("Server stopped before receiving {:?}", expected);
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap_or_else(|_| panic!("Timed out waiting for client frame {:?}", expected));
    }
}

async fn serve_connection(
    stream: TcpStream,
    handshake: Handshake,
    ping_interval_ms: u64,
    push_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    recv_tx: mpsc::UnboundedSender<String>,
) {
    let authorize = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let key = request
            .headers()
            .get("x-api-key")
            .and_then(|value| value.to_str().ok());
        if request.uri().path() != "/v1/socket.io/" || key != Some(TEST_API_KEY) {
            return Err(http::Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body(Some("unauthorized".to_string()))
                .unwrap());
        }
        Ok(response)
    };

    let Ok(ws) = accept_hdr_async(stream, authorize).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    if handshake == Handshake::Silent {
        while let Some(Ok(_)) = read.next().await {}
        return;
    }

    let open = format!(
        r#"0{{"sid":"engine-sid","upgrades":[],"pingInterval":{},"pingTimeout":{}}}"#,
        ping_interval_ms, ping_interval_ms
    );
    if write.send(Message::Text(open)).await.is_err() {
        return;
    }

    loop {
        match read.next().await {
            Some(Ok(Message::Text(frame))) => {
                let is_connect = frame == "40";
                let _ = recv_tx.send(frame);
                if is_connect {
                    break;
                }
            }
            Some(Ok(_)) => {}
            _ => return,
        }
    }

    if handshake == Handshake::ConnectError {
        let _ = write
            .send(Message::Text(r#"44{"message":"Invalid API key"}"#.to_string()))
            .await;
        return;
    }

    if write
        .send(Message::Text(r#"40{"sid":"socket-sid"}"#.to_string()))
        .await
        .is_err()
    {
        return;
    }

    // one live connection at a time owns the push queue
    let mut push_rx = push_rx.lock().await;
    loop {
        tokio::select! {
            frame = push_rx.recv() => match frame {
                Some(frame) => {
                    if write.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(frame))) => {
                    let _ = recv_tx.send(frame);
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}
