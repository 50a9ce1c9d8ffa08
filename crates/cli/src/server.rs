//! WebSocket JSON API over the letter service.
//!
//! Each text frame carries one request `{"id", "op", ...params}` and gets
//! exactly one reply `{"id", "status", "body"}`.

use futures_util::{SinkExt, StreamExt};
use lexdraft_core::models::CaseInput;
use lexdraft_core::{LetterService, ServiceError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Banner,
    Health,
    GenerateLetter { case: CaseInput },
    GetCase { case_id: String },
    ListCases,
    ExportCase { case_id: String },
    Search {
        query: String,
        #[serde(default)]
        k: Option<usize>,
    },
    DeleteCase { case_id: String },
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub id: Value,
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(id: Value, body: Value) -> Self {
        Self {
            id,
            status: 200,
            body,
        }
    }

    fn error(id: Value, status: u16, detail: impl Into<String>) -> Self {
        Self {
            id,
            status,
            body: json!({ "detail": detail.into() }),
        }
    }
}

/// Accepts connections forever, one task per connection.
pub async fn run(listener: TcpListener, service: Arc<LetterService>) -> anyhow::Result<()> {
    info!("WebSocket server listening on {}", listener.local_addr()?);
    loop {
        let (stream, addr) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            handle_connection(stream, addr, service).await;
        });
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, service: Arc<LetterService>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };
    info!("Client {addr} connected");

    let (mut write, mut read) = ws_stream.split();
    while let Some(msg) = read.next().await {
        let outgoing = match msg {
            Ok(Message::Text(text)) => {
                let reply = handle_request(&service, text.as_str()).await;
                match serde_json::to_string(&reply) {
                    Ok(body) => Message::Text(body.into()),
                    Err(e) => {
                        warn!("failed to encode reply for {addr}: {e}");
                        continue;
                    }
                }
            }
            Ok(Message::Ping(payload)) => Message::Pong(payload),
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            // Binary, Pong and raw frames carry no requests.
            Ok(_) => continue,
        };
        if let Err(e) = write.send(outgoing).await {
            warn!("failed to send to {addr}: {e}");
            break;
        }
    }
    info!("Client {addr} disconnected");
}

/// Parses and executes one request frame.
pub async fn handle_request(service: &LetterService, text: &str) -> Reply {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return Reply::error(Value::Null, 400, format!("invalid JSON: {e}")),
    };
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: Request = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => return Reply::error(id, 400, format!("invalid request: {e}")),
    };
    debug!(?id, "handling request");

    match dispatch(service, request).await {
        Ok(body) => Reply::ok(id, body),
        Err(e) => {
            if e.status_code() >= 500 {
                warn!("request {id} failed: {e:#}");
            }
            Reply::error(id, e.status_code(), e.to_string())
        }
    }
}

async fn dispatch(service: &LetterService, request: Request) -> Result<Value, ServiceError> {
    let body = match request {
        Request::Banner => json!({ "message": service.banner() }),
        Request::Health => to_json(&service.health())?,
        Request::GenerateLetter { case } => to_json(&service.generate_letter(case).await?)?,
        Request::GetCase { case_id } => to_json(&service.get_case(&case_id).await?)?,
        Request::ListCases => to_json(&service.list_cases().await?)?,
        Request::ExportCase { case_id } => to_json(&service.export_case(&case_id).await?)?,
        Request::Search { query, k } => to_json(&service.search(&query, k).await?)?,
        Request::DeleteCase { case_id } => {
            service.delete_case(&case_id).await?;
            json!({ "success": true, "message": "Case deleted" })
        }
    };
    Ok(body)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Internal(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_parse_with_params() {
        let req: Request =
            serde_json::from_str(r#"{"id": 1, "op": "get_case", "case_id": "abc"}"#).unwrap();
        assert!(matches!(req, Request::GetCase { case_id } if case_id == "abc"));

        let req: Request = serde_json::from_str(r#"{"op": "search", "query": "theft"}"#).unwrap();
        assert!(matches!(req, Request::Search { k: None, .. }));

        let req: Request = serde_json::from_str(r#"{"op": "list_cases"}"#).unwrap();
        assert!(matches!(req, Request::ListCases));
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"op": "drop_tables"}"#).is_err());
        assert!(serde_json::from_str::<Request>(r#"{"op": "get_case"}"#).is_err());
    }
}
