// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! WebSocket tag monitoring.
//!
//! The client opens `/ws/machine/{machine_name}` and sends an initial
//! message naming the tags to watch:
//!
//! ```json
//! {"tag_names": "PV, SV, MODE"}
//! ```
//!
//! The server then streams the selected tag values once per second, each
//! frame a standard response envelope. Per-tag failures appear as error
//! strings inside the data map; sending a new `tag_names` message replaces
//! the watch list.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use serde::Deserialize;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Interval between monitoring frames.
const MONITOR_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct WatchRequest {
    tag_names: String,
}

fn parse_tags(text: &str) -> Option<Vec<String>> {
    let request: WatchRequest = serde_json::from_str(text).ok()?;
    let tags: Vec<String> = request
        .tag_names
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// GET /ws/machine/{machine_name}
pub async fn machine_monitor(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| monitor_loop(state, machine_name, socket))
}

async fn monitor_loop(state: AppState, machine_name: String, mut socket: WebSocket) {
    // The first message selects the tags to watch.
    let mut tags = loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => match parse_tags(&text) {
                Some(tags) => break tags,
                None => {
                    let envelope = ApiResponse::<()>::failure(
                        "잘못된 메시지 형식입니다",
                        "INVALID_MESSAGE_FORMAT",
                        "expected {\"tag_names\": \"PV,SV\"}",
                    );
                    if send_json(&mut socket, &envelope).await.is_err() {
                        return;
                    }
                }
            },
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => {}
        }
    };

    let mut ticker = tokio::time::interval(MONITOR_PERIOD);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let data = state.gateway.read_tags(&machine_name, &tags).await;
                let envelope = ApiResponse::success(
                    format!("{} 기계의 선택한 태그 값 조회 성공", machine_name.to_uppercase()),
                    data,
                );
                if send_json(&mut socket, &envelope).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(updated) = parse_tags(&text) {
                            tracing::info!(
                                machine = %machine_name,
                                tags = ?updated,
                                "Monitoring tag list updated"
                            );
                            tags = updated;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(machine = %machine_name, "Monitoring session closed");
}

async fn send_json<T: serde::Serialize>(
    socket: &mut WebSocket,
    envelope: &T,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(envelope)
        .map_err(|e| axum::Error::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    socket.send(Message::Text(json.into())).await
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(r#"{"tag_names": "pv, SV ,mode"}"#).unwrap();
        assert_eq!(tags, vec!["pv", "SV", "mode"]);

        assert!(parse_tags(r#"{"tag_names": ""}"#).is_none());
        assert!(parse_tags("not json").is_none());
        assert!(parse_tags(r#"{"other": "PV"}"#).is_none());
    }
}
