// MIT License - Copyright (c) 2026 Peter Wright
// JSON-RPC request encoding and response decoding

use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{GroupInfo, TargetInfo};
use crate::constants::{PositionType, CRLF, JSONRPC_VERSION};
use crate::error::{Result, UaiError};

/// Requests that can be sent to the UAI+ once logged in.
///
/// # Session
///
/// After TCP connect the controller prompts `User:` then `Password:`.
/// Everything after a successful login is one JSON-RPC 2.0 object per line
/// in both directions. Responses echo the request `id`; lines without an
/// id are unsolicited and ignored.
///
/// ```text
/// -> {"jsonrpc":"2.0","method":"sdn.status.position","params":{"targetID":"A1B2C3"},"id":7}
/// <- {"jsonrpc":"2.0","result":{"targetID":"A1B2C3","position":30},"id":7}
/// <- {"jsonrpc":"2.0","error":{"code":-32602,"message":"Unknown target"},"id":8}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `sdn.status.ping`: readiness probe, empty result.
    Ping,
    /// `sdn.status.info`: label and motor type of a target.
    /// Result: `{"name": "...", "type": "..."}`.
    TargetInfo { target_id: String },
    /// `sdn.status.position`: current closed percentage of a target.
    /// Result: `{"position": 0-100}`.
    TargetPosition { target_id: String },
    /// `sdn.status.groupinfo`: label of a group.
    /// Result: `{"name": "..."}`.
    GroupInfo { group_id: String },
    /// `sdn.move.up`: open fully.
    MoveUp { target_id: String },
    /// `sdn.move.down`: close fully.
    MoveDown { target_id: String },
    /// `sdn.move.stop`: stop any movement.
    Stop { target_id: String },
    /// `sdn.move.to` with `position_type` `percent` or `ip`.
    MoveTo {
        target_id: String,
        position_type: PositionType,
        position: u8,
    },
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Ping => "sdn.status.ping",
            Request::TargetInfo { .. } => "sdn.status.info",
            Request::TargetPosition { .. } => "sdn.status.position",
            Request::GroupInfo { .. } => "sdn.status.groupinfo",
            Request::MoveUp { .. } => "sdn.move.up",
            Request::MoveDown { .. } => "sdn.move.down",
            Request::Stop { .. } => "sdn.move.stop",
            Request::MoveTo { .. } => "sdn.move.to",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Request::Ping => json!({}),
            Request::TargetInfo { target_id }
            | Request::TargetPosition { target_id }
            | Request::MoveUp { target_id }
            | Request::MoveDown { target_id }
            | Request::Stop { target_id } => json!({ "targetID": target_id }),
            Request::GroupInfo { group_id } => json!({ "groupID": group_id }),
            Request::MoveTo {
                target_id,
                position_type,
                position,
            } => json!({
                "targetID": target_id,
                "position_type": position_type.as_str(),
                "position": position,
            }),
        }
    }

    /// Encode as one CRLF-terminated line carrying `id`.
    pub fn to_wire_string(&self, id: u32) -> String {
        let body = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": self.method(),
            "params": self.params(),
            "id": id,
        });
        format!("{}{}", body, CRLF)
    }

    /// A short description for logs and timeout errors.
    pub fn describe(&self) -> String {
        match self {
            Request::Ping => self.method().to_string(),
            Request::GroupInfo { group_id } => format!("{} {}", self.method(), group_id),
            Request::TargetInfo { target_id }
            | Request::TargetPosition { target_id }
            | Request::MoveUp { target_id }
            | Request::MoveDown { target_id }
            | Request::Stop { target_id }
            | Request::MoveTo { target_id, .. } => format!("{} {}", self.method(), target_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// One decoded line from the controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// The result value, or the controller's error as `ErrorResponse`.
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(UaiError::ErrorResponse {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Decode one response line.
pub fn parse_response(line: &str) -> Result<Response> {
    Ok(serde_json::from_str(line.trim())?)
}

fn string_field(result: &Value, field: &str) -> Result<String> {
    result
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| UaiError::InvalidResponse {
            details: format!("missing string field '{}' in {}", field, result),
        })
}

pub fn parse_target_info(result: &Value) -> Result<TargetInfo> {
    Ok(TargetInfo {
        name: string_field(result, "name")?,
        kind: string_field(result, "type")?,
    })
}

pub fn parse_group_info(result: &Value) -> Result<GroupInfo> {
    Ok(GroupInfo {
        name: string_field(result, "name")?,
    })
}

/// Extract a closed percentage, rejecting values outside 0-100.
pub fn parse_position(result: &Value) -> Result<u8> {
    let position = result.get("position").and_then(Value::as_u64);
    match position {
        Some(p) if p <= 100 => Ok(p as u8),
        _ => Err(UaiError::InvalidResponse {
            details: format!("invalid position in {}", result),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_strings() {
        let line = Request::TargetPosition {
            target_id: "A1B2C3".to_string(),
        }
        .to_wire_string(7);
        assert!(line.ends_with("\r\n"));

        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "sdn.status.position");
        assert_eq!(value["params"]["targetID"], "A1B2C3");
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_move_to_params() {
        let req = Request::MoveTo {
            target_id: "A1B2C3".to_string(),
            position_type: PositionType::Intermediate,
            position: 2,
        };
        assert_eq!(
            req.params(),
            json!({"targetID": "A1B2C3", "position_type": "ip", "position": 2})
        );
        assert_eq!(req.describe(), "sdn.move.to A1B2C3");
    }

    #[test]
    fn test_group_info_uses_group_id() {
        let req = Request::GroupInfo {
            group_id: "0000AA".to_string(),
        };
        assert_eq!(req.params(), json!({"groupID": "0000AA"}));
    }

    #[test]
    fn test_parse_success_response() {
        let resp = parse_response(
            r#"{"jsonrpc":"2.0","result":{"name":"Living Room","type":"Glydea"},"id":3}"#,
        )
        .unwrap();
        assert_eq!(resp.id, Some(3));
        let info = parse_target_info(&resp.into_result().unwrap()).unwrap();
        assert_eq!(info.name, "Living Room");
        assert_eq!(info.kind, "Glydea");
    }

    #[test]
    fn test_parse_error_response() {
        let resp = parse_response(
            r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Unknown target"},"id":4}"#,
        )
        .unwrap();
        match resp.into_result() {
            Err(UaiError::ErrorResponse { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Unknown target");
            }
            other => panic!("expected error response, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unsolicited_line() {
        let resp = parse_response(r#"{"jsonrpc":"2.0","method":"sdn.event","params":{}}"#).unwrap();
        assert_eq!(resp.id, None);
    }

    #[test]
    fn test_parse_position_range() {
        assert_eq!(parse_position(&json!({"position": 30})).unwrap(), 30);
        assert!(parse_position(&json!({"position": 101})).is_err());
        assert!(parse_position(&json!({})).is_err());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_response("Welcome"), Err(UaiError::Json(_))));
    }
}
