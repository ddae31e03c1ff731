use beacon_core::lifecycle::NotificationEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host → bridge request, one JSON object per line.
/// Wire: `{ "id": "r1", "action": "getIds", "args": [] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Bridge → host response.
/// Wire: `{ "type": "res", "id": "r1", "ok": true, "payload": [...] }`
///
/// `payload` is absent for plain acknowledgements, `error` is absent on
/// success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl BridgeResponse {
    pub fn ok(id: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            frame_type: "res".to_string(),
            id: id.into(),
            ok: true,
            payload: Some(serde_json::to_value(payload).unwrap_or(Value::Null)),
            error: None,
        }
    }

    /// Success with no value.
    pub fn ack(id: impl Into<String>) -> Self {
        Self {
            frame_type: "res".to_string(),
            id: id.into(),
            ok: true,
            payload: None,
            error: None,
        }
    }

    pub fn err(id: impl Into<String>, code: &str, message: &str) -> Self {
        Self {
            frame_type: "res".to_string(),
            id: id.into(),
            ok: false,
            payload: None,
            error: Some(ErrorShape {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }

    pub fn not_handled(id: impl Into<String>, action: &str) -> Self {
        Self::err(id, "NOT_HANDLED", &format!("unknown action: {action}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

/// Bridge → host lifecycle push.
/// Wire: `{ "type": "event", "event": "trigger", "id": 1, "state": "foreground", "notification": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(flatten)]
    pub event: NotificationEvent,
}

impl From<NotificationEvent> for EventFrame {
    fn from(event: NotificationEvent) -> Self {
        Self {
            frame_type: "event".to_string(),
            event,
        }
    }
}
