use std::str::FromStr;

use beacon_core::NotificationId;
use serde_json::{Map, Value};

use crate::actions;
use crate::error::{ProtocolError, Result};

/// A bridge request after argument parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Schedule (or update in place) from an option mapping.
    Show(Map<String, Value>),
    /// Merge properties over an existing notification.
    Update {
        id: NotificationId,
        props: Map<String, Value>,
    },
    GetIds,
    /// Option mappings for the given ids; `getByIds` and `getOptionsById`.
    GetByIds(Vec<NotificationId>),
    Exist(NotificationId),
    GetAll,
    Cancel(NotificationId),
    CancelAll,
    /// Dismiss from the display only; also reached through `close`.
    Clear(NotificationId),
    ClearAll,
    HasPermission,
    /// The host can now receive events; queued ones are flushed.
    DeviceReady,
    Resume,
    Pause,
    /// The user tapped a displayed notification.
    Clicked(NotificationId),
    /// The user swiped a displayed notification away.
    Dismissed(NotificationId),
}

impl Command {
    /// Parse `action` with its positional `args`.
    ///
    /// Returns `Ok(None)` for actions this bridge does not handle, so the
    /// host can try elsewhere. Argument errors are reported, never guessed.
    pub fn parse(action: &str, args: &[Value]) -> Result<Option<Self>> {
        let command = match action {
            actions::SHOW => Self::Show(show_options(args)?),
            actions::UPDATE => {
                let props = object_arg(actions::UPDATE, args, 0)?;
                let raw = props.get("id").ok_or_else(|| ProtocolError::InvalidArgument {
                    action: actions::UPDATE,
                    reason: "options carry no id".into(),
                })?;
                let id = parse_id(actions::UPDATE, raw)?;
                Self::Update { id, props }
            }
            actions::GET_IDS => Self::GetIds,
            actions::GET_BY_IDS => Self::GetByIds(id_list(actions::GET_BY_IDS, args)?),
            actions::GET_OPTIONS_BY_ID => {
                Self::GetByIds(id_list(actions::GET_OPTIONS_BY_ID, args)?)
            }
            actions::EXIST => Self::Exist(id_arg(actions::EXIST, args)?),
            actions::GET_ALL => Self::GetAll,
            actions::CANCEL => Self::Cancel(id_arg(actions::CANCEL, args)?),
            actions::CANCEL_ALL => Self::CancelAll,
            actions::CLEAR => Self::Clear(id_arg(actions::CLEAR, args)?),
            actions::CLOSE => Self::Clear(id_arg(actions::CLOSE, args)?),
            actions::CLEAR_ALL => Self::ClearAll,
            actions::HAS_PERMISSION => Self::HasPermission,
            actions::DEVICE_READY => Self::DeviceReady,
            actions::RESUME => Self::Resume,
            actions::PAUSE => Self::Pause,
            actions::CLICKED => Self::Clicked(id_arg(actions::CLICKED, args)?),
            actions::DISMISSED => Self::Dismissed(id_arg(actions::DISMISSED, args)?),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// Canonical action name, for logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Show(_) => actions::SHOW,
            Self::Update { .. } => actions::UPDATE,
            Self::GetIds => actions::GET_IDS,
            Self::GetByIds(_) => actions::GET_BY_IDS,
            Self::Exist(_) => actions::EXIST,
            Self::GetAll => actions::GET_ALL,
            Self::Cancel(_) => actions::CANCEL,
            Self::CancelAll => actions::CANCEL_ALL,
            Self::Clear(_) => actions::CLEAR,
            Self::ClearAll => actions::CLEAR_ALL,
            Self::HasPermission => actions::HAS_PERMISSION,
            Self::DeviceReady => actions::DEVICE_READY,
            Self::Resume => actions::RESUME,
            Self::Pause => actions::PAUSE,
            Self::Clicked(_) => actions::CLICKED,
            Self::Dismissed(_) => actions::DISMISSED,
        }
    }
}

/// `show` takes either `[options]` or the web notification form
/// `[title, {body, tag, icon, ...}]`.
fn show_options(args: &[Value]) -> Result<Map<String, Value>> {
    match (args.first(), args.get(1)) {
        (Some(Value::Object(options)), _) => Ok(options.clone()),
        (Some(Value::String(title)), Some(Value::Object(web))) => from_web(title, web),
        (Some(Value::String(_)), None) => Err(ProtocolError::MissingArgument {
            action: actions::SHOW,
            index: 1,
        }),
        (None, _) => Err(ProtocolError::MissingArgument {
            action: actions::SHOW,
            index: 0,
        }),
        _ => Err(ProtocolError::InvalidArgument {
            action: actions::SHOW,
            reason: "expected an options object".into(),
        }),
    }
}

fn from_web(title: &str, web: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut props = Map::new();
    props.insert("title".into(), Value::from(title));
    for (key, value) in web {
        match key.as_str() {
            "body" => {
                props.insert("text".into(), value.clone());
            }
            "tag" => {
                let id = parse_id(actions::SHOW, value)?;
                props.insert("id".into(), Value::from(id.get()));
            }
            _ => {
                props.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(props)
}

fn object_arg(action: &'static str, args: &[Value], index: usize) -> Result<Map<String, Value>> {
    match args.get(index) {
        Some(Value::Object(m)) => Ok(m.clone()),
        Some(_) => Err(ProtocolError::InvalidArgument {
            action,
            reason: format!("argument {index} must be an object"),
        }),
        None => Err(ProtocolError::MissingArgument { action, index }),
    }
}

fn id_arg(action: &'static str, args: &[Value]) -> Result<NotificationId> {
    let raw = args
        .first()
        .ok_or(ProtocolError::MissingArgument { action, index: 0 })?;
    parse_id(action, raw)
}

/// Ids as one array argument, or spread over the positional arguments.
fn id_list(action: &'static str, args: &[Value]) -> Result<Vec<NotificationId>> {
    let raw = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };
    raw.iter().map(|v| parse_id(action, v)).collect()
}

/// Ids arrive as JSON numbers or as numeric strings.
fn parse_id(action: &'static str, value: &Value) -> Result<NotificationId> {
    let invalid = || ProtocolError::InvalidArgument {
        action,
        reason: format!("not a notification id: {value}"),
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(NotificationId)
            .ok_or_else(invalid),
        Value::String(s) => NotificationId::from_str(s).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
