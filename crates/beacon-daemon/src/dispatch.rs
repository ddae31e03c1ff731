use std::sync::Arc;

use beacon_core::EventSink;
use beacon_protocol::{BridgeRequest, BridgeResponse, Command, ProtocolError};
use beacon_scheduler::TriggerPipeline;
use serde_json::Value;
use tracing::{debug, error};

/// Executes bridge commands against the registry and pipeline.
pub struct Dispatcher {
    pipeline: Arc<TriggerPipeline>,
    sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    /// `sink` receives lifecycle events once the host sends `deviceready`.
    pub fn new(pipeline: Arc<TriggerPipeline>, sink: Arc<dyn EventSink>) -> Self {
        Self { pipeline, sink }
    }

    /// Run one command. `None` means a bare acknowledgement.
    pub fn handle(&self, command: Command) -> beacon_scheduler::Result<Option<Value>> {
        let registry = self.pipeline.registry();
        let payload = match command {
            Command::Show(props) => {
                registry.schedule(props)?;
                None
            }
            Command::Update { id, props } => Some(Value::Bool(registry.update(id, props)?.is_some())),
            Command::GetIds => Some(Value::from(
                registry.list_ids().into_iter().map(|id| id.get()).collect::<Vec<_>>(),
            )),
            Command::GetByIds(ids) => Some(Value::Array(registry.properties_for(&ids))),
            Command::Exist(id) => Some(Value::Bool(registry.exists(id))),
            Command::GetAll => Some(Value::Array(
                registry.get_all().into_iter().map(|r| r.to_value()).collect(),
            )),
            Command::Cancel(id) => {
                registry.cancel(id)?;
                None
            }
            Command::CancelAll => {
                registry.cancel_all()?;
                None
            }
            Command::Clear(id) => {
                registry.clear(id);
                None
            }
            Command::ClearAll => {
                registry.clear_all();
                None
            }
            Command::HasPermission => Some(Value::Bool(true)),
            Command::DeviceReady => {
                registry.lifecycle().mark_ready(self.sink.clone());
                None
            }
            Command::Resume => {
                registry.lifecycle().on_resume();
                None
            }
            Command::Pause => {
                registry.lifecycle().on_pause();
                None
            }
            Command::Clicked(id) => Some(Value::Bool(self.pipeline.on_clicked(id))),
            Command::Dismissed(id) => Some(Value::Bool(self.pipeline.on_dismissed(id))),
        };
        Ok(payload)
    }

    pub fn respond(&self, request: &BridgeRequest) -> BridgeResponse {
        let command = match Command::parse(&request.action, &request.args) {
            Ok(Some(command)) => command,
            Ok(None) => {
                debug!(action = %request.action, "action not handled");
                return BridgeResponse::not_handled(&request.id, &request.action);
            }
            Err(e) => return BridgeResponse::err(&request.id, e.code(), &e.to_string()),
        };

        let action = command.action();
        match self.handle(command) {
            Ok(None) => BridgeResponse::ack(&request.id),
            Ok(Some(payload)) => BridgeResponse::ok(&request.id, payload),
            Err(e) => {
                error!(action, error = %e, "bridge command failed");
                BridgeResponse::err(&request.id, "INTERNAL", &e.to_string())
            }
        }
    }

    /// Parse and answer one JSON line. Unparsable lines get an error
    /// response with an empty id.
    pub fn respond_line(&self, line: &str) -> BridgeResponse {
        match serde_json::from_str::<BridgeRequest>(line) {
            Ok(request) => self.respond(&request),
            Err(e) => {
                let e = ProtocolError::from(e);
                BridgeResponse::err("", e.code(), &e.to_string())
            }
        }
    }
}
