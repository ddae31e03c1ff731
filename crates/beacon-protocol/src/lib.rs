//! Bridge command surface: action names, argument parsing and the JSON-line
//! frames exchanged with the host.

pub mod actions;
pub mod command;
pub mod error;
pub mod frames;

pub use command::Command;
pub use error::{ProtocolError, Result};
pub use frames::{BridgeRequest, BridgeResponse, ErrorShape, EventFrame};
