//! Core type definitions using newtype patterns for type safety.

mod port;
mod request_id;
mod target;

pub use port::{Port, PortError, PortSpec};
pub use request_id::RequestId;
pub use target::{is_ip_literal, Target, TargetError};
