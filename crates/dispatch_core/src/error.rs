use crate::ids::{LinkId, RequestId, VehicleId};

/// Errors raised while dispatching.
///
/// Unknown ids mean the simulator and the dispatcher disagree about the world,
/// so they abort the session instead of continuing with partial state.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown link `{0}`")]
    UnknownLink(LinkId),
    #[error("unknown vehicle `{0}`")]
    UnknownVehicle(VehicleId),
    #[error("unknown request `{0}`")]
    UnknownRequest(RequestId),
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("transport closed by peer")]
    Disconnected,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] serde_json::Error),
    #[cfg(feature = "zmq")]
    #[error(transparent)]
    Zmq(#[from] zmq::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
