pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fifo;
pub mod fleet;
pub mod ids;
pub mod matching;
pub mod network;
pub mod protocol;
pub mod relocation;
pub mod roaming;
pub mod routing;
pub mod session;
pub mod stats;
pub mod transport;
pub mod zones;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::{DispatcherConfig, PolicyKind, RelocationConfig, RoamingConfig};
pub use dispatcher::{Dispatcher, NoTravelTimes, TravelTimeSource};
pub use error::{DispatchError, Result};
pub use ids::{LinkId, RequestId, VehicleId};
pub use matching::MatchingStrategyKind;
pub use network::{NetworkIndex, Topology};
pub use session::{Session, SessionSummary};
pub use transport::{MemoryTransport, TcpTransport, Transport};
#[cfg(feature = "zmq")]
pub use transport::ZmqTransport;
