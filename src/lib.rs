pub mod logging;
pub mod net;
pub mod runtime;
pub mod supervisor;

pub use net::{AddressMode, ClientTransport, MacAddress, MaintainStatus, NetworkInterface, StaticConfig, TcpClient};
pub use runtime::SupervisorRuntime;
pub use runtime::config::{ConfigError, StaticLinkPolicy, SupervisorConfig};
pub use supervisor::{Clock, ConnectionSupervisor, ManualClock, MonotonicClock, NetState};
