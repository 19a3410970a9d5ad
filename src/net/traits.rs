use std::io::Result;
use std::net::{Ipv4Addr, SocketAddr};

use super::address::{MacAddress, StaticConfig};

/// Result of a lease-maintenance pass, mirroring the 0..=4 codes Ethernet
/// controller drivers report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintainStatus {
    /// Nothing was due.
    Nothing,
    RenewFailed,
    RenewSuccess,
    RebindFailed,
    RebindSuccess,
}

impl MaintainStatus {
    /// Maps a raw driver code. Unknown codes are treated as `Nothing`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => MaintainStatus::RenewFailed,
            2 => MaintainStatus::RenewSuccess,
            3 => MaintainStatus::RebindFailed,
            4 => MaintainStatus::RebindSuccess,
            _ => MaintainStatus::Nothing,
        }
    }

    pub fn is_lease_lost(&self) -> bool {
        matches!(self, MaintainStatus::RenewFailed | MaintainStatus::RebindFailed)
    }
}

/// Capability surface of the underlying Ethernet/DHCP driver.
///
/// Every call is expected to return promptly; the supervisor invokes them from
/// inside its non-blocking step.
pub trait NetworkInterface: Send {
    /// Select the SPI chip-select line. Drivers without one ignore it.
    fn select_chip(&mut self, _pin: u8) {}

    /// Start the interface and run DHCP. Returns true when a lease was obtained.
    fn begin_dhcp(&mut self, mac: MacAddress) -> bool;

    /// Start the interface with fixed addressing.
    fn begin_static(&mut self, mac: MacAddress, config: &StaticConfig);

    fn link_up(&mut self) -> bool;

    fn maintain(&mut self) -> MaintainStatus;

    fn local_address(&mut self) -> Ipv4Addr;
}

/// Outbound transport handed to the host once the network is up.
/// Implementations are shared behind `Arc`, so methods take `&self`.
pub trait ClientTransport: Send + Sync {
    fn connect(&self, addr: SocketAddr) -> Result<()>;

    fn send(&self, data: &[u8]) -> Result<usize>;

    /// Returns the number of bytes read; 0 means the peer closed.
    fn receive(&self, buffer: &mut [u8]) -> Result<usize>;

    fn is_open(&self) -> bool;

    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintain_codes() {
        assert_eq!(MaintainStatus::from_code(0), MaintainStatus::Nothing);
        assert_eq!(MaintainStatus::from_code(1), MaintainStatus::RenewFailed);
        assert_eq!(MaintainStatus::from_code(2), MaintainStatus::RenewSuccess);
        assert_eq!(MaintainStatus::from_code(3), MaintainStatus::RebindFailed);
        assert_eq!(MaintainStatus::from_code(4), MaintainStatus::RebindSuccess);
        assert_eq!(MaintainStatus::from_code(9), MaintainStatus::Nothing);
    }

    #[test]
    fn test_only_failures_lose_lease() {
        assert!(MaintainStatus::RenewFailed.is_lease_lost());
        assert!(MaintainStatus::RebindFailed.is_lease_lost());
        assert!(!MaintainStatus::Nothing.is_lease_lost());
        assert!(!MaintainStatus::RenewSuccess.is_lease_lost());
        assert!(!MaintainStatus::RebindSuccess.is_lease_lost());
    }
}
