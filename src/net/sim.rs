//! In-process stand-in for an Ethernet controller.
//!
//! The interface and its [`SimControl`] share state, so a test or demo can
//! flip the link, decide DHCP outcomes and queue lease results while the
//! supervisor owns the interface.

use super::address::{MacAddress, StaticConfig};
use super::traits::{MaintainStatus, NetworkInterface};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct SimState {
    link_up: bool,
    /// Address handed out by DHCP; `None` makes DHCP fail.
    dhcp_offer: Option<Ipv4Addr>,
    /// DHCP reports success but leaves the address at 0.0.0.0.
    dhcp_zero_address: bool,
    maintain_queue: VecDeque<MaintainStatus>,
    local_address: Ipv4Addr,
    chip_select: Option<u8>,
    last_mac: Option<MacAddress>,
    last_static: Option<StaticConfig>,
    dhcp_calls: usize,
    static_calls: usize,
    maintain_calls: usize,
}

impl Default for SimState {
    fn default() -> Self {
        SimState {
            link_up: true,
            dhcp_offer: None,
            dhcp_zero_address: false,
            maintain_queue: VecDeque::new(),
            local_address: Ipv4Addr::UNSPECIFIED,
            chip_select: None,
            last_mac: None,
            last_static: None,
            dhcp_calls: 0,
            static_calls: 0,
            maintain_calls: 0,
        }
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SimulatedInterface {
    state: Arc<Mutex<SimState>>,
}

/// Handle used to drive a [`SimulatedInterface`] from outside.
#[derive(Clone)]
pub struct SimControl {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedInterface {
    /// New interface with the link up and DHCP failing until an offer is set.
    pub fn new() -> (Self, SimControl) {
        let state = Arc::new(Mutex::new(SimState::default()));
        (
            SimulatedInterface {
                state: state.clone(),
            },
            SimControl { state },
        )
    }
}

impl NetworkInterface for SimulatedInterface {
    fn select_chip(&mut self, pin: u8) {
        lock(&self.state).chip_select = Some(pin);
    }

    fn begin_dhcp(&mut self, mac: MacAddress) -> bool {
        let mut s = lock(&self.state);
        s.dhcp_calls += 1;
        s.last_mac = Some(mac);
        let offer = s.dhcp_offer;
        match offer {
            Some(addr) if s.link_up => {
                s.local_address = if s.dhcp_zero_address {
                    Ipv4Addr::UNSPECIFIED
                } else {
                    addr
                };
                true
            }
            _ => {
                s.local_address = Ipv4Addr::UNSPECIFIED;
                false
            }
        }
    }

    fn begin_static(&mut self, mac: MacAddress, config: &StaticConfig) {
        let mut s = lock(&self.state);
        s.static_calls += 1;
        s.last_mac = Some(mac);
        s.last_static = Some(*config);
        s.local_address = config.ip;
    }

    fn link_up(&mut self) -> bool {
        lock(&self.state).link_up
    }

    fn maintain(&mut self) -> MaintainStatus {
        let mut s = lock(&self.state);
        s.maintain_calls += 1;
        s.maintain_queue.pop_front().unwrap_or(MaintainStatus::Nothing)
    }

    fn local_address(&mut self) -> Ipv4Addr {
        lock(&self.state).local_address
    }
}

impl SimControl {
    pub fn set_link(&self, up: bool) {
        lock(&self.state).link_up = up;
    }

    /// Make the next DHCP runs succeed with `addr`, or fail with `None`.
    pub fn set_dhcp_offer(&self, addr: Option<Ipv4Addr>) {
        lock(&self.state).dhcp_offer = addr;
    }

    /// DHCP claims success but no address is assigned.
    pub fn set_dhcp_zero_address(&self, zero: bool) {
        lock(&self.state).dhcp_zero_address = zero;
    }

    /// Queue a result for the next `maintain()` call.
    pub fn push_maintain(&self, status: MaintainStatus) {
        lock(&self.state).maintain_queue.push_back(status);
    }

    pub fn dhcp_calls(&self) -> usize {
        lock(&self.state).dhcp_calls
    }

    pub fn static_calls(&self) -> usize {
        lock(&self.state).static_calls
    }

    /// DHCP and static configure calls combined.
    pub fn attempts(&self) -> usize {
        let s = lock(&self.state);
        s.dhcp_calls + s.static_calls
    }

    pub fn maintain_calls(&self) -> usize {
        lock(&self.state).maintain_calls
    }

    pub fn chip_select(&self) -> Option<u8> {
        lock(&self.state).chip_select
    }

    pub fn last_mac(&self) -> Option<MacAddress> {
        lock(&self.state).last_mac
    }

    pub fn last_static(&self) -> Option<StaticConfig> {
        lock(&self.state).last_static
    }
}
