use super::clock::{Clock, MonotonicClock};
use crate::logging::{FacadeLogger, LogLevel, NetLogger};
use crate::net::{AddressMode, ClientTransport, MacAddress, NetworkInterface, StaticConfig, TcpClient};
use crate::runtime::config::{StaticLinkPolicy, SupervisorConfig};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

const COMPONENT: &str = "NetKeeper";

/// Connection state as seen by the host after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetState {
    #[default]
    Disconnected,
    /// Only held while an attempt runs inside `step`.
    Connecting,
    Connected,
}

impl fmt::Display for NetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NetState::Disconnected => "DISCONNECTED",
            NetState::Connecting => "CONNECTING",
            NetState::Connected => "CONNECTED",
        };
        f.write_str(s)
    }
}

pub(crate) type Callback = Box<dyn FnMut() + Send>;

/// Edge produced by a step that has a callback attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Connected,
    Disconnected,
}

/// Keeps a wired interface connected by polling.
///
/// The host calls [`ConnectionSupervisor::step`] on every pass of its run
/// loop. Nothing blocks beyond the driver calls themselves; a failed attempt
/// is retried once `retry_interval_ms` has passed since it started, forever,
/// at a fixed interval.
pub struct ConnectionSupervisor<N: NetworkInterface, T: ClientTransport = TcpClient> {
    mac: MacAddress,
    mode: AddressMode,
    state: NetState,
    /// `None` makes the next step attempt immediately.
    last_attempt_ms: Option<u64>,
    retry_interval_ms: u64,
    static_link_policy: StaticLinkPolicy,
    awaiting_link_confirm: bool,

    interface: N,
    transport: Arc<T>,
    clock: Box<dyn Clock>,
    logger: Arc<dyn NetLogger>,

    on_connect: Option<Callback>,
    on_disconnect: Option<Callback>,
}

impl<N: NetworkInterface, T: ClientTransport> ConnectionSupervisor<N, T> {
    pub fn new(config: SupervisorConfig, mut interface: N, transport: T) -> Self {
        if let Some(pin) = config.chip_select {
            interface.select_chip(pin);
        }

        let supervisor = ConnectionSupervisor {
            mac: config.mac,
            mode: config.mode,
            state: NetState::Disconnected,
            last_attempt_ms: None,
            retry_interval_ms: config.retry_interval_ms,
            static_link_policy: config.static_link_policy,
            awaiting_link_confirm: false,
            interface,
            transport: Arc::new(transport),
            clock: Box::new(MonotonicClock::new()),
            logger: FacadeLogger::new(),
            on_connect: None,
            on_disconnect: None,
        };
        supervisor.log_mode();
        supervisor
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn NetLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Switch to DHCP. The next step attempts right away.
    pub fn configure_dhcp(&mut self) {
        self.mode = AddressMode::Dhcp;
        self.last_attempt_ms = None;
        self.awaiting_link_confirm = false;
        self.log_mode();
    }

    /// Switch to fixed addressing. The next step attempts right away.
    pub fn configure_static(&mut self, config: StaticConfig) {
        self.mode = AddressMode::Static(config);
        self.last_attempt_ms = None;
        self.awaiting_link_confirm = false;
        self.log_mode();
    }

    /// Advance the state machine once and return the settled state.
    pub fn step(&mut self) -> NetState {
        let (state, edge) = self.advance();
        if let Some(edge) = edge {
            if let Some(callback) = self.callback_slot(edge).as_mut() {
                callback();
            }
        }
        state
    }

    /// Run the state logic without invoking callbacks. The caller fires the
    /// callback for the returned edge, if any.
    pub(crate) fn advance(&mut self) -> (NetState, Option<Transition>) {
        let previous = self.state;
        let now = self.clock.now_ms();

        match self.state {
            NetState::Disconnected => {
                if self.awaiting_link_confirm {
                    self.confirm_static_link();
                } else if self.retry_due(now) {
                    self.state = NetState::Connecting;
                    self.attempt(now);
                }
            }
            NetState::Connecting => {
                // Resolved inside attempt(); never survives a step.
            }
            NetState::Connected => {
                let status = self.interface.maintain();
                if status.is_lease_lost() {
                    self.log(LogLevel::Warn, &format!("DHCP lease lost ({:?}).", status));
                    self.state = NetState::Disconnected;
                }

                if !self.interface.link_up() {
                    self.log(LogLevel::Warn, "Physical link lost.");
                    self.state = NetState::Disconnected;
                }
            }
        }

        let mut edge = None;
        if self.state != previous {
            match (previous, self.state) {
                (_, NetState::Connected) => edge = Some(Transition::Connected),
                (NetState::Connected, NetState::Disconnected) => {
                    // Next attempt a full interval from now.
                    self.last_attempt_ms = Some(now);
                    edge = Some(Transition::Disconnected);
                }
                _ => {}
            }
        }

        (self.state, edge)
    }

    fn callback_slot(&mut self, edge: Transition) -> &mut Option<Callback> {
        match edge {
            Transition::Connected => &mut self.on_connect,
            Transition::Disconnected => &mut self.on_disconnect,
        }
    }

    /// Detach the callback for `edge` so it can run without the supervisor borrowed.
    pub(crate) fn take_callback(&mut self, edge: Transition) -> Option<Callback> {
        self.callback_slot(edge).take()
    }

    /// Put a detached callback back unless the host registered a new one meanwhile.
    pub(crate) fn restore_callback(&mut self, edge: Transition, callback: Callback) {
        let slot = self.callback_slot(edge);
        if slot.is_none() {
            *slot = Some(callback);
        }
    }

    fn retry_due(&self, now: u64) -> bool {
        match self.last_attempt_ms {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.retry_interval_ms,
        }
    }

    fn attempt(&mut self, now: u64) {
        self.last_attempt_ms = Some(now);
        self.log(
            LogLevel::Info,
            &format!("Attempting connection... Mode: {}", self.mode.label()),
        );

        let mode = self.mode;
        self.state = match mode {
            AddressMode::Static(config) => {
                self.interface.begin_static(self.mac, &config);
                if !self.interface.link_up() {
                    self.log(LogLevel::Warn, "Static configuration applied but link is down.");
                    NetState::Disconnected
                } else if self.static_link_policy == StaticLinkPolicy::Confirmed {
                    self.log(LogLevel::Debug, "Link up, waiting one step to confirm.");
                    self.awaiting_link_confirm = true;
                    NetState::Disconnected
                } else {
                    self.log(LogLevel::Info, &format!("Static connection up. IP: {}", config.ip));
                    NetState::Connected
                }
            }
            AddressMode::Dhcp => {
                let leased = self.interface.begin_dhcp(self.mac);
                let address = self.interface.local_address();
                if leased && !address.is_unspecified() {
                    self.log(
                        LogLevel::Info,
                        &format!("DHCP connection successful. IP: {}", address),
                    );
                    NetState::Connected
                } else {
                    self.log(LogLevel::Warn, "DHCP connection failed.");
                    NetState::Disconnected
                }
            }
        };
    }

    fn confirm_static_link(&mut self) {
        self.awaiting_link_confirm = false;
        if self.interface.link_up() {
            self.log(LogLevel::Info, "Static link confirmed.");
            self.state = NetState::Connected;
        } else {
            self.log(LogLevel::Warn, "Link dropped before confirmation.");
        }
    }

    fn log_mode(&self) {
        let msg = match self.mode {
            AddressMode::Dhcp => "Initialized for DHCP.",
            AddressMode::Static(_) => "Initialized for Static IP.",
        };
        self.log(LogLevel::Info, msg);
    }

    fn log(&self, level: LogLevel, msg: &str) {
        self.logger.log(level, COMPONENT, msg);
    }

    pub fn state(&self) -> NetState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == NetState::Connected
    }

    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    pub fn mac(&self) -> MacAddress {
        self.mac
    }

    /// Address held by the interface while connected.
    pub fn local_address(&mut self) -> Option<Ipv4Addr> {
        if self.is_connected() {
            Some(self.interface.local_address())
        } else {
            None
        }
    }

    /// Shared transport for opening connections once connected.
    pub fn transport(&self) -> Arc<T> {
        self.transport.clone()
    }

    pub fn logger(&self) -> Arc<dyn NetLogger> {
        self.logger.clone()
    }

    pub fn set_retry_interval(&mut self, ms: u64) {
        self.retry_interval_ms = ms;
    }

    pub fn retry_interval_ms(&self) -> u64 {
        self.retry_interval_ms
    }

    pub fn last_attempt_ms(&self) -> Option<u64> {
        self.last_attempt_ms
    }

    /// Replace the connect callback. Runs inside `step`, so keep it short.
    /// Under `SupervisorRuntime` it runs after the supervisor lock is
    /// released and may call back into the runtime.
    pub fn on_connect(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_connect = Some(Box::new(callback));
    }

    /// Replace the disconnect callback. Same calling rules as `on_connect`.
    pub fn on_disconnect(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_disconnect = Some(Box::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{MaintainStatus, SimControl, SimulatedInterface};
    use crate::supervisor::clock::ManualClock;

    fn create_supervisor(config: SupervisorConfig) -> (ConnectionSupervisor<SimulatedInterface>, SimControl, ManualClock) {
        let (iface, ctl) = SimulatedInterface::new();
        let clock = ManualClock::new(1_000);
        let sup = ConnectionSupervisor::new(config, iface, TcpClient::new()).with_clock(clock.clone());
        (sup, ctl, clock)
    }

    fn dhcp_config() -> SupervisorConfig {
        SupervisorConfig::new(MacAddress::new([0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED]))
    }

    #[test]
    fn test_initial_state() {
        let (sup, _ctl, _clock) = create_supervisor(dhcp_config());
        assert_eq!(sup.state(), NetState::Disconnected);
        assert!(!sup.is_connected());
        assert_eq!(sup.last_attempt_ms(), None);
        assert_eq!(sup.retry_interval_ms(), 10_000);
    }

    #[test]
    fn test_chip_select_forwarded() {
        let (_sup, ctl, _clock) = create_supervisor(dhcp_config().with_chip_select(10));
        assert_eq!(ctl.chip_select(), Some(10));
    }

    #[test]
    fn test_attempt_records_timestamp() {
        let (mut sup, ctl, clock) = create_supervisor(dhcp_config());
        clock.set(4_200);
        sup.step();
        assert_eq!(sup.last_attempt_ms(), Some(4_200));
        assert_eq!(ctl.dhcp_calls(), 1);
        assert_eq!(ctl.last_mac(), Some(sup.mac()));
    }

    #[test]
    fn test_zero_address_is_failure() {
        let (mut sup, ctl, _clock) = create_supervisor(dhcp_config());
        ctl.set_dhcp_offer(Some(Ipv4Addr::new(10, 0, 0, 5)));
        ctl.set_dhcp_zero_address(true);
        assert_eq!(sup.step(), NetState::Disconnected);
        assert_eq!(sup.local_address(), None);
    }

    #[test]
    fn test_lease_success_codes_keep_connection() {
        let (mut sup, ctl, _clock) = create_supervisor(dhcp_config());
        ctl.set_dhcp_offer(Some(Ipv4Addr::new(10, 0, 0, 5)));
        sup.step();
        ctl.push_maintain(MaintainStatus::RenewSuccess);
        ctl.push_maintain(MaintainStatus::RebindSuccess);
        assert_eq!(sup.step(), NetState::Connected);
        assert_eq!(sup.step(), NetState::Connected);
        assert_eq!(sup.local_address(), Some(Ipv4Addr::new(10, 0, 0, 5)));
    }

    #[test]
    fn test_reconfigure_resets_timer() {
        let (mut sup, ctl, clock) = create_supervisor(dhcp_config());
        sup.step();
        assert_eq!(ctl.attempts(), 1);

        clock.advance(10);
        sup.configure_dhcp();
        assert_eq!(sup.last_attempt_ms(), None);
        sup.step();
        assert_eq!(ctl.attempts(), 2);
    }

    struct CaptureLogger(std::sync::Mutex<Vec<String>>);

    impl NetLogger for CaptureLogger {
        fn log(&self, _level: LogLevel, component: &str, msg: &str) {
            self.0.lock().unwrap().push(format!("[{}] {}", component, msg));
        }
    }

    #[test]
    fn test_loss_reasons_are_logged() {
        let logger = Arc::new(CaptureLogger(std::sync::Mutex::new(Vec::new())));
        let (sup, ctl, _clock) = create_supervisor(dhcp_config());
        let mut sup = sup.with_logger(logger.clone());

        ctl.set_dhcp_offer(Some(Ipv4Addr::new(10, 0, 0, 5)));
        sup.step();
        ctl.push_maintain(MaintainStatus::RenewFailed);
        ctl.set_link(false);
        sup.step();

        let lines = logger.0.lock().unwrap();
        assert!(lines.iter().any(|l| l == "[NetKeeper] DHCP connection successful. IP: 10.0.0.5"));
        assert!(lines.iter().any(|l| l == "[NetKeeper] DHCP lease lost (RenewFailed)."));
        assert!(lines.iter().any(|l| l == "[NetKeeper] Physical link lost."));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(NetState::Disconnected.to_string(), "DISCONNECTED");
        assert_eq!(NetState::Connecting.to_string(), "CONNECTING");
        assert_eq!(NetState::Connected.to_string(), "CONNECTED");
    }
}
