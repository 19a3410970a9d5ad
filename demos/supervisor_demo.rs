//! Runs the supervisor against a simulated Ethernet controller whose link
//! and DHCP server misbehave on a schedule.
//!
//! Usage: `RUST_LOG=info supervisor_demo [config.json] [--console]`
//!
//! `--console` prints supervisor diagnostics straight to stdout instead of
//! going through the logger.

use netkeeper::logging::ConsoleLogger;
use netkeeper::net::{MaintainStatus, SimulatedInterface};
use netkeeper::{ConnectionSupervisor, SupervisorConfig, SupervisorRuntime, TcpClient};
use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let console = args.iter().any(|a| a == "--console");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .unwrap_or_else(|| "demos/supervisor.json".to_string());
    let config = match SupervisorConfig::load(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("Cannot load {}: {}", path, e);
            std::process::exit(1);
        }
    };
    log::info!("Supervising {} ({})", config.mac, config.mode.label());

    let (iface, ctl) = SimulatedInterface::new();
    let runtime = if console {
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let supervisor = ConnectionSupervisor::new(config, iface, TcpClient::new())
            .with_logger(ConsoleLogger::new());
        SupervisorRuntime::new(supervisor, poll_interval)
    } else {
        SupervisorRuntime::from_config(config, iface, TcpClient::new())
    };

    runtime.with_supervisor(|sup| {
        sup.on_connect(|| log::info!("Host: network is up"));
        sup.on_disconnect(|| log::warn!("Host: network is down"));
    });

    let rt = runtime.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Shutting down...");
        rt.stop();
    }) {
        log::error!("Failed to install Ctrl-C handler: {}", e);
    }

    // DHCP server shows up late, the lease fails once, then the cable is pulled.
    let scenario = ctl.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(3));
        scenario.set_dhcp_offer(Some(Ipv4Addr::new(10, 0, 0, 5)));
        thread::sleep(Duration::from_secs(15));
        scenario.push_maintain(MaintainStatus::RenewFailed);
        thread::sleep(Duration::from_secs(15));
        scenario.set_link(false);
        thread::sleep(Duration::from_secs(5));
        scenario.set_link(true);
    });

    let mut states = runtime.subscribe();
    // Detached: the Ctrl-C handler keeps the runtime (and the sender) alive.
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to start state watcher: {}", e);
                return;
            }
        };
        rt.block_on(async move {
            while states.changed().await.is_ok() {
                log::info!("State -> {}", *states.borrow_and_update());
            }
        });
    });

    runtime.run();
}
