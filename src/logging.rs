use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for supervisor diagnostics.
pub trait NetLogger: Send + Sync {
    fn log(&self, level: LogLevel, component: &str, msg: &str);
}

/// Prints straight to stdout, like a serial debug port.
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl NetLogger for ConsoleLogger {
    fn log(&self, level: LogLevel, component: &str, msg: &str) {
        let level_str = match level {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR",
        };
        println!("[{}] [{}] {}", level_str, component, msg);
    }
}

/// Forwards to the `log` facade so the host's logger (env_logger etc.) decides.
pub struct FacadeLogger;

impl FacadeLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl NetLogger for FacadeLogger {
    fn log(&self, level: LogLevel, component: &str, msg: &str) {
        match level {
            LogLevel::Debug => log::debug!(target: "netkeeper", "[{}] {}", component, msg),
            LogLevel::Info => log::info!(target: "netkeeper", "[{}] {}", component, msg),
            LogLevel::Warn => log::warn!(target: "netkeeper", "[{}] {}", component, msg),
            LogLevel::Error => log::error!(target: "netkeeper", "[{}] {}", component, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loggers_are_object_safe() {
        let console: Arc<dyn NetLogger> = ConsoleLogger::new();
        let facade: Arc<dyn NetLogger> = FacadeLogger::new();
        for sink in [console, facade] {
            sink.log(LogLevel::Info, "Test", "hello");
            sink.log(LogLevel::Error, "Test", "still here");
        }
    }
}
