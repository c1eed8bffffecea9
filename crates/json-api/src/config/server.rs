//! Server Config

use std::time::Duration;

use clap::Args;

/// Server runtime network settings.
#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "::")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8090")]
    pub port: u16,

    /// Seconds open requests get to finish on shutdown, 0 to wait for all of them
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 30)]
    pub shutdown_grace_seconds: u64,
}

impl ServerRuntimeConfig {
    /// Get the socket address for binding.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// How long shutdown waits for open requests, `None` meaning no limit.
    #[must_use]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        (self.shutdown_grace_seconds > 0).then(|| Duration::from_secs(self.shutdown_grace_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let config = ServerRuntimeConfig {
            host: "::".to_string(),
            port: 8090,
            shutdown_grace_seconds: 30,
        };

        assert_eq!(config.socket_addr(), "[::]:8090");
    }

    #[test]
    fn ipv4_hosts_are_not_bracketed() {
        let config = ServerRuntimeConfig {
            host: "127.0.0.1".to_string(),
            port: 8090,
            shutdown_grace_seconds: 30,
        };

        assert_eq!(config.socket_addr(), "127.0.0.1:8090");
    }

    #[test]
    fn zero_grace_waits_for_every_request() {
        let mut config = ServerRuntimeConfig {
            host: "::".to_string(),
            port: 8090,
            shutdown_grace_seconds: 0,
        };

        assert_eq!(config.shutdown_grace(), None);

        config.shutdown_grace_seconds = 5;

        assert_eq!(config.shutdown_grace(), Some(Duration::from_secs(5)));
    }
}
