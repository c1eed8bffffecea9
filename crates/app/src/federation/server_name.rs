//! Matrix server names: `host[:port]`.

use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use thiserror::Error;

/// Port used for federation when a server name does not carry one.
pub const DEFAULT_FEDERATION_PORT: u16 = 8448;

const MAX_HOSTNAME_LENGTH: usize = 255;
const MAX_LABEL_LENGTH: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid server name {0:?}")]
pub struct InvalidServerName(pub String);

/// A parsed server name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerName {
    host: String,
    port: Option<u16>,
}

impl ServerName {
    /// Hostname or IP literal, IPv6 literals keep their brackets.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Base URL of the server's federation API.
    #[must_use]
    pub fn federation_base_url(&self) -> String {
        format!(
            "https://{}:{}",
            self.host,
            self.port.unwrap_or(DEFAULT_FEDERATION_PORT)
        )
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{port}", self.host),
            None => f.write_str(&self.host),
        }
    }
}

impl FromStr for ServerName {
    type Err = InvalidServerName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidServerName(value.to_string());

        let (host, port) = split_port(value).ok_or_else(invalid)?;

        if !is_valid_host(host) {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

fn split_port(value: &str) -> Option<(&str, Option<u16>)> {
    let host_end = if value.starts_with('[') {
        value.find(']')? + 1
    } else {
        value.find(':').unwrap_or(value.len())
    };

    let (host, rest) = value.split_at_checked(host_end)?;

    if rest.is_empty() {
        return Some((host, None));
    }

    let digits = rest.strip_prefix(':')?;

    if digits.is_empty() || digits.len() > 5 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let port = digits.parse::<u16>().ok().filter(|port| *port > 0)?;

    Some((host, Some(port)))
}

fn is_valid_host(host: &str) -> bool {
    if let Some(literal) = host.strip_prefix('[') {
        return literal
            .strip_suffix(']')
            .is_some_and(|address| address.parse::<Ipv6Addr>().is_ok());
    }

    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return host.parse::<Ipv4Addr>().is_ok();
    }

    is_valid_hostname(host)
}

fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOSTNAME_LENGTH {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LENGTH
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Server part of a Matrix user id (`@localpart:server`).
#[must_use]
pub fn user_id_server(user_id: &str) -> Option<&str> {
    user_id
        .strip_prefix('@')?
        .split_once(':')
        .map(|(_, server)| server)
}
