//! Configuration validation utilities.

use std::net::{SocketAddr, ToSocketAddrs};

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse a `[host]:port` listen address.
///
/// An empty host binds all IPv4 interfaces, so `:7000` means `0.0.0.0:7000`.
/// Host names are resolved and the first address wins.
///
/// # Examples
///
/// ```
/// use packetlog::config::parse_listen_addr;
///
/// assert_eq!(parse_listen_addr(":7000").unwrap().to_string(), "0.0.0.0:7000");
/// assert_eq!(parse_listen_addr("127.0.0.1:8008").unwrap().port(), 8008);
/// assert_eq!(parse_listen_addr("[::1]:9").unwrap().to_string(), "[::1]:9");
/// assert!(parse_listen_addr("7000").is_err());
/// ```
pub fn parse_listen_addr(s: &str) -> Result<SocketAddr, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("listen address is empty".to_string());
    }

    let candidate = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };

    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Ok(addr);
    }

    candidate
        .to_socket_addrs()
        .map_err(|e| format!("invalid listen address '{s}': {e}"))?
        .next()
        .ok_or_else(|| format!("listen address '{s}' resolved to nothing"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_addr_valid() {
        assert_eq!(
            parse_listen_addr(":8008").unwrap(),
            "0.0.0.0:8008".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_addr(" 10.1.2.3:7000 ").unwrap(),
            "10.1.2.3:7000".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_addr("localhost:7000").is_ok());
    }

    #[test]
    fn test_parse_listen_addr_invalid() {
        assert!(parse_listen_addr("").is_err());
        assert!(parse_listen_addr("7000").is_err());
        assert!(parse_listen_addr(":notaport").is_err());
        assert!(parse_listen_addr("1.2.3.4:99999").is_err());
    }
}
