//! Configuration validation and conversion to runtime settings

use super::schema::Config;
use crate::error::{Result, ValidationError};
use ipnet::IpNet;
use outproxy::{AddressFilter, AddressPolicy, DialerOptions, RangeMatcher};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Validated settings the server runs with
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: SocketAddr,
    pub timeout: Duration,
    pub policy: AddressPolicy,
    pub deny: RangeMatcher,
}

impl Settings {
    pub fn filter(&self) -> AddressFilter {
        AddressFilter::new(self.policy).with_deny_ranges(self.deny.clone())
    }

    pub fn dialer_options(&self) -> DialerOptions {
        DialerOptions::from_filter(self.filter()).with_timeout(self.timeout)
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate entire configuration
    pub fn validate(config: &Config) -> Result<Settings> {
        let listen = parse_listen_addr(&config.server.listen)?;

        let timeout = parse_duration(&config.dial.timeout)?;
        if timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout.into());
        }

        let deny = config
            .dial
            .deny_ranges
            .iter()
            .map(|cidr| parse_cidr(cidr))
            .collect::<Result<RangeMatcher>>()?;

        Ok(Settings {
            listen,
            timeout,
            policy: AddressPolicy::from_ipv6_enabled(config.dial.ipv6),
            deny,
        })
    }
}

/// Parse a listen address.
///
/// A bare `:port` means the dual-stack wildcard `[::]:port`. A hostname is
/// resolved once, at startup, and its first address is used.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr> {
    let invalid = || ValidationError::InvalidListenAddress {
        addr: addr.to_string(),
    };

    let full = match addr.strip_prefix(':') {
        Some(port) => format!("[::]:{port}"),
        None => addr.to_string(),
    };

    if let Ok(socket) = full.parse::<SocketAddr>() {
        return Ok(socket);
    }

    full.to_socket_addrs()
        .map_err(|_| invalid())?
        .next()
        .ok_or_else(|| invalid().into())
}

/// Parse durations such as `500ms`, `1s` or `2m`
pub fn parse_duration(value: &str) -> Result<Duration> {
    let invalid = || ValidationError::InvalidDuration {
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (number, unit) = trimmed.split_at(split);
    let number: u64 = number.parse().map_err(|_| invalid())?;

    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(number.checked_mul(60).ok_or_else(invalid)?),
        _ => return Err(invalid().into()),
    };
    Ok(duration)
}

fn parse_cidr(cidr: &str) -> Result<IpNet> {
    cidr.trim().parse::<IpNet>().map_err(|_| {
        ValidationError::InvalidCidr {
            cidr: cidr.to_string(),
        }
        .into()
    })
}
