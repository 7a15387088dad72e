//! Classification of addresses that must never be dialed directly
//!
//! IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are classified as the IPv4
//! address they carry, so `::ffff:127.0.0.1` is loopback under both policies.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Which addresses the dialer refuses.
///
/// Chosen once at deployment time, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressPolicy {
    /// Refuse local addresses only. Used when IPv6 egress works.
    Local,
    /// Refuse local addresses and every IPv6 destination.
    #[default]
    LocalOrIpv6,
}

impl AddressPolicy {
    pub fn from_ipv6_enabled(enabled: bool) -> Self {
        if enabled {
            AddressPolicy::Local
        } else {
            AddressPolicy::LocalOrIpv6
        }
    }

    pub fn is_forbidden(self, ip: IpAddr) -> bool {
        match self {
            AddressPolicy::Local => is_local(ip),
            AddressPolicy::LocalOrIpv6 => is_local_or_ipv6(ip),
        }
    }
}

impl std::fmt::Display for AddressPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressPolicy::Local => write!(f, "local"),
            AddressPolicy::LocalOrIpv6 => write!(f, "local-or-ipv6"),
        }
    }
}

/// Returns true for loopback, link-local, private, multicast and
/// unspecified addresses of either family
pub fn is_local(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => is_local_v6(v6),
    }
}

/// Returns true for any address without an IPv4 form, otherwise defers to [`is_local`]
pub fn is_local_or_ipv6(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(_) => true,
    }
}

fn is_local_v4(ip: Ipv4Addr) -> bool {
    // 224.0.0.0/24 (link-local multicast) is inside 224.0.0.0/4
    ip.is_link_local()
        || ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_private()
}

fn is_local_v6(ip: Ipv6Addr) -> bool {
    is_interface_local_multicast(&ip)
        || is_link_local_multicast(&ip)
        || is_link_local_unicast(&ip)
        || ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        || is_unique_local(&ip)
}

/// ff01::/16 and other multicast with interface-local scope
fn is_interface_local_multicast(ip: &Ipv6Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 0xff && (octets[1] & 0x0f) == 0x01
}

/// ff02::/16 and other multicast with link-local scope
fn is_link_local_multicast(ip: &Ipv6Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 0xff && (octets[1] & 0x0f) == 0x02
}

/// fe80::/10
fn is_link_local_unicast(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

/// fc00::/7 (RFC 4193)
fn is_unique_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}
