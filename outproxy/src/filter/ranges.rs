//! CIDR range matching for operator deny lists

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::IpAddr;

/// Matcher for IP addresses against a set of CIDR ranges
#[derive(Debug, Clone, Default)]
pub struct RangeMatcher {
    ipv4_ranges: Vec<Ipv4Net>,
    ipv6_ranges: Vec<Ipv6Net>,
}

impl RangeMatcher {
    /// Create a new empty matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range of either family
    pub fn add_range(&mut self, range: IpNet) {
        match range {
            IpNet::V4(net) => self.ipv4_ranges.push(net.trunc()),
            IpNet::V6(net) => self.ipv6_ranges.push(net.trunc()),
        }
    }

    /// Check if an IP address matches any range
    pub fn matches_ip(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(ipv4) => self.ipv4_ranges.iter().any(|net| net.contains(&ipv4)),
            IpAddr::V6(ipv6) => self.ipv6_ranges.iter().any(|net| net.contains(&ipv6)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4_ranges.is_empty() && self.ipv6_ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ipv4_ranges.len() + self.ipv6_ranges.len()
    }
}

impl FromIterator<IpNet> for RangeMatcher {
    fn from_iter<I: IntoIterator<Item = IpNet>>(iter: I) -> Self {
        let mut matcher = Self::new();
        for range in iter {
            matcher.add_range(range);
        }
        matcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_matching() {
        let mut matcher = RangeMatcher::new();
        matcher.add_range("100.64.0.0/10".parse().unwrap());

        assert!(matcher.matches_ip("100.64.0.1".parse().unwrap()));
        assert!(matcher.matches_ip("100.127.255.255".parse().unwrap()));
        assert!(!matcher.matches_ip("100.128.0.0".parse().unwrap()));
    }

    #[test]
    fn test_ipv6_matching() {
        let mut matcher = RangeMatcher::new();
        matcher.add_range("2001:db8::/32".parse().unwrap());

        assert!(matcher.matches_ip("2001:db8::1".parse().unwrap()));
        assert!(!matcher.matches_ip("2001:db9::1".parse().unwrap()));
        // Families never cross-match
        assert!(!matcher.matches_ip("32.1.13.184".parse().unwrap()));
    }

    #[test]
    fn test_host_bits_are_truncated() {
        let matcher: RangeMatcher = ["198.51.100.77/24".parse().unwrap()].into_iter().collect();
        assert!(matcher.matches_ip("198.51.100.1".parse().unwrap()));
        assert_eq!(matcher.len(), 1);
    }

    #[test]
    fn test_empty() {
        let matcher = RangeMatcher::new();
        assert!(matcher.is_empty());
        assert!(!matcher.matches_ip("8.8.8.8".parse().unwrap()));
    }
}
