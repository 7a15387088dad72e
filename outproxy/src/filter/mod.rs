//! Address filtering logic

pub mod classifier;
pub mod ranges;

pub use classifier::{is_local, is_local_or_ipv6, AddressPolicy};
pub use ranges::RangeMatcher;

use std::net::IpAddr;

/// A classifier policy plus operator-supplied deny ranges.
///
/// An address is forbidden when the policy forbids it or it falls in any
/// of the extra ranges.
#[derive(Debug, Clone)]
pub struct AddressFilter {
    policy: AddressPolicy,
    deny: RangeMatcher,
}

impl AddressFilter {
    pub fn new(policy: AddressPolicy) -> Self {
        Self {
            policy,
            deny: RangeMatcher::new(),
        }
    }

    pub fn with_deny_ranges(mut self, deny: RangeMatcher) -> Self {
        self.deny = deny;
        self
    }

    pub fn policy(&self) -> AddressPolicy {
        self.policy
    }

    pub fn is_forbidden(&self, ip: IpAddr) -> bool {
        self.policy.is_forbidden(ip) || self.deny.matches_ip(ip.to_canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_ranges_extend_policy() {
        let mut deny = RangeMatcher::new();
        deny.add_range("100.64.0.0/10".parse().unwrap());
        let filter = AddressFilter::new(AddressPolicy::Local).with_deny_ranges(deny);

        assert!(filter.is_forbidden("100.64.1.1".parse().unwrap()));
        assert!(filter.is_forbidden("::ffff:100.64.1.1".parse().unwrap()));
        assert!(filter.is_forbidden("127.0.0.1".parse().unwrap()));
        assert!(!filter.is_forbidden("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_policy_without_ranges() {
        let filter = AddressFilter::new(AddressPolicy::LocalOrIpv6);
        assert_eq!(filter.policy(), AddressPolicy::LocalOrIpv6);
        assert!(filter.is_forbidden("2606:4700::1".parse().unwrap()));
        assert!(!filter.is_forbidden("1.1.1.1".parse().unwrap()));
    }
}
