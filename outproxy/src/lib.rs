//! SSRF-safe outbound dialing for the outproxy forward proxy
//!
//! A destination `host:port` is resolved, every resolved address is checked
//! against an [`AddressPolicy`] (plus optional operator deny ranges), the
//! survivors are shuffled and dialed one at a time until one connects.

pub mod dial;
pub mod error;
pub mod filter;

// Re-export commonly used types
pub use dial::{
    Connector, DialerOptions, Filter, FilteringDialer, Network, Resolver, SystemResolver,
    TcpConnector, DEFAULT_TIMEOUT,
};
pub use error::{DialError, Result};
pub use filter::{is_local, is_local_or_ipv6, AddressFilter, AddressPolicy, RangeMatcher};
