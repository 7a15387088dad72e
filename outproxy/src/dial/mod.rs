//! Resolve, filter, shuffle and dial
//!
//! [`FilteringDialer::dial`] turns a `host:port` string into a connection:
//!
//! 1. split the address (malformed input fails before any lookup)
//! 2. resolve the host with the configured [`Resolver`]
//! 3. drop every address the filter forbids, keeping order
//! 4. fail with [`DialError::Restricted`] if nothing is left
//! 5. shuffle the survivors
//! 6. try them one at a time, each bounded by the same timeout
//! 7. return the first connection, or the last attempt's error

pub mod connector;
pub mod resolver;

pub use connector::{Connector, TcpConnector};
pub use resolver::{Resolver, SystemResolver};

use crate::error::{DialError, Result};
use crate::filter::AddressFilter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Per-attempt timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Returns true when an address must not be dialed
pub type Filter = Arc<dyn Fn(IpAddr) -> bool + Send + Sync>;

/// Network families accepted by [`FilteringDialer::dial`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Tcp4,
    Tcp6,
}

impl Network {
    /// IPv4-mapped IPv6 addresses count as IPv4
    fn admits(self, ip: IpAddr) -> bool {
        match self {
            Network::Tcp => true,
            Network::Tcp4 => ip.to_canonical().is_ipv4(),
            Network::Tcp6 => ip.to_canonical().is_ipv6(),
        }
    }
}

impl FromStr for Network {
    type Err = DialError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            other => Err(DialError::UnsupportedNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Tcp => write!(f, "tcp"),
            Network::Tcp4 => write!(f, "tcp4"),
            Network::Tcp6 => write!(f, "tcp6"),
        }
    }
}

/// Dialer configuration.
///
/// The filter is mandatory; the resolver defaults to [`SystemResolver`] and
/// the timeout to [`DEFAULT_TIMEOUT`]. The timeout bounds each address
/// attempt separately, not the whole dial.
#[derive(Clone)]
pub struct DialerOptions {
    filter: Filter,
    resolver: Option<Arc<dyn Resolver>>,
    timeout: Duration,
    seed: Option<u64>,
}

impl DialerOptions {
    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(IpAddr) -> bool + Send + Sync + 'static,
    {
        Self {
            filter: Arc::new(filter),
            resolver: None,
            timeout: DEFAULT_TIMEOUT,
            seed: None,
        }
    }

    pub fn from_filter(filter: AddressFilter) -> Self {
        Self::new(move |ip| filter.is_forbidden(ip))
    }

    pub fn with_resolver<R: Resolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a seeded generator for candidate ordering instead of the thread RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for DialerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialerOptions")
            .field("custom_resolver", &self.resolver.is_some())
            .field("timeout", &self.timeout)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Dialer that only connects to addresses its filter permits.
///
/// Holds no per-call state; share one instance behind an `Arc` across all
/// connections.
pub struct FilteringDialer<C = TcpConnector> {
    filter: Filter,
    resolver: Arc<dyn Resolver>,
    connector: C,
    timeout: Duration,
    rng: Option<Mutex<StdRng>>,
}

impl FilteringDialer<TcpConnector> {
    pub fn new(options: DialerOptions) -> Self {
        Self::with_connector(options, TcpConnector)
    }
}

impl<C: Connector> FilteringDialer<C> {
    pub fn with_connector(options: DialerOptions, connector: C) -> Self {
        Self {
            filter: options.filter,
            resolver: options
                .resolver
                .unwrap_or_else(|| Arc::new(SystemResolver)),
            connector,
            timeout: options.timeout,
            rng: options.seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect to `address` (`host:port`) over `network` (`tcp`, `tcp4` or `tcp6`)
    pub async fn dial(&self, network: &str, address: &str) -> Result<C::Stream> {
        let network: Network = network.parse()?;
        let (host, port) = split_host_port(address)?;

        let candidates = self.candidates(network, host).await?;

        let mut last_err = None;
        for ip in candidates {
            let addr = SocketAddr::new(ip, port);
            match self.attempt(addr).await {
                Ok(stream) => {
                    debug!(host, %addr, "connected");
                    return Ok(stream);
                }
                Err(e) => {
                    debug!(host, %addr, error = %e, "dial attempt failed");
                    last_err = Some(e);
                }
            }
        }

        // candidates() never returns an empty list
        Err(DialError::Connect(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "no dial attempted")
        })))
    }

    /// Like [`dial`](Self::dial), abandoning the call when `cancel` fires
    pub async fn dial_with_cancel(
        &self,
        network: &str,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<C::Stream> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DialError::Cancelled),
            result = self.dial(network, address) => result,
        }
    }

    /// Resolved, filtered and shuffled addresses for `host`
    async fn candidates(&self, network: Network, host: &str) -> Result<Vec<IpAddr>> {
        let mut ips = self
            .resolver
            .resolve(host)
            .await
            .map_err(DialError::Resolve)?;
        let resolved = ips.len();

        ips.retain(|&ip| {
            let keep = network.admits(ip) && !(self.filter)(ip);
            if !keep {
                trace!(host, %ip, "address filtered");
            }
            keep
        });

        if ips.is_empty() {
            debug!(host, resolved, "no unrestricted address");
            return Err(DialError::Restricted);
        }

        self.shuffle(&mut ips);
        Ok(ips)
    }

    fn shuffle(&self, ips: &mut [IpAddr]) {
        match &self.rng {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                ips.shuffle(&mut *rng);
            }
            None => ips.shuffle(&mut rand::thread_rng()),
        }
    }

    async fn attempt(&self, addr: SocketAddr) -> io::Result<C::Stream> {
        // Dropping the connect future on timeout closes the half-open socket
        match tokio::time::timeout(self.timeout, self.connector.connect(addr)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("dial {addr}: i/o timeout"),
            )),
        }
    }
}

impl<C> fmt::Debug for FilteringDialer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteringDialer")
            .field("timeout", &self.timeout)
            .field("seeded", &self.rng.is_some())
            .finish_non_exhaustive()
    }
}

/// Split `host:port` or `[host]:port`.
///
/// The port must be a decimal number and the host must be non-empty;
/// unbracketed hosts may not contain colons.
pub fn split_host_port(address: &str) -> Result<(&str, u16)> {
    let invalid = |reason| DialError::invalid_address(address, reason);

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        if host.contains(':') {
            return Err(invalid("too many colons in address"));
        }
        if host.contains('[') || host.contains(']') {
            return Err(invalid("unexpected bracket in address"));
        }
        (host, port)
    };

    if host.is_empty() {
        return Err(invalid("missing host in address"));
    }
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("invalid port"));
    }
    let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;

    Ok((host, port))
}
