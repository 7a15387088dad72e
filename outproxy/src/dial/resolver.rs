//! Hostname resolution capability

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolves a hostname to the addresses it may be reached at
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Platform DNS via the tokio blocking pool.
///
/// IP literals resolve to themselves. Duplicate answers (one per socket
/// type on some platforms) are collapsed, keeping first-seen order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;

        let mut ips: Vec<IpAddr> = Vec::new();
        for addr in addrs {
            let ip = addr.ip();
            if !ips.contains(&ip) {
                ips.push(ip);
            }
        }
        Ok(ips)
    }
}

#[async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        (**self).resolve(host).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ip_literal_resolves_to_itself() {
        let ips = SystemResolver.resolve("93.184.216.34").await.unwrap();
        assert_eq!(ips, vec!["93.184.216.34".parse::<IpAddr>().unwrap()]);

        let ips = SystemResolver.resolve("::1").await.unwrap();
        assert_eq!(ips, vec!["::1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_invalid_host_fails() {
        let result = SystemResolver
            .resolve("this-host-does-not-exist-12345.invalid")
            .await;
        assert!(result.is_err());
    }
}
