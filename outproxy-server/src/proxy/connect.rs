//! HTTP CONNECT method handling for HTTPS tunneling.
//!
//! 1. Client sends `CONNECT api.example.com:443 HTTP/1.1`
//! 2. The target is dialed through the filtering dialer
//! 3. On success the proxy answers `200` and the connection is upgraded;
//!    bytes are copied both ways until either side closes
//! 4. On failure the client gets `502` (or `400` for a malformed target,
//!    `503` when the server shuts down mid-dial)
//!
//! The upstream connection is opened before the `200` is sent so a refused
//! destination is reported as an HTTP error rather than a dropped tunnel.

use super::{empty_body, ProxyBody};
use crate::error::{ProxyError, Result};
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use outproxy::FilteringDialer;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle a CONNECT request
pub async fn handle_connect(
    req: Request<Incoming>,
    dialer: Arc<FilteringDialer>,
    cancel: &CancellationToken,
) -> Result<Response<ProxyBody>> {
    let target = connect_target(&req)?;

    let upstream = dialer.dial_with_cancel("tcp", &target, cancel).await?;
    debug!("CONNECT tunnel to {} established", target);

    tokio::spawn(async move {
        match hyper::upgrade::on(req).await {
            Ok(upgraded) => tunnel(upgraded, upstream, &target).await,
            Err(e) => warn!("HTTP upgrade failed for {}: {}", target, e),
        }
    });

    Ok(Response::new(empty_body()))
}

/// The `host:port` a CONNECT request asks for
fn connect_target(req: &Request<Incoming>) -> Result<String> {
    req.uri()
        .authority()
        .map(|authority| authority.to_string())
        .ok_or_else(|| ProxyError::InvalidRequest("CONNECT target must be host:port".into()))
}

async fn tunnel(upgraded: hyper::upgrade::Upgraded, mut upstream: TcpStream, target: &str) {
    let mut client = TokioIo::new(upgraded);

    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            debug!(
                "Tunnel to {} closed ({} bytes sent, {} bytes received)",
                target, sent, received
            );
        }
        // Resets are routine at tunnel teardown
        Err(e) => debug!("Tunnel to {} ended: {}", target, e),
    }
}
