use super::connect::handle_connect;
use super::forward::handle_forward;
use super::{error_response, ProxyBody};
use crate::error::Result;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use outproxy::FilteringDialer;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Forward proxy server configuration
#[derive(Clone)]
pub struct ProxyServerConfig {
    /// TCP address to listen on
    pub listen: SocketAddr,
    /// Dialer used for every upstream connection
    pub dialer: Arc<FilteringDialer>,
}

/// HTTP forward proxy server
pub struct ProxyServer {
    config: ProxyServerConfig,
    shutdown: CancellationToken,
}

impl ProxyServer {
    /// Create a new proxy server with the given configuration
    pub fn new(config: ProxyServerConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the accept loop when cancelled.
    /// Open connections keep running, but dials still in progress are
    /// abandoned and answered with `503`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub async fn start(&self) -> Result<()> {
        let listen = self.config.listen;
        let listener = match TcpListener::bind(listen).await {
            Ok(listener) => listener,
            // Hosts without IPv6 cannot bind the dual-stack wildcard
            Err(e) if listen.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED) => {
                let fallback = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), listen.port());
                warn!("Cannot bind {}: {}, using {}", listen, e, fallback);
                TcpListener::bind(fallback).await?
            }
            Err(e) => return Err(e.into()),
        };
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("Proxy listening on {}", listener.local_addr()?);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("Client connected: {}", peer);
                            let dialer = self.config.dialer.clone();
                            let cancel = self.shutdown.child_token();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, dialer, cancel).await {
                                    debug!("Connection from {} ended: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => warn!("Failed to accept connection: {}", e),
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("Proxy shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Serve HTTP/1.1 on one client connection
async fn handle_connection(
    stream: TcpStream,
    dialer: Arc<FilteringDialer>,
    cancel: CancellationToken,
) -> Result<()> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: Request<Incoming>| {
        let dialer = dialer.clone();
        let cancel = cancel.clone();
        async move { Ok::<_, Infallible>(proxy_request(req, dialer, cancel).await) }
    });

    // Upgrades are required for CONNECT
    http1::Builder::new()
        .preserve_header_case(true)
        .title_case_headers(true)
        .serve_connection(io, service)
        .with_upgrades()
        .await?;

    Ok(())
}

/// Route one request; failures are turned into error responses
async fn proxy_request(
    req: Request<Incoming>,
    dialer: Arc<FilteringDialer>,
    cancel: CancellationToken,
) -> Response<ProxyBody> {
    let method = req.method().clone();
    let target = req.uri().to_string();
    debug!("{} {}", method, target);

    let result = if method == Method::CONNECT {
        handle_connect(req, dialer, &cancel).await
    } else {
        handle_forward(req, dialer, &cancel).await
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            if e.is_client_error() {
                debug!("Rejected {} {}: {}", method, target, e);
            } else {
                info!("{} {} failed: {}", method, target, e);
            }
            error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outproxy::{is_local, DialerOptions};

    fn test_config() -> ProxyServerConfig {
        ProxyServerConfig {
            listen: "127.0.0.1:0".parse().unwrap(),
            dialer: Arc::new(FilteringDialer::new(DialerOptions::new(is_local))),
        }
    }

    #[test]
    fn test_proxy_server_creation() {
        let server = ProxyServer::new(test_config());
        assert_eq!(server.config.listen, "127.0.0.1:0".parse().unwrap());
        assert!(!server.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let server = ProxyServer::new(test_config());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        server.shutdown_token().cancel();
        server.serve(listener).await.unwrap();
    }
}
