use clap::Parser;
use outproxy::FilteringDialer;
use outproxy_server::{
    ConfigLoader, ConfigValidator, Overrides, ProxyServer, ProxyServerConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "outproxy")]
#[command(about = "HTTP/HTTPS forward proxy that refuses to connect to local addresses")]
struct Args {
    /// Address to listen on, `host:port` or `:port`
    #[arg(long, short = 'a')]
    addr: Option<String>,

    /// Allow dialing public IPv6 addresses
    #[arg(long, env = "ENABLE_IPV6", value_parser = clap::builder::FalseyValueParser::new())]
    ipv6: bool,

    /// Per-address connect timeout, e.g. 1s or 250ms
    #[arg(long, short = 't')]
    timeout: Option<String>,

    /// Additional CIDR range to refuse (repeatable)
    #[arg(long, value_name = "CIDR")]
    deny: Vec<String>,

    /// Config file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let env_filter = if args.verbose {
        EnvFilter::from_default_env()
            .add_directive(tracing_subscriber::filter::LevelFilter::DEBUG.into())
    } else {
        EnvFilter::from_default_env()
            .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration, then let flags win
    let mut config = ConfigLoader::load_or_default(args.config)?;
    config.apply(Overrides {
        listen: args.addr,
        timeout: args.timeout,
        ipv6: args.ipv6,
        deny_ranges: args.deny,
    });
    let settings = ConfigValidator::validate(&config)?;

    info!(
        "Policy: {} (timeout {:?}, {} extra deny ranges)",
        settings.policy,
        settings.timeout,
        settings.deny.len()
    );

    let server = ProxyServer::new(ProxyServerConfig {
        listen: settings.listen,
        dialer: Arc::new(FilteringDialer::new(settings.dialer_options())),
    });

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.cancel(),
            Err(e) => warn!("Failed to listen for ctrl-c: {}", e),
        }
    });

    server.start().await?;
    Ok(())
}
