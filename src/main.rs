//! Edge gateway binary.
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 EDGE GATEWAY                  │
//!   Client Request    │  ┌────────┐   ┌────────────┐                  │
//!   ──────────────────┼─▶│  http  │──▶│ dispatcher │──┬─▶ preflight   │
//!                     │  │ server │   └────────────┘  ├─▶ static      │
//!                     │  └────────┘                   ├─▶ redirect    │
//!                     │       ▲                       ├─▶ proxy ──────┼──▶ Upstream
//!   Client Response   │  ┌────────┐                   └─▶ upgrade ════┼══▶ (splice)
//!   ◀─────────────────┼──│  CORS  │                                   │
//!                     │  │ layer  │                                   │
//!                     │  └────────┘                                   │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use edge_gateway::config::{load_config, GatewayConfig, UpstreamConfig};
use edge_gateway::lifecycle;
use edge_gateway::observability::init_logging;

#[derive(Debug, Parser)]
#[command(name = "edge-gateway", version, about = "Edge reverse proxy for a single upstream")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Public listen address, overriding `listener.bind_address`.
    #[arg(short, long, env = "GATEWAY_BIND")]
    bind: Option<String>,

    /// Upstream `host:port`, overriding the `[upstream]` address.
    #[arg(short, long, env = "GATEWAY_UPSTREAM", value_parser = parse_upstream)]
    upstream: Option<UpstreamAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UpstreamAddr {
    host: String,
    port: u16,
}

/// Split `host:port`, accepting bracketed IPv6 hosts.
fn parse_upstream(value: &str) -> Result<UpstreamAddr, String> {
    let (host, port) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected host:port, got `{value}`"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(format!("missing host in `{value}`"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| format!("invalid port in `{value}`: {e}"))?;
    Ok(UpstreamAddr {
        host: host.to_owned(),
        port,
    })
}

fn apply_overrides(config: &mut GatewayConfig, cli: Cli) {
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(UpstreamAddr { host, port }) = cli.upstream {
        config.upstream = UpstreamConfig {
            host,
            port,
            ..config.upstream.clone()
        };
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    apply_overrides(&mut config, cli);

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.authority(),
        tls = config.listener.tls.is_some(),
        "edge-gateway starting"
    );

    lifecycle::start(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upstream_addresses() {
        let v4 = parse_upstream("127.0.0.1:8501").unwrap();
        assert_eq!((v4.host.as_str(), v4.port), ("127.0.0.1", 8501));
        let v6 = parse_upstream("[::1]:9000").unwrap();
        assert_eq!((v6.host.as_str(), v6.port), ("::1", 9000));
        assert!(parse_upstream("localhost").is_err());
        assert!(parse_upstream(":80").is_err());
        assert!(parse_upstream("host:http").is_err());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = GatewayConfig::default();
        config.upstream.tls = true;
        let cli = Cli::parse_from(["edge-gateway", "--bind", "127.0.0.1:9999", "--upstream", "app:8000"]);
        apply_overrides(&mut config, cli);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(config.upstream.host, "app");
        assert_eq!(config.upstream.port, 8000);
        assert!(config.upstream.tls);
    }
}
