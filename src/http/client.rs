//! Upstream HTTP client.
//!
//! One pooled hyper-util client per process, plain or TLS depending on the
//! upstream configuration. Upgrades are supported on both.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response},
};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client, Error},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;

#[derive(Clone)]
pub enum UpstreamClient {
    Plain(Client<HttpConnector, Body>),
    Tls(Client<HttpsConnector<HttpConnector>, Body>),
}

impl UpstreamClient {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, std::io::Error> {
        let mut http = HttpConnector::new();
        http.set_nodelay(true);
        http.set_connect_timeout(config.connect_timeout_secs.map(Duration::from_secs));

        if config.tls {
            http.enforce_http(false);
            let https = HttpsConnectorBuilder::new()
                .with_native_roots()?
                .https_or_http()
                .enable_http1()
                .wrap_connector(http);
            Ok(Self::Tls(Client::builder(TokioExecutor::new()).build(https)))
        } else {
            Ok(Self::Plain(Client::builder(TokioExecutor::new()).build(http)))
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Result<Response<Incoming>, Error> {
        match self {
            Self::Plain(client) => client.request(request).await,
            Self::Tls(client) => client.request(request).await,
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("UpstreamClient::Plain"),
            Self::Tls(_) => f.write_str("UpstreamClient::Tls"),
        }
    }
}
