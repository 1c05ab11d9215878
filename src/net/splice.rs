//! Bidirectional byte splice between two upgraded connections.
//!
//! # Responsibilities
//! - Copy bytes client → upstream and upstream → client concurrently
//! - End both directions as soon as either one ends
//! - Report how much was relayed and which side finished first
//!
//! # Design Decisions
//! - Frames are never parsed: close, ping and pong pass through as bytes
//! - Each chunk is flushed before the next read
//! - Writer shutdown after the splice is bounded by a grace timeout

use std::fmt;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const BUFFER_SIZE: usize = 16 * 1024;

/// Upper bound for closing the write halves once the splice ends.
pub const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// The side whose direction ended first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Upstream,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => f.write_str("client"),
            Side::Upstream => f.write_str("upstream"),
        }
    }
}

#[derive(Debug)]
pub struct SpliceStats {
    pub client_to_upstream: u64,
    pub upstream_to_client: u64,
    pub closed_by: Side,
    /// Error that ended the splice, if it did not end with a clean EOF.
    pub error: Option<io::Error>,
}

/// Relay bytes between `client` and `upstream` until either side ends.
pub async fn splice<C, U>(client: C, upstream: U) -> SpliceStats
where
    C: AsyncRead + AsyncWrite,
    U: AsyncRead + AsyncWrite,
{
    let (mut client_rx, mut client_tx) = tokio::io::split(client);
    let (mut upstream_rx, mut upstream_tx) = tokio::io::split(upstream);

    let mut client_to_upstream = 0u64;
    let mut upstream_to_client = 0u64;

    let (closed_by, result) = {
        let inbound = pump(&mut client_rx, &mut upstream_tx, &mut client_to_upstream);
        let outbound = pump(&mut upstream_rx, &mut client_tx, &mut upstream_to_client);
        tokio::select! {
            result = inbound => (Side::Client, result),
            result = outbound => (Side::Upstream, result),
        }
    };

    let _ = tokio::time::timeout(CLOSE_GRACE, upstream_tx.shutdown()).await;
    let _ = tokio::time::timeout(CLOSE_GRACE, client_tx.shutdown()).await;

    SpliceStats {
        client_to_upstream,
        upstream_to_client,
        closed_by,
        error: result.err(),
    }
}

async fn pump<R, W>(reader: &mut R, writer: &mut W, relayed: &mut u64) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        *relayed += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn relays_both_directions() {
        let (mut client, gateway_client) = duplex(64);
        let (gateway_upstream, mut upstream) = duplex(64);
        let task = tokio::spawn(splice(gateway_client, gateway_upstream));

        client.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        upstream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        upstream.write_all(b"pong!").await.unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong!");

        drop(client);
        let stats = task.await.unwrap();
        assert_eq!(stats.client_to_upstream, 4);
        assert_eq!(stats.upstream_to_client, 5);
        assert_eq!(stats.closed_by, Side::Client);
        assert!(stats.error.is_none());
    }

    #[tokio::test]
    async fn client_close_closes_upstream() {
        let (client, gateway_client) = duplex(64);
        let (gateway_upstream, mut upstream) = duplex(64);
        let task = tokio::spawn(splice(gateway_client, gateway_upstream));

        drop(client);
        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), upstream.read(&mut buf))
            .await
            .expect("upstream should see EOF")
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(task.await.unwrap().closed_by, Side::Client);
    }

    #[tokio::test]
    async fn upstream_close_closes_client() {
        let (mut client, gateway_client) = duplex(64);
        let (gateway_upstream, upstream) = duplex(64);
        let task = tokio::spawn(splice(gateway_client, gateway_upstream));

        drop(upstream);
        let mut buf = [0u8; 8];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .expect("client should see EOF")
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(task.await.unwrap().closed_by, Side::Upstream);
    }
}
