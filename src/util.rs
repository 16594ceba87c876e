use std::net::SocketAddr;

use anyhow::Result;

/// Resolve a `host:port` target into a socket address. Tries a literal
/// parse first, then DNS.
pub async fn resolve_peer_addr(target: &str) -> Result<SocketAddr> {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let mut addrs = tokio::net::lookup_host(target).await?;
    addrs
        .next()
        .ok_or_else(|| anyhow::anyhow!("could not resolve target: {}", target))
}
