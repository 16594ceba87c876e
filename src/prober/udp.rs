use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, warn};

use super::{ProbeError, ProbeReply, ProbingService, ReplyCallback};
use crate::wire::{Message, MessageKind, NodeId};

/// How long an unanswered transaction stays pending before its callback
/// fires with [`ProbeError::NoReply`].
const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy)]
pub struct ProbeServiceConfig {
    pub bind_addr: SocketAddr,
    pub reply_timeout: Duration,
}

impl Default for ProbeServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 0).into(),
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

type PendingMap = Arc<Mutex<HashMap<u16, ReplyCallback>>>;

/// UDP transport for the probe protocol. Owns the socket for the lifetime of
/// the process, answers incoming probes with our node id, and completes
/// pending transactions as replies come back.
pub struct UdpProbeService {
    socket: Arc<UdpSocket>,
    node_id: NodeId,
    reply_timeout: Duration,
    pending: PendingMap,
    next_txn: AtomicU16,
}

impl UdpProbeService {
    pub async fn bind(config: ProbeServiceConfig) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .with_context(|| format!("binding probe socket on {}", config.bind_addr))?;
        let socket = Arc::new(socket);
        let node_id = NodeId::random();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(recv_loop(socket.clone(), node_id, pending.clone()));

        Ok(Self {
            socket,
            node_id,
            reply_timeout: config.reply_timeout,
            pending,
            next_txn: AtomicU16::new(0),
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }
}

async fn recv_loop(socket: Arc<UdpSocket>, node_id: NodeId, pending: PendingMap) {
    let mut buf = [0u8; 64];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(e) => {
                warn!("probe socket receive failed: {e}");
                continue;
            }
        };
        let msg = match Message::decode(&buf[..len]) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping datagram from {from}: {e}");
                continue;
            }
        };
        match msg.kind {
            MessageKind::Probe => {
                let reply = Message::reply(msg.txn_id, node_id).encode();
                if let Err(e) = socket.send_to(&reply, from).await {
                    warn!("answering probe from {from} failed: {e}");
                }
            }
            MessageKind::Reply => {
                match pending.lock().await.remove(&msg.txn_id) {
                    Some(on_reply) => on_reply(Ok(ProbeReply::new(msg.sender, from))),
                    // late or foreign reply, the transaction is already settled
                    None => debug!("reply from {from} for unknown transaction {}", msg.txn_id),
                }
            }
        }
    }
}

#[async_trait]
impl ProbingService for UdpProbeService {
    fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.socket
            .local_addr()
            .context("probe socket has no local address")
    }

    async fn ping(&self, addr: SocketAddr, on_reply: ReplyCallback) -> anyhow::Result<()> {
        let txn_id = self.next_txn.fetch_add(1, Ordering::Relaxed);
        let probe = Message::probe(txn_id, self.node_id).encode();

        self.pending.lock().await.insert(txn_id, on_reply);

        if let Err(e) = self.socket.send_to(&probe, addr).await {
            // a failed send is fatal to the run, not a per-probe outcome
            self.pending.lock().await.remove(&txn_id);
            return Err(anyhow::Error::new(e).context(format!("sending probe to {addr}")));
        }

        let pending = self.pending.clone();
        let reply_timeout = self.reply_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(reply_timeout).await;
            if let Some(on_reply) = pending.lock().await.remove(&txn_id) {
                on_reply(Err(ProbeError::NoReply(reply_timeout)));
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    fn loopback_config(reply_timeout: Duration) -> ProbeServiceConfig {
        ProbeServiceConfig {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            reply_timeout,
        }
    }

    #[tokio::test]
    async fn loopback_probe_carries_peer_id() {
        let a = UdpProbeService::bind(loopback_config(Duration::from_secs(1)))
            .await
            .unwrap();
        let b = UdpProbeService::bind(loopback_config(Duration::from_secs(1)))
            .await
            .unwrap();

        let (tx, rx) = oneshot::channel();
        a.ping(
            b.local_addr().unwrap(),
            Box::new(move |reply| {
                let _ = tx.send(reply);
            }),
        )
        .await
        .unwrap();

        let reply = timeout(Duration::from_secs(2), rx)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(reply.sender_id(), b.node_id());
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let service = UdpProbeService::bind(loopback_config(Duration::from_millis(200)))
            .await
            .unwrap();
        // holds a port but never answers
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let (tx, rx) = oneshot::channel();
        service
            .ping(
                silent.local_addr().unwrap(),
                Box::new(move |reply| {
                    let _ = tx.send(reply);
                }),
            )
            .await
            .unwrap();

        let reply = timeout(Duration::from_secs(2), rx).await.unwrap().unwrap();
        assert!(matches!(reply, Err(ProbeError::NoReply(_))));
        drop(silent);
    }
}
