use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::wire::NodeId;

pub mod udp;

/// A reply to one probe, as handed to its completion callback.
#[derive(Debug, Clone, Copy)]
pub struct ProbeReply {
    sender_id: NodeId,
    remote_addr: SocketAddr,
}

impl ProbeReply {
    pub fn new(sender_id: NodeId, remote_addr: SocketAddr) -> Self {
        Self {
            sender_id,
            remote_addr,
        }
    }

    /// Identity the responder declared in its reply.
    pub fn sender_id(&self) -> NodeId {
        self.sender_id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

/// Asynchronous per-probe failure, delivered through the completion callback.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no reply within {0:?}")]
    NoReply(Duration),
}

/// Invoked exactly once per probe, possibly from another task.
pub type ReplyCallback = Box<dyn FnOnce(Result<ProbeReply, ProbeError>) + Send + 'static>;

/// The narrow surface the dispatch engine needs from the transport.
#[async_trait]
pub trait ProbingService: Send + Sync {
    /// Local address the service answers on. Startup diagnostic only.
    fn local_addr(&self) -> anyhow::Result<SocketAddr>;

    /// Send one probe to `addr`, completing `on_reply` with the outcome at
    /// some later point. A synchronous `Err` means the service itself is
    /// unusable, not that the peer is unreachable.
    async fn ping(&self, addr: SocketAddr, on_reply: ReplyCallback) -> anyhow::Result<()>;
}
