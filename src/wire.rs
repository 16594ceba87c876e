use std::fmt;

use rand::Rng;
use thiserror::Error;

/// Every probe protocol datagram is exactly this long.
pub const MESSAGE_LEN: usize = 26;

pub const NODE_ID_LEN: usize = 20;

const MAGIC: [u8; 2] = *b"pp";
const VERSION: u8 = 1;

const KIND_PROBE: u8 = 0;
const KIND_REPLY: u8 = 1;

/// 160-bit identity a peer stamps on every message it sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; NODE_ID_LEN]);

impl NodeId {
    pub fn random() -> Self {
        NodeId(rand::rng().random())
    }

    pub fn as_bytes(&self) -> &[u8; NODE_ID_LEN] {
        &self.0
    }
}

impl From<[u8; NODE_ID_LEN]> for NodeId {
    fn from(bytes: [u8; NODE_ID_LEN]) -> Self {
        NodeId(bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected datagram length {0}")]
    BadLength(usize),
    #[error("bad magic")]
    BadMagic,
    #[error("unsupported version {0}")]
    BadVersion(u8),
    #[error("unknown message kind {0}")]
    UnknownKind(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Probe,
    Reply,
}

/// One probe protocol datagram, either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub txn_id: u16,
    pub sender: NodeId,
}

impl Message {
    pub fn probe(txn_id: u16, sender: NodeId) -> Self {
        Message {
            kind: MessageKind::Probe,
            txn_id,
            sender,
        }
    }

    pub fn reply(txn_id: u16, sender: NodeId) -> Self {
        Message {
            kind: MessageKind::Reply,
            txn_id,
            sender,
        }
    }

    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[0..2].copy_from_slice(&MAGIC);
        buf[2] = VERSION;
        buf[3] = match self.kind {
            MessageKind::Probe => KIND_PROBE,
            MessageKind::Reply => KIND_REPLY,
        };
        buf[4..6].copy_from_slice(&self.txn_id.to_be_bytes());
        buf[6..26].copy_from_slice(self.sender.as_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() != MESSAGE_LEN {
            return Err(DecodeError::BadLength(buf.len()));
        }
        if buf[0..2] != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        if buf[2] != VERSION {
            return Err(DecodeError::BadVersion(buf[2]));
        }
        let kind = match buf[3] {
            KIND_PROBE => MessageKind::Probe,
            KIND_REPLY => MessageKind::Reply,
            k => return Err(DecodeError::UnknownKind(k)),
        };
        let txn_id = u16::from_be_bytes([buf[4], buf[5]]);
        let mut id = [0u8; NODE_ID_LEN];
        id.copy_from_slice(&buf[6..26]);
        Ok(Message {
            kind,
            txn_id,
            sender: NodeId(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_survives_encoding() {
        let msg = Message::reply(513, NodeId::from([0xab; 20]));
        assert_eq!(Message::decode(&msg.encode()), Ok(msg));
    }

    #[test]
    fn rejects_truncated_datagram() {
        assert_eq!(Message::decode(&[0u8; 5]), Err(DecodeError::BadLength(5)));
    }

    #[test]
    fn rejects_foreign_magic() {
        let mut buf = Message::probe(7, NodeId::from([1; 20])).encode();
        buf[0] = b'x';
        assert_eq!(Message::decode(&buf), Err(DecodeError::BadMagic));
    }

    #[test]
    fn rejects_unknown_kind() {
        let mut buf = Message::probe(7, NodeId::from([1; 20])).encode();
        buf[3] = 9;
        assert_eq!(Message::decode(&buf), Err(DecodeError::UnknownKind(9)));
    }

    #[test]
    fn node_id_displays_as_lowercase_hex() {
        assert_eq!(NodeId::from([0xAA; 20]).to_string(), "aa".repeat(20));
    }
}
