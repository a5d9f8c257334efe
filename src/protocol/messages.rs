use serde::{Deserialize, Serialize};
use crate::types::{Cost, NodeId};

/// A distance vector advertised by `source_id` to the single neighbor `dest_id`.
///
/// Each neighbor gets its own packet because poison reverse tailors the
/// vector per recipient. `mincost` is always an owned copy, never a view
/// into the sender's live table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterPacket {
    pub source_id: NodeId,
    pub dest_id: NodeId,
    pub mincost: Vec<Cost>,
}

impl RouterPacket {
    pub fn new(source_id: NodeId, dest_id: NodeId, mincost: Vec<Cost>) -> Self {
        Self {
            source_id,
            dest_id,
            mincost,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

impl std::fmt::Display for RouterPacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} {:?}", self.source_id, self.dest_id, self.mincost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let packet = RouterPacket::new(0, 1, vec![0, 1, 999]);
        let json = String::from_utf8(packet.serialize().unwrap()).unwrap();
        assert_eq!(json, r#"{"source_id":0,"dest_id":1,"mincost":[0,1,999]}"#);
        assert_eq!(RouterPacket::deserialize(json.as_bytes()).unwrap(), packet);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(RouterPacket::deserialize(b"{\"source_id\":1}").is_err());
    }

    #[test]
    fn test_display() {
        let packet = RouterPacket::new(2, 0, vec![3, 1, 0]);
        assert_eq!(packet.to_string(), "2 -> 0 [3, 1, 0]");
    }
}
