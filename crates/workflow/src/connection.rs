use prana_core::NodeKey;
use serde::{Deserialize, Serialize};

/// One edge out of a `(from_key, from_port)` pair.
///
/// `from`/`from_port` are redundant with the map keys under
/// `Workflow::connections` and exist only because the wire format
/// repeats them on each target for tooling that flattens the list; the
/// Graph Compiler ignores them in favor of the map structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Destination node key.
    pub to: NodeKey,
    /// Destination input port.
    pub to_port: String,
    /// Source node key, if present in the wire payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NodeKey>,
    /// Source output port, if present in the wire payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<String>,
}

impl Connection {
    /// Construct a connection to `to`/`to_port` with no redundant source
    /// fields populated.
    #[must_use]
    pub fn to(to: NodeKey, to_port: impl Into<String>) -> Self {
        Self {
            to,
            to_port: to_port.into(),
            from: None,
            from_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_serializes_without_redundant_fields() {
        let conn = Connection::to(NodeKey::new("b").unwrap(), "main");
        let json = serde_json::to_value(&conn).unwrap();
        assert!(json.get("from").is_none());
        assert!(json.get("from_port").is_none());
    }

    #[test]
    fn connection_roundtrips_with_redundant_fields() {
        let conn = Connection {
            to: NodeKey::new("b").unwrap(),
            to_port: "main".into(),
            from: Some(NodeKey::new("a").unwrap()),
            from_port: Some("main".into()),
        };
        let json = serde_json::to_value(&conn).unwrap();
        let back: Connection = serde_json::from_value(json).unwrap();
        assert_eq!(conn, back);
    }
}
