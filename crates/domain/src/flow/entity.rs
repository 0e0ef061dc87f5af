use serde::{Deserialize, Serialize};

/// An inbound network connection description checked against the index.
///
/// All five fields are required for a record to be considered;
/// deserialization fails otherwise and the ingestion adapter drops the
/// record. Extra fields in the incoming record are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub source_ip: String,
    pub destination_ip: String,
    pub source_port: u16,
    pub destination_port: u16,
    /// Epoch timestamp of the flow observation, as supplied upstream.
    pub timestamp: u64,
}

/// Alert raised when a flow record matches the intel index.
///
/// Created by the flow classifier and handed straight to the sink;
/// never retained by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Label of the feed family that matched (e.g. "tor-exit-nodes").
    pub reason: String,
    /// The matched address.
    pub ip: String,
    /// Set for IP:port matches, `None` for IP-wide matches.
    pub port: Option<u16>,
    /// The flow record that triggered the alert.
    pub flow: FlowRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_all_fields_deserializes() {
        let record: FlowRecord = serde_json::from_str(
            r#"{"source_ip":"1.1.1.1","destination_ip":"2.2.2.2",
                "source_port":1234,"destination_port":443,"timestamp":1700000000}"#,
        )
        .unwrap();
        assert_eq!(record.source_ip, "1.1.1.1");
        assert_eq!(record.destination_port, 443);
    }

    #[test]
    fn record_missing_required_field_is_rejected() {
        // No destination_port.
        let result = serde_json::from_str::<FlowRecord>(
            r#"{"source_ip":"1.1.1.1","destination_ip":"2.2.2.2",
                "source_port":1234,"timestamp":1700000000}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn record_extra_fields_are_ignored() {
        let record: FlowRecord = serde_json::from_str(
            r#"{"source_ip":"1.1.1.1","destination_ip":"2.2.2.2",
                "source_port":1,"destination_port":2,"timestamp":3,
                "protocol":"tcp","bytes":512}"#,
        )
        .unwrap();
        assert_eq!(record.timestamp, 3);
    }
}
