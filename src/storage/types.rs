//! Core data types for the storage layer.
//!
//! - [`Record`]: A stored datagram, as returned by reads
//! - [`NewRecord`]: A received datagram, as handed to the writer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A datagram persisted in the `data` table.
///
/// Records are immutable once written. `size` always equals `payload.len()`.
///
/// # Example
///
/// ```
/// use packetlog::Record;
///
/// let json = r#"{"id":1,"timestamp":"2024-01-01T00:00:00Z","fromAddr":"10.0.0.1:5555","packetSize":5,"payload":"aGVsbG8="}"#;
/// let record: Record = serde_json::from_str(json).unwrap();
/// assert_eq!(record.payload, b"hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Store-assigned identifier, strictly increasing in write order.
    pub id: i64,
    /// Time the datagram was accepted (UTC, microsecond precision).
    pub timestamp: DateTime<Utc>,
    /// Peer address the datagram came from, e.g. `10.0.0.1:5555`.
    #[serde(rename = "fromAddr")]
    pub source_address: String,
    /// Payload length in bytes.
    #[serde(rename = "packetSize")]
    pub size: i64,
    /// Raw datagram bytes, base64 in JSON.
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
}

/// A datagram waiting to be written.
///
/// The size column is derived from `payload` at write time, so a stored
/// record can never disagree with its own payload length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub timestamp: DateTime<Utc>,
    pub source_address: String,
    pub payload: Vec<u8>,
}

impl NewRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        source_address: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            timestamp,
            source_address: source_address.into(),
            payload: payload.into(),
        }
    }

    /// Create a record stamped with the current time.
    pub fn received(source_address: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Utc::now(), source_address, payload)
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// The record as it reads back once stored under `id`.
    pub fn into_record(self, id: i64) -> Record {
        Record {
            id,
            timestamp: self.timestamp,
            source_address: self.source_address,
            size: self.payload.len() as i64,
            payload: self.payload,
        }
    }
}

/// Row shape of the `data` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub id: i64,
    pub timestamp: i64,
    pub from_addr: String,
    pub packet_size: i64,
    pub payload: Vec<u8>,
}

impl From<RecordRow> for Record {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            timestamp: DateTime::from_timestamp_micros(row.timestamp)
                .unwrap_or(DateTime::UNIX_EPOCH),
            source_address: row.from_addr,
            size: row.packet_size,
            payload: row.payload,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_size_follows_payload() {
        let record = NewRecord::received("10.0.0.1:5555", b"hello".to_vec());
        assert_eq!(record.size(), 5);
        assert_eq!(record.source_address, "10.0.0.1:5555");
    }

    #[test]
    fn test_record_json_field_names() {
        let record = Record {
            id: 7,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            source_address: "10.0.0.2:6000".to_string(),
            size: 5,
            payload: b"world".to_vec(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["fromAddr"], "10.0.0.2:6000");
        assert_eq!(value["packetSize"], 5);
        assert_eq!(value["payload"], "d29ybGQ=");
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");

        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_row_with_out_of_range_timestamp_falls_back_to_epoch() {
        let row = RecordRow {
            id: 1,
            timestamp: i64::MAX,
            from_addr: "x".to_string(),
            packet_size: 0,
            payload: Vec::new(),
        };
        assert_eq!(Record::from(row).timestamp, DateTime::UNIX_EPOCH);
    }
}
