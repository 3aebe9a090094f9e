//! When and where a pass becomes relevant, and NFC payloads.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A Bluetooth Low Energy beacon near which the pass is relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    #[serde(rename = "proximityUUID")]
    pub proximity_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

/// A geographic point near which the pass is relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

/// A time interval during which the pass is relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantDate {
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
}

/// Near-field communication payload for contactless redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nfc {
    /// At most 64 bytes.
    pub message: String,
    /// Base64 X.509 `SubjectPublicKeyInfo` of a P-256 key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_authentication: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_uuid_key() {
        let beacon = Beacon {
            proximity_uuid: "E2C56DB5-DFFB-48D2-B060-D0F5A71096E0".into(),
            major: Some(1),
            minor: None,
            relevant_text: None,
        };
        let json = serde_json::to_value(&beacon).unwrap();
        assert_eq!(json["proximityUUID"], "E2C56DB5-DFFB-48D2-B060-D0F5A71096E0");
        assert!(json.get("minor").is_none());
    }

    #[test]
    fn test_relevant_date_parses() {
        let date: RelevantDate = serde_json::from_str(
            r#"{"startDate":"2025-06-01T18:00:00Z","endDate":"2025-06-01T23:00:00+00:00"}"#,
        )
        .unwrap();
        assert!(date.start_date < date.end_date);
    }
}
