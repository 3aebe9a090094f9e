//! Barcode descriptions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    /// Not displayed on watchOS.
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

/// A barcode shown on the front of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub format: BarcodeFormat,
    pub message: String,
    /// IANA character set name used to convert `message` to bytes,
    /// typically `iso-8859-1` or `utf-8`.
    pub message_encoding: String,
    /// Text displayed near the barcode, e.g. a human-readable version of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Barcode {
    /// A barcode using the `iso-8859-1` message encoding.
    pub fn new(format: BarcodeFormat, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            message_encoding: "iso-8859-1".to_string(),
            alt_text: None,
        }
    }

    #[must_use]
    pub fn alt_text(mut self, text: impl Into<String>) -> Self {
        self.alt_text = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_names() {
        let barcode = Barcode::new(BarcodeFormat::Pdf417, "123456789").alt_text("123 456 789");
        let json = serde_json::to_value(&barcode).unwrap();
        assert_eq!(json["format"], "PKBarcodeFormatPDF417");
        assert_eq!(json["messageEncoding"], "iso-8859-1");
        assert_eq!(json["altText"], "123 456 789");
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = serde_json::from_str::<Barcode>(
            r#"{"format":"PKBarcodeFormatEAN","message":"1","messageEncoding":"utf-8"}"#,
        );
        assert!(err.is_err());
    }
}
