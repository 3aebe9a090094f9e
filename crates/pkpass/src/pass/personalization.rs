//! The `personalization.json` signup form for rewards enrollment passes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Information Wallet asks the user for before personalizing a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PersonalizationField {
    /// Submitted as `fullName`, `givenName` and `familyName`.
    #[serde(rename = "PKPassPersonalizationFieldName")]
    Name,
    /// Submitted as `postalCode` and `ISOCountryCode`.
    #[serde(rename = "PKPassPersonalizationFieldPostalCode")]
    PostalCode,
    #[serde(rename = "PKPassPersonalizationFieldEmailAddress")]
    EmailAddress,
    #[serde(rename = "PKPassPersonalizationFieldPhoneNumber")]
    PhoneNumber,
}

/// Top-level `personalization.json` dictionary.
///
/// A pass carrying this file also needs a `personalizationLogo` image and an
/// NFC payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personalization {
    pub required_personalization_fields: Vec<PersonalizationField>,
    /// Shown on the signup sheet under the personalization logo.
    pub description: String,
    /// May contain HTML links. Shown after the user enters their details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_and_conditions: Option<String>,
}

impl Personalization {
    pub fn new(description: impl Into<String>, fields: Vec<PersonalizationField>) -> Self {
        Self {
            required_personalization_fields: fields,
            description: description.into(),
            terms_and_conditions: None,
        }
    }

    #[must_use]
    pub fn terms_and_conditions(mut self, terms: impl Into<String>) -> Self {
        self.terms_and_conditions = Some(terms.into());
        self
    }

    /// Requires a description and at least one requested field.
    pub fn validate(&self) -> Result<()> {
        if self.required_personalization_fields.is_empty() {
            return Err(Error::RecordDecode {
                path: "requiredPersonalizationFields".into(),
                message: "must request at least one field".into(),
            });
        }
        if self.description.is_empty() {
            return Err(Error::RecordDecode {
                path: "description".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Decodes `personalization.json` bytes, reporting the JSON path of a
    /// bad value.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        super::decode_json(bytes)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        super::encode_json(self)
    }
}
