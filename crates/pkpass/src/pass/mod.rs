//! The `pass.json` record.
//!
//! [`Pass`] is a single struct with every optional top-level key. Exactly one
//! of the five style keys (`boardingPass`, `coupon`, `eventTicket`,
//! `generic`, `storeCard`) should be present; the named constructors
//! ([`Pass::boarding_pass`], [`Pass::coupon`], ...) set it and drop field
//! groups that style does not support.
//!
//! # Examples
//!
//! ```
//! use pkpass::pass::{Pass, PassFieldContent, PassFields, PassIdentity, PassStyle, TransitType};
//!
//! let identity = PassIdentity {
//!     description: "Flight SFO to JFK".into(),
//!     organization_name: "Example Air".into(),
//!     pass_type_identifier: "pass.com.example.air".into(),
//!     serial_number: "E5982H-I2".into(),
//!     team_identifier: "ABCDE12345".into(),
//! };
//! let fields = PassFields::new()
//!     .primary(PassFieldContent::new("origin", "SFO").label("San Francisco"))
//!     .primary(PassFieldContent::new("destination", "JFK").label("New York"));
//!
//! let pass = Pass::boarding_pass(identity, TransitType::Air, fields);
//! assert_eq!(pass.style(), Some(PassStyle::BoardingPass));
//!
//! let json = pass.to_json()?;
//! assert_eq!(Pass::from_json(&json)?, pass);
//! # Ok::<(), pkpass::Error>(())
//! ```

pub mod barcode;
pub mod color;
pub mod field;
pub mod personalization;
pub mod relevance;
pub mod upcoming;

pub use barcode::{Barcode, BarcodeFormat};
pub use color::PassColor;
pub use field::{
    DataDetectorType, DateTimeStyle, FieldValue, NumberStyle, PassFieldContent, PassFields,
    TextAlignment, TransitType,
};
pub use personalization::{Personalization, PersonalizationField};
pub use relevance::{Beacon, Location, Nfc, RelevantDate};
pub use upcoming::{
    DateInformation, EventUrls, PreferredStyleScheme, RemoteImage, RemoteImageUrl,
    UpcomingImages, UpcomingPassInformationEntry,
};

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The only `formatVersion` Wallet accepts.
pub const FORMAT_VERSION: u32 = 1;

/// Which style key a pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassStyle {
    BoardingPass,
    Coupon,
    EventTicket,
    Generic,
    StoreCard,
}

impl PassStyle {
    /// The JSON key for this style.
    pub fn key(self) -> &'static str {
        match self {
            PassStyle::BoardingPass => "boardingPass",
            PassStyle::Coupon => "coupon",
            PassStyle::EventTicket => "eventTicket",
            PassStyle::Generic => "generic",
            PassStyle::StoreCard => "storeCard",
        }
    }
}

/// The required identifying keys of every pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassIdentity {
    /// Accessibility description of the pass.
    pub description: String,
    pub organization_name: String,
    /// Must match the signing certificate's pass type identifier.
    pub pass_type_identifier: String,
    /// Unique per pass type.
    pub serial_number: String,
    /// Must match the signing certificate's team identifier.
    pub team_identifier: String,
}

/// Top-level `pass.json` dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    pub description: String,
    pub format_version: u32,
    pub organization_name: String,
    pub pass_type_identifier: String,
    pub serial_number: String,
    pub team_identifier: String,

    #[serde(rename = "appLaunchURL", default, skip_serializing_if = "Option::is_none")]
    pub app_launch_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_store_identifiers: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacons: Option<Vec<Beacon>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    /// Meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_dates: Option<Vec<RelevantDate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boarding_pass: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ticket: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic: Option<PassFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_card: Option<PassFields>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcodes: Option<Vec<Barcode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<PassColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<PassColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<PassColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_strip_shine: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharing_prohibited: Option<bool>,

    /// At least 16 characters; sent back by the device to the web service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_token: Option<String>,
    #[serde(rename = "webServiceURL", default, skip_serializing_if = "Option::is_none")]
    pub web_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfc: Option<Nfc>,
    /// Machine-readable metadata, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<serde_json::Value>,

    /// Event ticket layouts in order of preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_style_schemes: Option<Vec<PreferredStyleScheme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcoming_pass_information: Option<Vec<UpcomingPassInformationEntry>>,

    // Event ticket venue links.
    #[serde(rename = "bagPolicyURL", default, skip_serializing_if = "Option::is_none")]
    pub bag_policy_url: Option<String>,
    #[serde(rename = "orderFoodURL", default, skip_serializing_if = "Option::is_none")]
    pub order_food_url: Option<String>,
    #[serde(rename = "parkingInformationURL", default, skip_serializing_if = "Option::is_none")]
    pub parking_information_url: Option<String>,
    #[serde(rename = "directionsInformationURL", default, skip_serializing_if = "Option::is_none")]
    pub directions_information_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_venue_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_venue_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_venue_website: Option<String>,
    #[serde(rename = "purchaseParkingURL", default, skip_serializing_if = "Option::is_none")]
    pub purchase_parking_url: Option<String>,
    #[serde(rename = "merchandiseURL", default, skip_serializing_if = "Option::is_none")]
    pub merchandise_url: Option<String>,
    #[serde(rename = "transitInformationURL", default, skip_serializing_if = "Option::is_none")]
    pub transit_information_url: Option<String>,
    #[serde(rename = "accessibilityURL", default, skip_serializing_if = "Option::is_none")]
    pub accessibility_url: Option<String>,
    #[serde(rename = "addOnURL", default, skip_serializing_if = "Option::is_none")]
    pub add_on_url: Option<String>,
    #[serde(rename = "transferURL", default, skip_serializing_if = "Option::is_none")]
    pub transfer_url: Option<String>,
    #[serde(rename = "shareURL", default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

impl Pass {
    fn from_identity(identity: PassIdentity) -> Self {
        Self {
            description: identity.description,
            format_version: FORMAT_VERSION,
            organization_name: identity.organization_name,
            pass_type_identifier: identity.pass_type_identifier,
            serial_number: identity.serial_number,
            team_identifier: identity.team_identifier,
            app_launch_url: None,
            associated_store_identifiers: None,
            user_info: None,
            expiration_date: None,
            voided: None,
            beacons: None,
            locations: None,
            max_distance: None,
            relevant_date: None,
            relevant_dates: None,
            boarding_pass: None,
            coupon: None,
            event_ticket: None,
            generic: None,
            store_card: None,
            barcodes: None,
            background_color: None,
            foreground_color: None,
            label_color: None,
            grouping_identifier: None,
            logo_text: None,
            suppress_strip_shine: None,
            sharing_prohibited: None,
            authentication_token: None,
            web_service_url: None,
            nfc: None,
            semantics: None,
            preferred_style_schemes: None,
            upcoming_pass_information: None,
            bag_policy_url: None,
            order_food_url: None,
            parking_information_url: None,
            directions_information_url: None,
            contact_venue_email: None,
            contact_venue_phone_number: None,
            contact_venue_website: None,
            purchase_parking_url: None,
            merchandise_url: None,
            transit_information_url: None,
            accessibility_url: None,
            add_on_url: None,
            transfer_url: None,
            share_url: None,
        }
    }

    /// A boarding pass. `transit_type` overrides any value in `fields`, and
    /// `additionalInfoFields` are dropped.
    pub fn boarding_pass(
        identity: PassIdentity,
        transit_type: TransitType,
        mut fields: PassFields,
    ) -> Self {
        fields.transit_type = Some(transit_type);
        fields.additional_info_fields = None;
        Self {
            boarding_pass: Some(fields),
            ..Self::from_identity(identity)
        }
    }

    pub fn coupon(identity: PassIdentity, fields: PassFields) -> Self {
        Self {
            coupon: Some(without_style_extras(fields)),
            ..Self::from_identity(identity)
        }
    }

    /// An event ticket; the only style that keeps `additionalInfoFields`.
    pub fn event_ticket(identity: PassIdentity, mut fields: PassFields) -> Self {
        fields.transit_type = None;
        Self {
            event_ticket: Some(fields),
            ..Self::from_identity(identity)
        }
    }

    pub fn generic(identity: PassIdentity, fields: PassFields) -> Self {
        Self {
            generic: Some(without_style_extras(fields)),
            ..Self::from_identity(identity)
        }
    }

    pub fn store_card(identity: PassIdentity, fields: PassFields) -> Self {
        Self {
            store_card: Some(without_style_extras(fields)),
            ..Self::from_identity(identity)
        }
    }

    /// The first style key present, in declaration order.
    pub fn style(&self) -> Option<PassStyle> {
        self.styles().first().map(|(style, _)| *style)
    }

    /// Field groups of the pass's style.
    pub fn fields(&self) -> Option<&PassFields> {
        self.styles().first().map(|(_, fields)| *fields)
    }

    fn styles(&self) -> Vec<(PassStyle, &PassFields)> {
        [
            (PassStyle::BoardingPass, &self.boarding_pass),
            (PassStyle::Coupon, &self.coupon),
            (PassStyle::EventTicket, &self.event_ticket),
            (PassStyle::Generic, &self.generic),
            (PassStyle::StoreCard, &self.store_card),
        ]
        .into_iter()
        .filter_map(|(style, fields)| fields.as_ref().map(|f| (style, f)))
        .collect()
    }

    /// Checks the constraints Wallet enforces beyond the JSON shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordDecode`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |path: &str, message: String| Error::RecordDecode {
            path: path.to_string(),
            message,
        };

        if self.format_version != FORMAT_VERSION {
            return Err(invalid(
                "formatVersion",
                format!("must be {FORMAT_VERSION}, found {}", self.format_version),
            ));
        }
        for (key, value) in [
            ("description", &self.description),
            ("organizationName", &self.organization_name),
            ("passTypeIdentifier", &self.pass_type_identifier),
            ("serialNumber", &self.serial_number),
            ("teamIdentifier", &self.team_identifier),
        ] {
            if value.is_empty() {
                return Err(invalid(key, "must not be empty".into()));
            }
        }

        let styles = self.styles();
        let (style, fields) = match styles.as_slice() {
            [one] => *one,
            [] => return Err(invalid("<root>", "no pass style key is present".into())),
            [_, second, ..] => {
                return Err(invalid(
                    second.0.key(),
                    "only one pass style key may be present".into(),
                ))
            }
        };

        if style == PassStyle::BoardingPass && fields.transit_type.is_none() {
            return Err(invalid(
                "boardingPass.transitType",
                "is required for boarding passes".into(),
            ));
        }
        if style != PassStyle::BoardingPass && fields.transit_type.is_some() {
            return Err(invalid(
                &format!("{}.transitType", style.key()),
                "is only allowed on boarding passes".into(),
            ));
        }
        if style != PassStyle::EventTicket && fields.additional_info_fields.is_some() {
            return Err(invalid(
                &format!("{}.additionalInfoFields", style.key()),
                "is only allowed on event tickets".into(),
            ));
        }

        let mut keys = std::collections::BTreeSet::new();
        for field in fields.iter() {
            if !keys.insert(field.key.as_str()) {
                return Err(invalid(
                    style.key(),
                    format!("field key {:?} is used more than once", field.key),
                ));
            }
        }
        Ok(())
    }

    /// Decodes `pass.json` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordDecode`] with the JSON path of the value that
    /// failed to decode, e.g. `barcodes[0].format`.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        decode_json(bytes)
    }

    /// Encodes the pass as pretty-printed JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        encode_json(self)
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value: T = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = e.path().to_string();
        Error::RecordDecode {
            path,
            message: e.into_inner().to_string(),
        }
    })?;
    deserializer.end().map_err(|e| Error::RecordDecode {
        path: "<root>".into(),
        message: e.to_string(),
    })?;
    Ok(value)
}

pub(crate) fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| Error::RecordDecode {
        path: "<root>".into(),
        message: e.to_string(),
    })
}

fn without_style_extras(mut fields: PassFields) -> PassFields {
    fields.transit_type = None;
    fields.additional_info_fields = None;
    fields
}
