//! Event ticket extras: poster styling and upcoming events.

use super::field::PassFieldContent;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Layouts an event ticket may ask for, most preferred first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferredStyleScheme {
    PosterEventTicket,
    EventTicket,
}

/// The `type` written for every upcoming entry.
pub const EVENT_ENTRY_TYPE: &str = "event";

/// One event listed under `upcomingPassInformation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPassInformationEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub identifier: String,
    pub name: String,
    #[serde(rename = "URLs", default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<EventUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_store_identifiers: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_information: Option<DateInformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<UpcomingImages>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<serde_json::Value>,
}

impl UpcomingPassInformationEntry {
    pub fn event(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entry_type: EVENT_ENTRY_TYPE.to_string(),
            identifier: identifier.into(),
            name: name.into(),
            urls: None,
            additional_info_fields: None,
            auxiliary_store_identifiers: None,
            back_fields: None,
            date_information: None,
            images: None,
            is_active: None,
            semantics: None,
        }
    }
}

/// Venue links for an upcoming event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUrls {
    #[serde(rename = "accessibilityURL", default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<String>,
    #[serde(rename = "addOnURL", default, skip_serializing_if = "Option::is_none")]
    pub add_on: Option<String>,
    #[serde(rename = "bagPolicyURL", default, skip_serializing_if = "Option::is_none")]
    pub bag_policy: Option<String>,
    #[serde(rename = "contactVenueEmail", default, skip_serializing_if = "Option::is_none")]
    pub contact_venue_email: Option<String>,
    #[serde(
        rename = "contactVenuePhoneNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_venue_phone_number: Option<String>,
    #[serde(rename = "contactVenueWebsite", default, skip_serializing_if = "Option::is_none")]
    pub contact_venue_website: Option<String>,
    #[serde(
        rename = "directionsInformationURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub directions_information: Option<String>,
    #[serde(rename = "merchandiseURL", default, skip_serializing_if = "Option::is_none")]
    pub merchandise: Option<String>,
    #[serde(rename = "orderFoodURL", default, skip_serializing_if = "Option::is_none")]
    pub order_food: Option<String>,
    #[serde(rename = "parkingInformationURL", default, skip_serializing_if = "Option::is_none")]
    pub parking_information: Option<String>,
    #[serde(rename = "purchaseParkingURL", default, skip_serializing_if = "Option::is_none")]
    pub purchase_parking: Option<String>,
    #[serde(rename = "sellURL", default, skip_serializing_if = "Option::is_none")]
    pub sell: Option<String>,
    #[serde(rename = "transferURL", default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<String>,
    #[serde(rename = "transitInformationURL", default, skip_serializing_if = "Option::is_none")]
    pub transit_information: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_time_components: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unannounced: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_undetermined: Option<bool>,
    /// IANA zone name, e.g. `America/Toronto`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_image: Option<RemoteImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_map: Option<RemoteImage>,
}

/// An image Wallet downloads instead of reading from the archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteImage {
    #[serde(rename = "URLs", default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<RemoteImageUrl>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_existing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteImageUrl {
    /// Hex SHA-256 of the downloaded file.
    #[serde(rename = "SHA256")]
    pub sha256: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
