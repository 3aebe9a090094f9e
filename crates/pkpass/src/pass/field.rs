//! Field groups and individual fields of a pass.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};

/// The value shown in a field: a number, a date, or text.
///
/// Decoding tries the variants in declaration order. A JSON number is
/// always [`FieldValue::Number`]; a string that parses as an RFC 3339
/// timestamp is a [`FieldValue::Date`]; every other string is
/// [`FieldValue::Text`].
///
/// Whole numbers are written without a fraction, so `3.0` encodes as `3`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(DateTime<FixedOffset>),
    Text(String),
}

// Largest magnitude below which every integer is exact in an f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Date(date) => date.serialize(serializer),
            FieldValue::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::Date(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitType {
    #[serde(rename = "PKTransitTypeAir")]
    Air,
    #[serde(rename = "PKTransitTypeBoat")]
    Boat,
    #[serde(rename = "PKTransitTypeBus")]
    Bus,
    #[serde(rename = "PKTransitTypeGeneric")]
    Generic,
    #[serde(rename = "PKTransitTypeTrain")]
    Train,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextAlignment {
    #[serde(rename = "PKTextAlignmentLeft")]
    Left,
    #[serde(rename = "PKTextAlignmentCenter")]
    Center,
    #[serde(rename = "PKTextAlignmentRight")]
    Right,
    #[serde(rename = "PKTextAlignmentNatural")]
    Natural,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataDetectorType {
    #[serde(rename = "PKDataDetectorTypePhoneNumber")]
    PhoneNumber,
    #[serde(rename = "PKDataDetectorTypeLink")]
    Link,
    #[serde(rename = "PKDataDetectorTypeAddress")]
    Address,
    #[serde(rename = "PKDataDetectorTypeCalendarEvent")]
    CalendarEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimeStyle {
    #[serde(rename = "PKDateStyleNone")]
    None,
    #[serde(rename = "PKDateStyleShort")]
    Short,
    #[serde(rename = "PKDateStyleMedium")]
    Medium,
    #[serde(rename = "PKDateStyleLong")]
    Long,
    #[serde(rename = "PKDateStyleFull")]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberStyle {
    #[serde(rename = "PKNumberStyleDecimal")]
    Decimal,
    #[serde(rename = "PKNumberStylePercent")]
    Percent,
    #[serde(rename = "PKNumberStyleScientific")]
    Scientific,
    #[serde(rename = "PKNumberStyleSpellOut")]
    SpellOut,
}

/// One field on the front or back of a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassFieldContent {
    /// Unique within the pass, e.g. `departure-gate`.
    pub key: String,
    pub value: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// HTML with `<a href>` links only; overrides `value` on the back of the pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_value: Option<String>,
    /// Update alert text; `%@` is replaced with the new value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_detector_types: Option<Vec<DataDetectorType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<TextAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<DateTimeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_style: Option<DateTimeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignores_time_zone: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_relative: Option<bool>,
    /// ISO 4217 code; mutually exclusive with `number_style`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,
    /// Auxiliary row (0 or 1) on event tickets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
}

impl PassFieldContent {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            label: None,
            attributed_value: None,
            change_message: None,
            data_detector_types: None,
            text_alignment: None,
            date_style: None,
            time_style: None,
            ignores_time_zone: None,
            is_relative: None,
            currency_code: None,
            number_style: None,
            row: None,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn change_message(mut self, message: impl Into<String>) -> Self {
        self.change_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn text_alignment(mut self, alignment: TextAlignment) -> Self {
        self.text_alignment = Some(alignment);
        self
    }
}

/// The field groups of one pass style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_fields: Option<Vec<PassFieldContent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_fields: Option<Vec<PassFieldContent>>,
    /// Boarding passes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_type: Option<TransitType>,
    /// Event tickets only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info_fields: Option<Vec<PassFieldContent>>,
}

impl PassFields {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn header(mut self, field: PassFieldContent) -> Self {
        self.header_fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    #[must_use]
    pub fn primary(mut self, field: PassFieldContent) -> Self {
        self.primary_fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    #[must_use]
    pub fn secondary(mut self, field: PassFieldContent) -> Self {
        self.secondary_fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    #[must_use]
    pub fn auxiliary(mut self, field: PassFieldContent) -> Self {
        self.auxiliary_fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    #[must_use]
    pub fn back(mut self, field: PassFieldContent) -> Self {
        self.back_fields.get_or_insert_with(Vec::new).push(field);
        self
    }

    #[must_use]
    pub fn additional_info(mut self, field: PassFieldContent) -> Self {
        self.additional_info_fields
            .get_or_insert_with(Vec::new)
            .push(field);
        self
    }

    /// All fields across every group.
    pub fn iter(&self) -> impl Iterator<Item = &PassFieldContent> {
        [
            &self.header_fields,
            &self.primary_fields,
            &self.secondary_fields,
            &self.auxiliary_fields,
            &self.back_fields,
            &self.additional_info_fields,
        ]
        .into_iter()
        .flatten()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(json: &str) -> FieldValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_value_trial_order() {
        assert_eq!(value("42"), FieldValue::Number(42.0));
        assert_eq!(value("-1.5"), FieldValue::Number(-1.5));
        assert!(matches!(value("\"2024-05-01T18:30:00-04:00\""), FieldValue::Date(_)));
        assert_eq!(value("\"42\""), FieldValue::Text("42".into()));
        assert_eq!(value("\"Gate 7\""), FieldValue::Text("Gate 7".into()));
    }

    #[test]
    fn test_value_serializes_bare() {
        assert_eq!(serde_json::to_string(&FieldValue::from(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&FieldValue::from("SFO")).unwrap(), "\"SFO\"");
    }

    #[test]
    fn test_whole_numbers_drop_fraction() {
        let encode = |n: f64| serde_json::to_string(&FieldValue::Number(n)).unwrap();
        assert_eq!(encode(21.0), "21");
        assert_eq!(encode(-7.0), "-7");
        assert_eq!(encode(21.75), "21.75");
        assert_eq!(encode(1e300), "1e300");
        assert_eq!(value(&encode(42.0)), FieldValue::Number(42.0));
    }

    #[test]
    fn test_field_camel_case() {
        let field = PassFieldContent::new("gate", "7")
            .label("Gate")
            .change_message("Gate changed to %@.");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["changeMessage"], "Gate changed to %@.");
        assert!(json.get("textAlignment").is_none());
    }

    #[test]
    fn test_transit_type_names() {
        assert_eq!(
            serde_json::to_string(&TransitType::Air).unwrap(),
            "\"PKTransitTypeAir\""
        );
        let t: TransitType = serde_json::from_str("\"PKTransitTypeTrain\"").unwrap();
        assert_eq!(t, TransitType::Train);
    }

    #[test]
    fn test_iter_covers_groups() {
        let fields = PassFields::new()
            .header(PassFieldContent::new("a", 1))
            .back(PassFieldContent::new("b", 2))
            .additional_info(PassFieldContent::new("c", 3));
        let keys: Vec<_> = fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
