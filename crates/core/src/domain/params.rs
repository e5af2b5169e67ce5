use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    City,
    CheckInDate,
    Duration,
    MaxPrice,
    EstablishmentType,
    TravelCompanion,
    AmenitiesPriority,
    HasBalcony,
    NumGuests,
    /// Set once the user confirmed (or explicitly skipped) the amenity list.
    AmenitiesConfirmed,
    Other(String),
}

impl ParamKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::City => "city",
            Self::CheckInDate => "check_in_date",
            Self::Duration => "duration",
            Self::MaxPrice => "max_price",
            Self::EstablishmentType => "establishment_type",
            Self::TravelCompanion => "travel_companion",
            Self::AmenitiesPriority => "amenities_priority",
            Self::HasBalcony => "has_balcony",
            Self::NumGuests => "num_guests",
            Self::AmenitiesConfirmed => "_amenities_confirmed",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "city" => Self::City,
            "check_in_date" => Self::CheckInDate,
            "duration" => Self::Duration,
            "max_price" => Self::MaxPrice,
            "establishment_type" => Self::EstablishmentType,
            "travel_companion" => Self::TravelCompanion,
            "amenities_priority" => Self::AmenitiesPriority,
            "has_balcony" => Self::HasBalcony,
            "num_guests" => Self::NumGuests,
            "_amenities_confirmed" => Self::AmenitiesConfirmed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Keys whose answers travel as integers rather than text.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Duration | Self::MaxPrice)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ParamKey {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for ParamKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl ParamValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Blank text, zero and `false` all count as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(number) => *number == 0,
            Self::Flag(flag) => !flag,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse::<i64>().ok(),
            Self::Flag(_) => None,
        }
    }

    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(Self::Flag(flag)),
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
                .map(Self::Number),
            Value::String(text) => Some(Self::Text(text)),
            Value::Array(items) => {
                let joined = items
                    .into_iter()
                    .filter_map(Self::from_json)
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(Self::Text(joined))
            }
            Value::Object(_) => Some(Self::Text(value.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => Value::from(*number),
            Self::Flag(flag) => Value::Bool(*flag),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Parameters collected for one booking conversation.
///
/// Values are keyed by [`ParamKey`]; writes are last-write-wins except that
/// [`BookingParameters::merge`] never lets an empty value clobber a stored one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct BookingParameters {
    values: BTreeMap<ParamKey, ParamValue>,
}

impl BookingParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.values.keys()
    }

    pub fn get(&self, key: &ParamKey) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &ParamKey) -> Option<String> {
        self.values.get(key).filter(|value| !value.is_empty()).map(ToString::to_string)
    }

    pub fn number(&self, key: &ParamKey) -> Option<i64> {
        self.values.get(key).and_then(ParamValue::as_number)
    }

    pub fn has_value(&self, key: &ParamKey) -> bool {
        self.values.get(key).is_some_and(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) {
        self.values.insert(key, value.into());
    }

    pub fn with(mut self, key: ParamKey, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &ParamKey) -> Option<ParamValue> {
        self.values.remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Last write wins, but an empty incoming value never replaces a stored
    /// non-empty one.
    pub fn merge(&mut self, other: &BookingParameters) {
        for (key, value) in &other.values {
            if value.is_empty() && self.has_value(key) {
                continue;
            }
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Fills only the keys that have no value yet and returns them.
    pub fn fill_missing(&mut self, inferred: &BookingParameters) -> Vec<ParamKey> {
        let mut filled = Vec::new();
        for (key, value) in &inferred.values {
            if value.is_empty() || self.has_value(key) {
                continue;
            }
            self.values.insert(key.clone(), value.clone());
            filled.push(key.clone());
        }
        filled
    }

    pub fn amenities(&self) -> Vec<String> {
        self.text(&ParamKey::AmenitiesPriority)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_amenities(&mut self, amenities: &[String]) {
        if amenities.is_empty() {
            self.values.remove(&ParamKey::AmenitiesPriority);
        } else {
            self.set(ParamKey::AmenitiesPriority, amenities.join(", "));
        }
    }

    pub fn amenities_confirmed(&self) -> bool {
        self.has_value(&ParamKey::AmenitiesConfirmed)
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.values.iter().map(|(key, value)| (key.as_str().to_string(), value.to_json())).collect()
    }
}

impl From<Map<String, Value>> for BookingParameters {
    fn from(map: Map<String, Value>) -> Self {
        let values = map
            .into_iter()
            .filter_map(|(key, value)| {
                ParamValue::from_json(value).map(|value| (ParamKey::parse(&key), value))
            })
            .collect();
        Self { values }
    }
}

impl From<BookingParameters> for Map<String, Value> {
    fn from(params: BookingParameters) -> Self {
        params.to_json_map()
    }
}

impl FromIterator<(ParamKey, ParamValue)> for BookingParameters {
    fn from_iter<T: IntoIterator<Item = (ParamKey, ParamValue)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BookingParameters, ParamKey, ParamValue};

    #[test]
    fn decodes_lenient_json_values() {
        let params: BookingParameters = serde_json::from_value(json!({
            "city": "Đà Nẵng",
            "max_price": 1500000.4,
            "amenities_priority": ["Gym", "Spa"],
            "style_vibe": "Romantic",
            "note": null
        }))
        .expect("params decode");

        assert_eq!(params.text(&ParamKey::City).as_deref(), Some("Đà Nẵng"));
        assert_eq!(params.number(&ParamKey::MaxPrice), Some(1_500_000));
        assert_eq!(params.amenities(), vec!["Gym".to_string(), "Spa".to_string()]);
        assert!(params.has_value(&ParamKey::Other("style_vibe".to_string())));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn serializes_with_wire_key_names() {
        let params = BookingParameters::new()
            .with(ParamKey::CheckInDate, "2025-10-10")
            .with(ParamKey::Duration, 2)
            .with(ParamKey::AmenitiesConfirmed, true);

        let value = serde_json::to_value(&params).expect("params encode");
        assert_eq!(
            value,
            json!({"check_in_date": "2025-10-10", "duration": 2, "_amenities_confirmed": true})
        );
    }

    #[test]
    fn merge_never_lets_empty_values_override() {
        let mut stored = BookingParameters::new()
            .with(ParamKey::City, "Hà Nội")
            .with(ParamKey::Duration, 3);
        let incoming = BookingParameters::new()
            .with(ParamKey::City, "")
            .with(ParamKey::Duration, 0)
            .with(ParamKey::MaxPrice, 2_000_000);

        stored.merge(&incoming);

        assert_eq!(stored.text(&ParamKey::City).as_deref(), Some("Hà Nội"));
        assert_eq!(stored.number(&ParamKey::Duration), Some(3));
        assert_eq!(stored.number(&ParamKey::MaxPrice), Some(2_000_000));
    }

    #[test]
    fn merge_is_idempotent_for_stored_answers() {
        let mut stored = BookingParameters::new()
            .with(ParamKey::City, "Huế")
            .with(ParamKey::TravelCompanion, "couple")
            .with(ParamKey::AmenitiesPriority, "Gym, Spa");
        let snapshot = stored.clone();

        stored.merge(&snapshot);
        stored.merge(&snapshot.clone());

        assert_eq!(stored, snapshot);
    }

    #[test]
    fn fill_missing_keeps_confirmed_values() {
        let mut stored = BookingParameters::new().with(ParamKey::City, "Hà Nội");
        let inferred = BookingParameters::new()
            .with(ParamKey::City, "Đà Nẵng")
            .with(ParamKey::Duration, 2);

        let filled = stored.fill_missing(&inferred);

        assert_eq!(filled, vec![ParamKey::Duration]);
        assert_eq!(stored.text(&ParamKey::City).as_deref(), Some("Hà Nội"));
    }

    #[test]
    fn empty_markers_are_not_values() {
        assert!(ParamValue::Flag(false).is_empty());
        assert!(ParamValue::text("  ").is_empty());
        assert!(!ParamValue::Number(1).is_empty());

        let params = BookingParameters::new().with(ParamKey::AmenitiesConfirmed, false);
        assert!(!params.amenities_confirmed());
    }

    #[test]
    fn set_amenities_with_empty_list_removes_key() {
        let mut params = BookingParameters::new().with(ParamKey::AmenitiesPriority, "Gym");
        params.set_amenities(&[]);
        assert!(params.get(&ParamKey::AmenitiesPriority).is_none());
    }
}
