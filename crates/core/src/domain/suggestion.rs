use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A bookable match returned by the quiz search or the agent search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub establishment_id: String,
    #[serde(default)]
    pub establishment_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_main: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls_gallery: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_area: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub units_available: u32,
    #[serde(default, deserialize_with = "lenient_price")]
    pub final_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Suggestion {
    pub fn display_image(&self) -> Option<&str> {
        self.item_image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.image_url_main.as_deref().filter(|url| !url.is_empty()))
    }

    pub fn is_available(&self) -> bool {
        self.units_available > 0
    }
}

/// Reads a count that may arrive as a number, a numeric string, or nothing.
pub fn count_from_json(value: &Value) -> u32 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|count| count.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0),
        Value::String(text) => text.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}

pub fn price_from_json(value: &Value) -> i64 {
    match value {
        Value::Number(number) => {
            number.as_i64().or_else(|| number.as_f64().map(|f| f.round() as i64)).unwrap_or(0)
        }
        Value::String(text) => text.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_json(&value))
}

fn lenient_price<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(price_from_json(&value))
}
