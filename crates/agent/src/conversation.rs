use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tripmate_core::domain::params::{BookingParameters, ParamKey};
use unicode_normalization::UnicodeNormalization;

const CITY_ALIASES: [(&str, &str); 27] = [
    ("da nang", "Đà Nẵng"),
    ("danang", "Đà Nẵng"),
    ("dn", "Đà Nẵng"),
    ("ha noi", "Hà Nội"),
    ("hanoi", "Hà Nội"),
    ("ho chi minh", "Hồ Chí Minh"),
    ("tp hcm", "Hồ Chí Minh"),
    ("tphcm", "Hồ Chí Minh"),
    ("hcm", "Hồ Chí Minh"),
    ("sai gon", "Hồ Chí Minh"),
    ("saigon", "Hồ Chí Minh"),
    ("nha trang", "Nha Trang"),
    ("nhatrang", "Nha Trang"),
    ("da lat", "Đà Lạt"),
    ("dalat", "Đà Lạt"),
    ("phu quoc", "Phú Quốc"),
    ("phuquoc", "Phú Quốc"),
    ("hoi an", "Hội An"),
    ("hoian", "Hội An"),
    ("sa pa", "Sa Pa"),
    ("sapa", "Sa Pa"),
    ("hue", "Huế"),
    ("co do hue", "Huế"),
    ("can tho", "Cần Thơ"),
    ("cantho", "Cần Thơ"),
    ("vung tau", "Vũng Tàu"),
    ("vungtau", "Vũng Tàu"),
];

const AMENITY_ALIASES: [(&str, &str); 27] = [
    ("gym", "Gym"),
    ("ho boi", "Hồ bơi"),
    ("hoboi", "Hồ bơi"),
    ("pool", "Hồ bơi"),
    ("spa", "Spa"),
    ("bai do xe", "Bãi đậu xe"),
    ("bai dau xe", "Bãi đậu xe"),
    ("giu xe", "Bãi đậu xe"),
    ("parking", "Bãi đậu xe"),
    ("gan bien", "Gần biển"),
    ("ganbien", "Gần biển"),
    ("beach", "Gần biển"),
    ("buffet sang", "Buffet sáng"),
    ("wifi", "Wifi"),
    ("le tan", "Lễ tân 24/7"),
    ("dua don", "Đưa đón sân bay"),
    ("pet friendly", "Pet-friendly"),
    ("phong gia dinh", "Phòng gia đình"),
    ("khong hut thuoc", "Không hút thuốc"),
    ("bon tam", "Bồn tắm"),
    ("view bien", "View biển"),
    ("view thanh pho", "View thành phố"),
    ("gan trung tam", "Gần trung tâm"),
    ("ban cong", "Ban công"),
    ("cua so", "Cửa sổ"),
    ("giat la", "Giặt là"),
    ("thang may", "Thang máy"),
];

const HOTEL_KEYWORDS: [&str; 3] = ["khach san", "hotel", "resort"];
const RESTAURANT_KEYWORDS: [&str; 3] = ["nha hang", "restaurant", "quan an"];

/// Lowercase ASCII form of `text` used for alias matching: diacritics removed,
/// `đ` folded to `d`, punctuation turned into spaces and whitespace collapsed.
pub fn strip_accents(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|ch| !('\u{0300}'..='\u{036f}').contains(ch))
        .map(|ch| match ch {
            'đ' | 'Đ' => 'd',
            ch if ch.is_ascii_alphanumeric() || ch.is_whitespace() => ch,
            _ => ' ',
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Whole-word phrase test against text already passed through [`strip_accents`].
fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

pub fn infer_city_from_text(text: &str) -> Option<String> {
    let normalized = strip_accents(text);
    CITY_ALIASES
        .iter()
        .filter(|(alias, _)| contains_phrase(&normalized, alias))
        .max_by_key(|(alias, _)| alias.len())
        .map(|(_, city)| (*city).to_string())
}

pub fn infer_establishment_type(text: &str) -> Option<&'static str> {
    let normalized = strip_accents(text);
    if HOTEL_KEYWORDS.iter().any(|keyword| contains_phrase(&normalized, keyword)) {
        return Some("HOTEL");
    }
    if RESTAURANT_KEYWORDS.iter().any(|keyword| contains_phrase(&normalized, keyword)) {
        return Some("RESTAURANT");
    }
    None
}

fn cached(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

fn unit_price_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"(\d+(?:\.\d+)?)\s*(k|nghin|nghìn|ngan|ngàn|tr|trieu|triệu|m)\b")
}

fn vnd_price_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"(\d{1,3}(?:[.\s]\d{3})+|\d+)\s*(đ|d|vnd)\b")
}

fn date_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"\b(20\d{2}-\d{2}-\d{2})\b")
}

fn nights_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"\b(\d+)\s*dem\b")
}

fn days_pattern() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"\b(\d+)\s*ngay\b")
}

/// Reads a VND amount such as `2 triệu`, `500k`, `1,5tr` or `1.200.000đ`.
pub fn parse_price_from_text(text: &str) -> Option<i64> {
    let lowered = text.to_lowercase().replace(',', ".");

    if let Some(captures) = unit_price_pattern().and_then(|pattern| pattern.captures(&lowered)) {
        let amount = captures.get(1)?.as_str().parse::<f64>().ok()?;
        let multiplier = match captures.get(2)?.as_str() {
            "k" | "nghin" | "nghìn" | "ngan" | "ngàn" => 1_000.0,
            _ => 1_000_000.0,
        };
        let price = (amount * multiplier).round() as i64;
        return (price > 0).then_some(price);
    }

    let captures = vnd_price_pattern()?.captures(&lowered)?;
    let digits: String =
        captures.get(1)?.as_str().chars().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse::<i64>().ok().filter(|price| *price > 0)
}

/// First `YYYY-MM-DD` in the text that is a real calendar date.
pub fn parse_date_from_text(text: &str) -> Option<String> {
    date_pattern()?
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .find(|found| NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").is_ok())
        .map(|found| found.as_str().to_string())
}

/// Number of nights from `N đêm`, falling back to `N ngày`.
pub fn parse_duration_from_text(text: &str) -> Option<i64> {
    let normalized = strip_accents(text);
    [nights_pattern(), days_pattern()]
        .into_iter()
        .flatten()
        .find_map(|pattern| pattern.captures(&normalized))
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse::<i64>().ok())
        .filter(|count| *count > 0)
}

pub fn extract_amenities_from_text(text: &str) -> Vec<String> {
    let normalized = strip_accents(text);
    let mut amenities: Vec<String> = Vec::new();
    for (alias, amenity) in AMENITY_ALIASES {
        if contains_phrase(&normalized, alias) && !amenities.iter().any(|seen| seen == amenity) {
            amenities.push(amenity.to_string());
        }
    }
    amenities
}

/// Pulls the booking parameters a free-text request makes obvious, so the
/// quiz does not ask for them again.
#[derive(Clone, Debug, Default)]
pub struct ParameterExtractor;

impl ParameterExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> BookingParameters {
        let mut params = BookingParameters::new();

        if let Some(city) = infer_city_from_text(text) {
            params.set(ParamKey::City, city);
        }
        if let Some(date) = parse_date_from_text(text) {
            params.set(ParamKey::CheckInDate, date);
        }
        if let Some(nights) = parse_duration_from_text(text) {
            params.set(ParamKey::Duration, nights);
        }
        if let Some(price) = parse_price_from_text(text) {
            params.set(ParamKey::MaxPrice, price);
        }

        let amenities = extract_amenities_from_text(text);
        if !amenities.is_empty() {
            params.set_amenities(&amenities);
        }
        if contains_phrase(&strip_accents(text), "ban cong") {
            params.set(ParamKey::HasBalcony, "yes");
        }
        if let Some(kind) = infer_establishment_type(text) {
            params.set(ParamKey::EstablishmentType, kind);
        }

        params
    }
}
