//! Vietnamese display text for parameters, options and suggestions.

use crate::domain::params::ParamKey;

pub const AMENITY_OPTIONS: [&str; 28] = [
    "Hồ bơi",
    "Spa",
    "Bãi đậu xe",
    "Gym",
    "Buffet sáng",
    "Gần biển",
    "Wifi",
    "Lễ tân 24/7",
    "Đưa đón sân bay",
    "Pet-friendly",
    "Phòng gia đình",
    "Không hút thuốc",
    "Bồn tắm",
    "View biển",
    "View thành phố",
    "Gần trung tâm",
    "Ban công",
    "Cửa sổ",
    "Giặt là",
    "Thang máy",
    "Romantic",
    "Quiet",
    "Lively",
    "Luxury",
    "Nature",
    "Cozy",
    "Modern",
    "Classic",
];

const TRAVEL_COMPANIONS: [(&str, &str); 6] = [
    ("single", "Một mình"),
    ("couple", "Cặp đôi"),
    ("family", "Gia đình"),
    ("friends", "Bạn bè"),
    ("team", "Nhóm"),
    ("business", "Công tác"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceRange {
    pub label: &'static str,
    pub value: i64,
}

pub const PRICE_RANGE_OPTIONS: [PriceRange; 6] = [
    PriceRange { label: "100k - 300k", value: 300_000 },
    PriceRange { label: "500k - 1 triệu", value: 1_000_000 },
    PriceRange { label: "1 - 2 triệu", value: 2_000_000 },
    PriceRange { label: "2 - 3 triệu", value: 3_000_000 },
    PriceRange { label: "3 - 5 triệu", value: 5_000_000 },
    PriceRange { label: "5 triệu+", value: 10_000_000 },
];

pub fn parameter_label(key: &ParamKey) -> &str {
    match key {
        ParamKey::EstablishmentType => "Loại cơ sở",
        ParamKey::City => "Thành phố",
        ParamKey::CheckInDate => "Ngày nhận",
        ParamKey::Duration => "Số đêm",
        ParamKey::MaxPrice => "Ngân sách tối đa (VND)",
        ParamKey::TravelCompanion => "Đi cùng ai",
        ParamKey::AmenitiesPriority => "Tiện ích ưu tiên",
        ParamKey::HasBalcony => "Có ban công?",
        ParamKey::NumGuests => "Số người",
        other => other.as_str(),
    }
}

/// Options offered when the server asks for `key` without sending its own.
pub fn default_options(key: &ParamKey) -> Vec<String> {
    let options: Vec<&str> = match key {
        ParamKey::EstablishmentType => vec!["HOTEL", "RESTAURANT"],
        ParamKey::TravelCompanion => TRAVEL_COMPANIONS.iter().map(|(value, _)| *value).collect(),
        ParamKey::AmenitiesPriority => AMENITY_OPTIONS.to_vec(),
        ParamKey::Duration => vec!["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"],
        ParamKey::HasBalcony => vec!["yes", "no"],
        ParamKey::NumGuests => {
            vec!["single", "couple", "3", "4", "5", "6", "7", "8", "9", "10"]
        }
        _ => Vec::new(),
    };
    options.into_iter().map(ToString::to_string).collect()
}

pub fn option_label(key: &ParamKey, value: &str) -> String {
    match key {
        ParamKey::EstablishmentType => match value.to_ascii_uppercase().as_str() {
            "HOTEL" => "Khách sạn".to_string(),
            "RESTAURANT" => "Nhà hàng".to_string(),
            _ => value.to_string(),
        },
        ParamKey::TravelCompanion => TRAVEL_COMPANIONS
            .iter()
            .find(|(raw, _)| raw.eq_ignore_ascii_case(value))
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| value.to_string()),
        ParamKey::HasBalcony => yes_no(value).unwrap_or(value).to_string(),
        _ => value.to_string(),
    }
}

/// Text used when echoing an answer back into the transcript.
pub fn humanize_value(key: &ParamKey, value: &str) -> String {
    if *key == ParamKey::NumGuests {
        let normalized = value.trim().to_ascii_lowercase();
        return match normalized.as_str() {
            "single" => "1 người".to_string(),
            "couple" => "2 người".to_string(),
            other => match other.parse::<u32>() {
                Ok(count) if count > 0 => format!("{count} người"),
                _ => value.to_string(),
            },
        };
    }
    option_label(key, value)
}

fn yes_no(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Some("Có"),
        "no" => Some("Không"),
        _ => None,
    }
}

/// Compact price such as `1.5M` or `500K`.
pub fn format_price(price: i64) -> String {
    if price >= 1_000_000 {
        format!("{:.1}M", price as f64 / 1_000_000.0)
    } else if price >= 1_000 {
        format!("{:.0}K", price as f64 / 1_000.0)
    } else {
        price.to_string()
    }
}

/// Full VND amount with dot thousands separators, e.g. `1.800.000 ₫`.
pub fn format_vnd(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let sign = if price < 0 { "-" } else { "" };
    format!("{sign}{grouped} ₫")
}

pub fn budget_category(price: i64) -> &'static str {
    match price {
        p if p < 500_000 => "Tiết kiệm",
        p if p < 1_000_000 => "Bình dân",
        p if p < 2_000_000 => "Trung bình",
        p if p < 5_000_000 => "Cao cấp",
        _ => "Luxury",
    }
}

pub fn duration_category(nights: i64) -> &'static str {
    match nights {
        1 => "Một đêm",
        n if n <= 3 => "Ngắn ngày",
        n if n <= 7 => "Tuần",
        _ => "Dài ngày",
    }
}

pub fn relevance_label(score: f32) -> &'static str {
    if score >= 0.8 {
        "Rất phù hợp"
    } else if score >= 0.6 {
        "Phù hợp"
    } else if score >= 0.4 {
        "Khá phù hợp"
    } else {
        "Ít phù hợp"
    }
}

pub fn establishment_type_emoji(kind: &str) -> &'static str {
    match kind.to_ascii_uppercase().as_str() {
        "HOTEL" => "🏨",
        "RESTAURANT" => "🍽️",
        _ => "🏢",
    }
}

pub fn travel_companion_emoji(companion: &str) -> &'static str {
    match companion.to_ascii_lowercase().as_str() {
        "single" => "👤",
        "couple" => "👫",
        "family" => "👨‍👩‍👧‍👦",
        "business" => "💼",
        "team" => "👨‍👨‍👦‍👦",
        _ => "👥",
    }
}

pub fn city_emoji(city: &str) -> &'static str {
    match city {
        "Đà Nẵng" => "🏖️",
        "Hà Nội" | "Huế" => "🏛️",
        "Hồ Chí Minh" => "🌆",
        "Nha Trang" => "🌊",
        "Đà Lạt" => "🏔️",
        "Phú Quốc" => "🏝️",
        "Hội An" => "🏮",
        "Sa Pa" => "⛰️",
        "Cần Thơ" => "🌾",
        _ => "🏙️",
    }
}

pub fn amenity_emoji(amenity: &str) -> &'static str {
    match amenity {
        "Hồ bơi" => "🏊‍♂️",
        "Spa" => "🧘‍♀️",
        "Bãi đậu xe" => "🚗",
        "Gym" => "🏃‍♂️",
        "Buffet sáng" => "🍳",
        "Gần biển" => "🏖️",
        "Wifi" => "📶",
        "Lễ tân 24/7" => "🏨",
        "Đưa đón sân bay" => "✈️",
        "Pet-friendly" => "🐕",
        "Phòng gia đình" => "👨‍👩‍👧‍👦",
        "Không hút thuốc" => "🚭",
        "Bồn tắm" => "🛁",
        "View biển" => "🌊",
        "View thành phố" => "🏙️",
        "Gần trung tâm" | "Classic" => "🏛️",
        "Ban công" | "Nature" => "🌿",
        "Cửa sổ" => "🪟",
        "Giặt là" => "👕",
        "Thang máy" => "🛗",
        "Romantic" => "💕",
        "Quiet" => "🤫",
        "Lively" => "🎉",
        "Cozy" => "🏠",
        "Modern" => "🏢",
        _ => "✨",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        budget_category, default_options, duration_category, format_price, format_vnd,
        humanize_value, option_label, parameter_label, relevance_label, AMENITY_OPTIONS,
    };
    use crate::domain::params::ParamKey;

    #[test]
    fn labels_known_and_custom_keys() {
        assert_eq!(parameter_label(&ParamKey::MaxPrice), "Ngân sách tối đa (VND)");
        assert_eq!(parameter_label(&ParamKey::Other("style_vibe".into())), "style_vibe");
    }

    #[test]
    fn option_labels_translate_wire_values() {
        assert_eq!(option_label(&ParamKey::EstablishmentType, "hotel"), "Khách sạn");
        assert_eq!(option_label(&ParamKey::TravelCompanion, "Business"), "Công tác");
        assert_eq!(option_label(&ParamKey::HasBalcony, "no"), "Không");
        assert_eq!(option_label(&ParamKey::City, "Huế"), "Huế");
    }

    #[test]
    fn humanized_guest_counts() {
        assert_eq!(humanize_value(&ParamKey::NumGuests, "couple"), "2 người");
        assert_eq!(humanize_value(&ParamKey::NumGuests, "4"), "4 người");
        assert_eq!(humanize_value(&ParamKey::NumGuests, "nhiều"), "nhiều");
        assert_eq!(humanize_value(&ParamKey::EstablishmentType, "RESTAURANT"), "Nhà hàng");
    }

    #[test]
    fn default_options_cover_enumerated_keys() {
        assert_eq!(default_options(&ParamKey::EstablishmentType), vec!["HOTEL", "RESTAURANT"]);
        assert_eq!(default_options(&ParamKey::AmenitiesPriority).len(), AMENITY_OPTIONS.len());
        assert_eq!(default_options(&ParamKey::NumGuests)[1], "couple");
        assert!(default_options(&ParamKey::City).is_empty());
    }

    #[test]
    fn prices_format_compactly() {
        assert_eq!(format_price(1_500_000), "1.5M");
        assert_eq!(format_price(500_000), "500K");
        assert_eq!(format_price(800), "800");
        assert_eq!(format_vnd(1_800_000), "1.800.000 ₫");
        assert_eq!(format_vnd(900), "900 ₫");
    }

    #[test]
    fn categories_follow_thresholds() {
        assert_eq!(budget_category(499_999), "Tiết kiệm");
        assert_eq!(budget_category(1_000_000), "Trung bình");
        assert_eq!(budget_category(5_000_000), "Luxury");
        assert_eq!(duration_category(1), "Một đêm");
        assert_eq!(duration_category(3), "Ngắn ngày");
        assert_eq!(duration_category(7), "Tuần");
        assert_eq!(duration_category(8), "Dài ngày");
        assert_eq!(relevance_label(0.85), "Rất phù hợp");
        assert_eq!(relevance_label(0.1), "Ít phù hợp");
    }
}
