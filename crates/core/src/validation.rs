use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::domain::booking::guest_count;
use crate::domain::params::{BookingParameters, ParamKey};

pub const MAX_PROMPT_CHARS: usize = 1000;
pub const MAX_PRICE_VND: i64 = 1_000_000_000;

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let shaped = raw.len() == 10
        && raw.char_indices().all(|(index, ch)| match index {
            4 | 7 => ch == '-',
            _ => ch.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

pub fn is_valid_date(raw: &str) -> bool {
    parse_date(raw).is_some()
}

pub fn is_future_date(raw: &str, today: NaiveDate) -> bool {
    parse_date(raw).is_some_and(|date| date >= today)
}

pub fn is_valid_duration(nights: i64) -> bool {
    (1..=365).contains(&nights)
}

pub fn is_valid_price(price: i64) -> bool {
    price > 0 && price <= MAX_PRICE_VND
}

pub fn is_valid_guest_count(guests: i64) -> bool {
    (1..=50).contains(&guests)
}

pub fn is_valid_city(city: &str) -> bool {
    let city = city.trim();
    !city.is_empty() && city.chars().count() <= 100
}

pub fn is_valid_establishment_type(kind: &str) -> bool {
    matches!(kind.trim().to_ascii_uppercase().as_str(), "HOTEL" | "RESTAURANT")
}

pub fn is_valid_travel_companion(companion: &str) -> bool {
    matches!(
        companion.trim().to_ascii_lowercase().as_str(),
        "single" | "couple" | "family" | "friends" | "team" | "business"
    )
}

pub fn is_valid_amenities(amenities: &str) -> bool {
    let trimmed = amenities.trim();
    !trimmed.is_empty() && amenities.chars().count() <= MAX_PROMPT_CHARS
}

pub fn is_valid_prompt(prompt: &str) -> bool {
    let trimmed = prompt.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_PROMPT_CHARS
}

pub fn is_valid_session_id(session_id: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^session_\d+_[a-z0-9]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(session_id))
}

pub fn is_valid_establishment_id(id: &str) -> bool {
    let id = id.trim();
    !id.is_empty()
        && id.len() <= 50
        && id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Trims, drops markup and quote characters, and caps the length.
pub fn sanitize_input(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '<' | '>' | '\'' | '"'))
        .take(MAX_PROMPT_CHARS)
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks a parameter set before it is used for a booking. City, check-in
/// date and duration are required; the remaining keys are checked only when set.
pub fn validate_booking_params(params: &BookingParameters, today: NaiveDate) -> ValidationReport {
    let mut errors = Vec::new();

    if !params.text(&ParamKey::City).is_some_and(|city| is_valid_city(&city)) {
        errors.push("Thành phố không hợp lệ".to_string());
    }

    let check_in = params.text(&ParamKey::CheckInDate);
    if !check_in.is_some_and(|date| is_future_date(&date, today)) {
        errors.push("Ngày check-in không hợp lệ hoặc đã qua".to_string());
    }

    if !params.number(&ParamKey::Duration).is_some_and(is_valid_duration) {
        errors.push("Số đêm không hợp lệ".to_string());
    }

    if params.has_value(&ParamKey::MaxPrice)
        && !params.number(&ParamKey::MaxPrice).is_some_and(is_valid_price)
    {
        errors.push("Ngân sách không hợp lệ".to_string());
    }

    if let Some(guests) = params.text(&ParamKey::NumGuests) {
        let valid =
            guest_count(&guests).is_some_and(|count| is_valid_guest_count(i64::from(count)));
        if !valid {
            errors.push("Số khách không hợp lệ".to_string());
        }
    }

    if let Some(kind) = params.text(&ParamKey::EstablishmentType) {
        if !is_valid_establishment_type(&kind) {
            errors.push("Loại cơ sở không hợp lệ".to_string());
        }
    }

    if let Some(companion) = params.text(&ParamKey::TravelCompanion) {
        if !is_valid_travel_companion(&companion) {
            errors.push("Loại khách hàng không hợp lệ".to_string());
        }
    }

    if let Some(amenities) = params.text(&ParamKey::AmenitiesPriority) {
        if !is_valid_amenities(&amenities) {
            errors.push("Danh sách tiện ích không hợp lệ".to_string());
        }
    }

    ValidationReport { errors }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        is_future_date, is_valid_date, is_valid_establishment_id, is_valid_prompt,
        is_valid_session_id, sanitize_input, validate_booking_params,
    };
    use crate::domain::params::{BookingParameters, ParamKey};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
    }

    #[test]
    fn dates_must_be_real_and_strictly_shaped() {
        assert!(is_valid_date("2025-02-28"));
        assert!(!is_valid_date("2025-02-30"));
        assert!(!is_valid_date("2025-2-3"));
        assert!(!is_valid_date("03/02/2025"));
        assert!(is_future_date("2025-06-01", today()));
        assert!(!is_future_date("2025-05-31", today()));
    }

    #[test]
    fn complete_parameters_pass() {
        let params = BookingParameters::new()
            .with(ParamKey::City, "Đà Nẵng")
            .with(ParamKey::CheckInDate, "2025-07-01")
            .with(ParamKey::Duration, 3)
            .with(ParamKey::MaxPrice, 2_000_000)
            .with(ParamKey::NumGuests, "couple")
            .with(ParamKey::EstablishmentType, "hotel")
            .with(ParamKey::TravelCompanion, "family");

        let report = validate_booking_params(&params, today());
        assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn missing_required_and_bad_optional_values_are_reported() {
        let params = BookingParameters::new()
            .with(ParamKey::CheckInDate, "2024-01-01")
            .with(ParamKey::Duration, 400)
            .with(ParamKey::NumGuests, "99")
            .with(ParamKey::EstablishmentType, "HOSTEL");

        let report = validate_booking_params(&params, today());
        assert_eq!(
            report.errors,
            vec![
                "Thành phố không hợp lệ",
                "Ngày check-in không hợp lệ hoặc đã qua",
                "Số đêm không hợp lệ",
                "Số khách không hợp lệ",
                "Loại cơ sở không hợp lệ",
            ]
        );
    }

    #[test]
    fn identifiers_and_prompts() {
        assert!(is_valid_session_id("session_1718000000000_k3j9x0abc"));
        assert!(!is_valid_session_id("session_abc_k3j9"));
        assert!(is_valid_establishment_id("est-01_a"));
        assert!(!is_valid_establishment_id("est 01"));
        assert!(!is_valid_prompt("   "));
        assert!(!is_valid_prompt(&"a".repeat(1001)));
    }

    #[test]
    fn sanitize_strips_markup_and_quotes() {
        assert_eq!(sanitize_input("  <b>\"Đà Lạt\"</b> 2 đêm "), "bĐà Lạt/b 2 đêm");
        assert_eq!(sanitize_input(&"x".repeat(1200)).chars().count(), 1000);
    }
}
