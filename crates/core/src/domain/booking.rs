use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::params::{BookingParameters, ParamKey};
use crate::domain::suggestion::Suggestion;
use crate::errors::DomainError;

/// Payload for `POST /booking/confirm-payment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub user_id: i64,
    pub establishment_id: String,
    pub booked_item_type: String,
    pub start_date: NaiveDate,
    pub duration: u32,
    pub total_price_vnd: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_floor_area: Option<String>,
    pub num_guests: u32,
}

impl BookingConfirmation {
    pub fn from_suggestion(
        user_id: i64,
        suggestion: &Suggestion,
        params: &BookingParameters,
        today: NaiveDate,
    ) -> Result<Self, DomainError> {
        let start_date = match params.text(&ParamKey::CheckInDate) {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                DomainError::InvalidParameter { key: ParamKey::CheckInDate.to_string(), value: raw }
            })?,
            None => today,
        };
        let duration = params
            .number(&ParamKey::Duration)
            .filter(|nights| *nights > 0)
            .and_then(|nights| u32::try_from(nights).ok())
            .unwrap_or(1);
        let num_guests =
            params.text(&ParamKey::NumGuests).and_then(|raw| guest_count(&raw)).unwrap_or(1);

        let booked_item_type = suggestion
            .item_type
            .clone()
            .filter(|item| !item.is_empty())
            .or_else(|| suggestion.floor_area.clone().filter(|area| !area.is_empty()))
            .unwrap_or_else(|| "TYPE".to_string());

        Ok(Self {
            user_id,
            establishment_id: suggestion.establishment_id.clone(),
            booked_item_type,
            start_date,
            duration,
            total_price_vnd: suggestion.final_price,
            booked_floor_area: suggestion.floor_area.clone(),
            num_guests,
        })
    }
}

/// `single` and `couple` are quiz option values for one and two guests.
pub fn guest_count(raw: &str) -> Option<u32> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "single" => Some(1),
        "couple" => Some(2),
        other => other.parse::<u32>().ok().filter(|count| *count > 0),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PendingPayment => "Chờ thanh toán",
            Self::Confirmed => "Đã xác nhận",
            Self::Cancelled => "Đã huỷ",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub establishment_id: String,
    #[serde(default)]
    pub partner_id: Option<String>,
    pub start_date: NaiveDate,
    pub duration: u32,
    pub total_price_vnd: i64,
    pub status: BookingStatus,
    #[serde(default)]
    pub booked_item_type: Option<String>,
    #[serde(default)]
    pub booked_floor_area: Option<String>,
}

impl Booking {
    pub fn end_date(&self) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(self.duration)))
            .unwrap_or(self.start_date)
    }
}
