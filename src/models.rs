use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime, Weekday as ChronoWeekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::slots::TimeSlot;

/// Serde adapter for the backend's `HH:MM` times (it also emits `HH:MM:SS`
/// on rows read back from the database).
pub mod hm_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| D::Error::custom(format!("invalid time: {raw}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Business {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Business {
    /// Shareable public booking URL, derived from the slug.
    pub fn booking_url(&self, public_base_url: &str) -> String {
        format!("{}/{}", public_base_url.trim_end_matches('/'), self.slug)
    }
}

/// Slug derivation mirroring the backend: lowercase, spaces and underscores
/// become hyphens. Used to preview the share URL right after registration.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace([' ', '_'], "-")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    /// Duration in minutes.
    pub duration: u32,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    #[default]
    Confirmed,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Nested customer record as the backend joins it onto appointment rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Nested service record as the backend joins it onto appointment rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// An appointment as consumed from the backend.
///
/// Rows come in two shapes: flat fields (`customer_name`, `date`, ...) on
/// freshly created appointments, and joined rows (`appointment_date` plus
/// nested `customers`/`services` records) on list queries. Aliases accept
/// both; [`Appointment::normalize`] folds the nested records into the flat
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: String,
    pub business_id: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub service_price: f64,
    #[serde(alias = "appointment_date")]
    #[schema(value_type = String, format = "date", example = "2024-06-15")]
    pub date: NaiveDate,
    #[serde(alias = "appointment_time", with = "hm_time")]
    #[schema(value_type = String, example = "09:00")]
    pub time: NaiveTime,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(ignore)]
    pub customers: Option<CustomerRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(ignore)]
    pub services: Option<ServiceRef>,
}

impl Appointment {
    /// Fills empty flat fields from the nested join records, then drops them.
    pub fn normalize(mut self) -> Self {
        if let Some(customer) = self.customers.take() {
            if self.customer_name.is_empty() {
                self.customer_name = customer.name;
            }
            if self.customer_email.is_empty() {
                self.customer_email = customer.email;
            }
            if self.customer_phone.is_empty() {
                self.customer_phone = customer.phone;
            }
        }
        if let Some(service) = self.services.take() {
            if self.service_name.is_empty() {
                self.service_name = service.name;
            }
            if self.service_price == 0.0 {
                self.service_price = service.price;
            }
        }
        self
    }
}

/// Payload for creating an appointment upstream.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewAppointment {
    pub business_id: String,
    pub business_name: String,
    pub service_name: String,
    pub service_price: f64,
    #[schema(value_type = String, format = "date", example = "2024-06-15")]
    pub date: NaiveDate,
    #[serde(with = "hm_time")]
    #[schema(value_type = String, example = "09:00")]
    pub time: NaiveTime,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default = "default_true")]
    pub send_email_confirmation: bool,
    #[serde(default)]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Weekday::ALL.into_iter().find(|day| day.key() == key)
    }

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        match date.weekday() {
            ChronoWeekday::Mon => Weekday::Monday,
            ChronoWeekday::Tue => Weekday::Tuesday,
            ChronoWeekday::Wed => Weekday::Wednesday,
            ChronoWeekday::Thu => Weekday::Thursday,
            ChronoWeekday::Fri => Weekday::Friday,
            ChronoWeekday::Sat => Weekday::Saturday,
            ChronoWeekday::Sun => Weekday::Sunday,
        }
    }
}

/// One weekday of the hours editor: which slots are selectable and whether
/// the day is open at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayHours {
    #[serde(rename = "selectedSlots", default)]
    pub selected_slots: Vec<TimeSlot>,
    #[serde(rename = "isOpen", default)]
    pub is_open: bool,
}

/// The weekly hours map keyed by lowercase weekday names, the shape the
/// backend serves and accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct WeeklyHours(pub BTreeMap<Weekday, DayHours>);

impl WeeklyHours {
    /// Backend default: open Monday through Saturday with no slots picked
    /// yet, closed on Sunday.
    pub fn default_week() -> Self {
        let mut days = BTreeMap::new();
        for day in Weekday::ALL {
            days.insert(
                day,
                DayHours {
                    selected_slots: Vec::new(),
                    is_open: day != Weekday::Sunday,
                },
            );
        }
        Self(days)
    }

    pub fn day(&self, day: Weekday) -> DayHours {
        self.0.get(&day).cloned().unwrap_or_default()
    }

    pub fn set_day(&mut self, day: Weekday, hours: DayHours) {
        self.0.insert(day, hours);
    }
}

impl Default for WeeklyHours {
    fn default() -> Self {
        Self::default_week()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewService {
    pub name: String,
    pub duration: u32,
    pub price: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BusinessRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub services: Vec<NewService>,
}

/// Partial business profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BusinessUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Result of a bulk closed-date replace: how the set changed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClosedDatesUpdate {
    pub message: String,
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClosedCheck {
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
