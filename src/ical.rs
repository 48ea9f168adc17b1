use chrono::Duration;
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::Appointment;

/// Default event length when the appointment row carries no duration: one
/// booking slot.
const DEFAULT_DURATION_MIN: i64 = 30;

#[derive(Clone, Default)]
pub struct AgendaExporter;

impl AgendaExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, business_name: &str, appointments: &[Appointment]) -> Vec<u8> {
        if appointments.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(&format!("{business_name} Appointments"));

        for appointment in appointments {
            let start = appointment.date.and_time(appointment.time);
            let end = start + Duration::minutes(DEFAULT_DURATION_MIN);

            let mut event = Event::new();
            event.summary(&format!(
                "{}: {}",
                appointment.service_name, appointment.customer_name
            ));
            event.starts(start);
            event.ends(end);
            event.description(&format!(
                "Service: {}\nCustomer: {} <{}>\nPhone: {}",
                appointment.service_name,
                appointment.customer_name,
                appointment.customer_email,
                appointment.customer_phone,
            ));
            event.uid(&format!("{}-bookly-gateway", appointment.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}
