use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ApiError;
use crate::handlers::BookingRequest;
use crate::models::BusinessRegistration;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("regex compiles"));

pub fn validate_page(value: usize) -> Result<usize, ApiError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ApiError::BadRequest("page must be at least 1".into()))
    }
}

pub fn validate_month(value: u32) -> Result<u32, ApiError> {
    if (1..=12).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(
            "month must be between 1 and 12".into(),
        ))
    }
}

/// Booking form checks, in the original's order: service/date/time first,
/// then customer name and email.
pub fn validate_booking(request: &BookingRequest) -> Result<(), ApiError> {
    if request.service_name.trim().is_empty() || request.date.is_none() || request.time.is_none() {
        return Err(ApiError::BadRequest(
            "Please fill in all required fields".into(),
        ));
    }
    if request.customer_name.trim().is_empty() || request.customer_email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide your name and email".into(),
        ));
    }
    Ok(())
}

pub fn validate_registration(registration: &BusinessRegistration) -> Result<(), ApiError> {
    for (field, value) in [
        ("name", &registration.name),
        ("email", &registration.email),
        ("password", &registration.password),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Missing required field: {field}"
            )));
        }
    }
    if !EMAIL_RE.is_match(&registration.email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn booking() -> BookingRequest {
        BookingRequest {
            service_name: "Haircut".into(),
            date: Some(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
            time: Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            customer_name: "Jane".into(),
            customer_email: "jane@example.com".into(),
            customer_phone: String::new(),
            send_email_confirmation: true,
        }
    }

    fn registration() -> BusinessRegistration {
        BusinessRegistration {
            name: "Lilly Salon".into(),
            email: "owner@example.com".into(),
            password: "hunter2".into(),
            category: String::new(),
            description: String::new(),
            address: String::new(),
            phone: String::new(),
            services: Vec::new(),
        }
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
    }

    #[test]
    fn test_booking_field_order() {
        assert!(validate_booking(&booking()).is_ok());

        let mut missing_time = booking();
        missing_time.time = None;
        missing_time.customer_name = String::new();
        let err = validate_booking(&missing_time).unwrap_err();
        // Service/date/time checks come before customer checks.
        assert!(matches!(
            err,
            ApiError::BadRequest(msg) if msg == "Please fill in all required fields"
        ));

        let mut missing_email = booking();
        missing_email.customer_email = String::new();
        let err = validate_booking(&missing_email).unwrap_err();
        assert!(matches!(
            err,
            ApiError::BadRequest(msg) if msg == "Please provide your name and email"
        ));
    }

    #[test]
    fn test_registration_checks() {
        assert!(validate_registration(&registration()).is_ok());

        let mut missing_password = registration();
        missing_password.password = String::new();
        assert!(validate_registration(&missing_password).is_err());

        let mut bad_email = registration();
        bad_email.email = "not-an-email".into();
        assert!(validate_registration(&bad_email).is_err());
    }
}
