use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::models::{
    Appointment, Business, BusinessRegistration, BusinessUpdate, ClosedCheck, ClosedDatesUpdate,
    Credentials, MessageResponse, NewAppointment, NewService, Service, ServiceUpdate, Weekday,
    WeeklyHours,
};
use crate::slots::TimeSlot;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(err) => err.status(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Thin client for the Bookly REST backend. One request path attaches JSON
/// headers and parses either the payload or the `{"error": ...}` body; every
/// endpoint method is a template over it. No retries, no caching, no request
/// timeout.
#[derive(Clone)]
pub struct BooklyClient {
    http: reqwest::Client,
    base_url: Arc<Url>,
}

impl BooklyClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: Arc::new(base_url),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn request<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let mut builder = self
            .http
            .request(method, url)
            .header("content-type", "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| {
                    format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown Error")
                    )
                });
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::GET, &self.endpoint(path), None)
            .await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(Method::POST, &self.endpoint(path), Some(body))
            .await
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        self.request(Method::PUT, &self.endpoint(path), Some(body))
            .await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<T, ()>(Method::DELETE, &self.endpoint(path), None)
            .await
    }

    // ---- businesses ----

    pub async fn list_businesses(&self) -> Result<Vec<Business>, ClientError> {
        self.get("/businesses/").await
    }

    pub async fn business(&self, business_id: &str) -> Result<Business, ClientError> {
        self.get(&format!("/businesses/{business_id}")).await
    }

    pub async fn business_by_slug(&self, slug: &str) -> Result<Business, ClientError> {
        self.get(&format!("/businesses/slug/{slug}")).await
    }

    pub async fn register_business(
        &self,
        registration: &BusinessRegistration,
    ) -> Result<Business, ClientError> {
        self.post("/businesses/register", registration).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Business, ClientError> {
        self.post("/businesses/login", credentials).await
    }

    pub async fn update_business(
        &self,
        business_id: &str,
        updates: &BusinessUpdate,
    ) -> Result<Business, ClientError> {
        self.put(&format!("/businesses/{business_id}"), updates)
            .await
    }

    pub async fn delete_business(
        &self,
        business_id: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/businesses/{business_id}")).await
    }

    // ---- services ----

    pub async fn business_services(
        &self,
        business_id: &str,
    ) -> Result<Vec<Service>, ClientError> {
        self.get(&format!("/services/business/{business_id}")).await
    }

    pub async fn service(&self, service_id: &str) -> Result<Service, ClientError> {
        self.get(&format!("/services/{service_id}")).await
    }

    pub async fn create_service(
        &self,
        business_id: &str,
        service: &NewService,
    ) -> Result<Service, ClientError> {
        let body = json!({
            "business_id": business_id,
            "name": service.name,
            "duration": service.duration,
            "price": service.price,
            "description": service.description,
        });
        self.post("/services/", &body).await
    }

    pub async fn update_service(
        &self,
        service_id: &str,
        updates: &ServiceUpdate,
    ) -> Result<Service, ClientError> {
        self.put(&format!("/services/{service_id}"), updates).await
    }

    pub async fn delete_service(&self, service_id: &str) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/services/{service_id}")).await
    }

    // ---- appointments ----

    pub async fn business_appointments(
        &self,
        business_id: &str,
    ) -> Result<Vec<Appointment>, ClientError> {
        let rows: Vec<Appointment> = self
            .get(&format!("/appointments/business/{business_id}"))
            .await?;
        Ok(rows.into_iter().map(Appointment::normalize).collect())
    }

    pub async fn appointment(
        &self,
        appointment_id: &str,
        business_id: &str,
    ) -> Result<Appointment, ClientError> {
        let row: Appointment = self
            .get(&format!(
                "/appointments/{appointment_id}?business_id={business_id}"
            ))
            .await?;
        Ok(row.normalize())
    }

    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ClientError> {
        let row: Appointment = self.post("/appointments/", appointment).await?;
        Ok(row.normalize())
    }

    pub async fn update_appointment(
        &self,
        appointment_id: &str,
        business_id: &str,
        updates: &serde_json::Value,
    ) -> Result<Appointment, ClientError> {
        let row: Appointment = self
            .put(
                &format!("/appointments/{appointment_id}?business_id={business_id}"),
                updates,
            )
            .await?;
        Ok(row.normalize())
    }

    pub async fn delete_appointment(
        &self,
        appointment_id: &str,
        business_id: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.delete(&format!(
            "/appointments/{appointment_id}?business_id={business_id}"
        ))
        .await
    }

    pub async fn appointments_in_range(
        &self,
        business_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Appointment>, ClientError> {
        let rows: Vec<Appointment> = self
            .get(&format!(
                "/appointments/business/{business_id}/range?start_date={start_date}&end_date={end_date}"
            ))
            .await?;
        Ok(rows.into_iter().map(Appointment::normalize).collect())
    }

    // ---- business hours ----

    pub async fn business_hours(&self, business_id: &str) -> Result<WeeklyHours, ClientError> {
        self.get(&format!("/business-hours/business/{business_id}"))
            .await
    }

    pub async fn update_business_hours(
        &self,
        business_id: &str,
        hours: &WeeklyHours,
    ) -> Result<MessageResponse, ClientError> {
        self.put(&format!("/business-hours/business/{business_id}"), hours)
            .await
    }

    pub async fn update_day_hours(
        &self,
        business_id: &str,
        day: Weekday,
        hours: &crate::models::DayHours,
    ) -> Result<MessageResponse, ClientError> {
        self.put(
            &format!("/business-hours/business/{business_id}/day/{}", day.key()),
            hours,
        )
        .await
    }

    pub async fn available_slots(
        &self,
        business_id: &str,
    ) -> Result<BTreeMap<Weekday, Vec<TimeSlot>>, ClientError> {
        self.get(&format!(
            "/business-hours/business/{business_id}/available-slots"
        ))
        .await
    }

    pub async fn delete_business_hours(
        &self,
        business_id: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.delete(&format!("/business-hours/business/{business_id}"))
            .await
    }

    // ---- closed dates ----

    pub async fn closed_dates(&self, business_id: &str) -> Result<Vec<NaiveDate>, ClientError> {
        #[derive(Deserialize)]
        struct ClosedDatesBody {
            closed_dates: Vec<NaiveDate>,
        }
        let body: ClosedDatesBody = self
            .get(&format!("/closed-dates/business/{business_id}"))
            .await?;
        Ok(body.closed_dates)
    }

    pub async fn add_closed_date(
        &self,
        business_id: &str,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<MessageResponse, ClientError> {
        let body = json!({
            "date": date,
            "reason": reason.unwrap_or(""),
        });
        self.post(&format!("/closed-dates/business/{business_id}"), &body)
            .await
    }

    pub async fn remove_closed_date(
        &self,
        business_id: &str,
        date: NaiveDate,
    ) -> Result<MessageResponse, ClientError> {
        self.delete(&format!(
            "/closed-dates/business/{business_id}/date/{date}"
        ))
        .await
    }

    /// Bulk replace: the backend diffs against the stored set and reports how
    /// many dates were added and removed.
    pub async fn set_closed_dates(
        &self,
        business_id: &str,
        dates: &[NaiveDate],
    ) -> Result<ClosedDatesUpdate, ClientError> {
        let body = json!({ "closed_dates": dates });
        self.put(&format!("/closed-dates/business/{business_id}/bulk"), &body)
            .await
    }

    pub async fn is_closed(
        &self,
        business_id: &str,
        date: NaiveDate,
    ) -> Result<ClosedCheck, ClientError> {
        self.get(&format!(
            "/closed-dates/business/{business_id}/check/{date}"
        ))
        .await
    }

    // ---- health ----

    pub async fn health_check(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = BooklyClient::new(Url::parse("http://localhost:3001/api").unwrap());
        assert_eq!(
            client.endpoint("/businesses/slug/lilly"),
            "http://localhost:3001/api/businesses/slug/lilly"
        );
        let client = BooklyClient::new(Url::parse("http://localhost:3001/api/").unwrap());
        assert_eq!(
            client.endpoint("/businesses/"),
            "http://localhost:3001/api/businesses/"
        );
    }
}
