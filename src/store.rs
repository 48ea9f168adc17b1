use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{BooklyClient, ClientError};
use crate::models::{Appointment, Business};

/// Shared application state: the business directory loaded at startup and a
/// per-business appointment cache kept fresh by [`spawn_refresh`].
///
/// This replaces the original UI's top-level component state and prop
/// drilling with one store and typed selectors.
#[derive(Default)]
pub struct AppStore {
    businesses: RwLock<Vec<Business>>,
    appointments: RwLock<HashMap<String, Vec<Appointment>>>,
    watched: RwLock<BTreeSet<String>>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot directory load. A failure leaves the directory empty; the
    /// caller decides whether that is fatal (at startup it is not).
    pub async fn load_businesses(&self, client: &BooklyClient) -> Result<usize, ClientError> {
        let businesses = client.list_businesses().await?;
        let count = businesses.len();
        *self.businesses.write().await = businesses;
        Ok(count)
    }

    /// Linear scan by slug, exactly as the original resolved public booking
    /// URLs against its loaded list.
    pub async fn business_by_slug(&self, slug: &str) -> Option<Business> {
        self.businesses
            .read()
            .await
            .iter()
            .find(|business| business.slug == slug)
            .cloned()
    }

    pub async fn business(&self, business_id: &str) -> Option<Business> {
        self.businesses
            .read()
            .await
            .iter()
            .find(|business| business.id == business_id)
            .cloned()
    }

    pub async fn business_count(&self) -> usize {
        self.businesses.read().await.len()
    }

    pub async fn upsert_business(&self, business: Business) {
        let mut businesses = self.businesses.write().await;
        match businesses.iter_mut().find(|b| b.id == business.id) {
            Some(existing) => *existing = business,
            None => businesses.push(business),
        }
    }

    /// Cached appointments for a business; fetches and starts watching on
    /// first access so the refresh task keeps the cache current afterwards.
    pub async fn appointments_for(
        &self,
        client: &BooklyClient,
        business_id: &str,
    ) -> Result<Vec<Appointment>, ClientError> {
        if let Some(cached) = self.appointments.read().await.get(business_id) {
            return Ok(cached.clone());
        }

        let fetched = client.business_appointments(business_id).await?;
        self.appointments
            .write()
            .await
            .insert(business_id.to_string(), fetched.clone());
        self.watched.write().await.insert(business_id.to_string());
        Ok(fetched)
    }

    pub async fn replace_appointments(&self, business_id: &str, appointments: Vec<Appointment>) {
        self.appointments
            .write()
            .await
            .insert(business_id.to_string(), appointments);
    }

    /// Merges a freshly created booking into the cache so the management
    /// views see it before the next poll.
    pub async fn push_appointment(&self, appointment: Appointment) {
        let mut caches = self.appointments.write().await;
        if let Some(cache) = caches.get_mut(&appointment.business_id) {
            cache.push(appointment);
        }
    }

    pub async fn watched_businesses(&self) -> Vec<String> {
        self.watched.read().await.iter().cloned().collect()
    }
}

/// Handle for the background refresh task; aborts the task when dropped.
pub struct RefreshHandle {
    handle: JoinHandle<()>,
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One refresh pass: reload the business directory if it is still empty
/// (a failed startup load heals here), then re-fetch appointments for every
/// watched business. Failures are logged and skipped; the next pass retries.
pub async fn refresh_pass(store: &AppStore, client: &BooklyClient) {
    if store.business_count().await == 0 {
        match store.load_businesses(client).await {
            Ok(count) => info!(count, "loaded business directory"),
            Err(err) => warn!(error = %err, "business directory load failed"),
        }
    }

    let business_ids = store.watched_businesses().await;
    debug!(count = business_ids.len(), "refreshing appointment caches");
    for business_id in business_ids {
        match client.business_appointments(&business_id).await {
            Ok(appointments) => {
                info!(
                    business_id = %business_id,
                    count = appointments.len(),
                    "refreshed appointments"
                );
                store.replace_appointments(&business_id, appointments).await;
            }
            Err(err) => {
                warn!(business_id = %business_id, error = %err, "appointment refresh failed");
            }
        }
    }
}

/// Spawns the fixed-interval poll driving [`refresh_pass`].
pub fn spawn_refresh(
    store: Arc<AppStore>,
    client: Arc<BooklyClient>,
    interval: Duration,
) -> RefreshHandle {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it, callers already fetch
        // on first access.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            refresh_pass(&store, &client).await;
        }
    });
    RefreshHandle { handle }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::models::AppointmentStatus;

    fn business(id: &str, slug: &str) -> Business {
        Business {
            id: id.into(),
            slug: slug.into(),
            name: slug.to_uppercase(),
            category: String::new(),
            description: String::new(),
            address: String::new(),
            phone: String::new(),
            email: format!("{slug}@example.com"),
            qr_code_url: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_slug_lookup() {
        let store = AppStore::new();
        store.upsert_business(business("b1", "lilly-salon")).await;
        store.upsert_business(business("b2", "barber-bros")).await;

        assert_eq!(
            store.business_by_slug("barber-bros").await.unwrap().id,
            "b2"
        );
        assert!(store.business_by_slug("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = AppStore::new();
        store.upsert_business(business("b1", "old-slug")).await;
        store.upsert_business(business("b1", "new-slug")).await;

        assert_eq!(store.business_count().await, 1);
        assert!(store.business_by_slug("new-slug").await.is_some());
    }

    #[tokio::test]
    async fn test_push_appointment_only_updates_existing_cache() {
        let store = AppStore::new();
        let appointment = Appointment {
            id: "a1".into(),
            business_id: "b1".into(),
            customer_name: "Jane".into(),
            customer_email: "jane@example.com".into(),
            customer_phone: String::new(),
            service_name: "Haircut".into(),
            service_price: 45.0,
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            customers: None,
            services: None,
        };

        // No cache yet: nothing to merge into, the next fetch will see it.
        store.push_appointment(appointment.clone()).await;
        assert!(store.appointments.read().await.get("b1").is_none());

        store.replace_appointments("b1", Vec::new()).await;
        store.push_appointment(appointment).await;
        assert_eq!(store.appointments.read().await["b1"].len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_pass_reloads_empty_directory() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/businesses/");
            then.status(200).json_body(json!([{
                "id": "b1",
                "slug": "lilly-salon",
                "name": "Lilly Salon",
                "email": "owner@example.com"
            }]));
        });
        let client = BooklyClient::new(Url::parse(&server.base_url()).unwrap());
        let store = AppStore::new();

        // Startup load failed or never ran: the directory is empty until a
        // refresh pass reloads it.
        refresh_pass(&store, &client).await;
        assert_eq!(store.business_count().await, 1);
        assert!(store.business_by_slug("lilly-salon").await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_pass_refetches_watched_appointments() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/appointments/business/b1");
            then.status(200).json_body(json!([{
                "id": "a1",
                "business_id": "b1",
                "appointment_date": "2024-06-15",
                "appointment_time": "09:00:00",
                "customers": {"name": "Jane", "email": "jane@example.com", "phone": ""},
                "services": {"name": "Haircut", "price": 45.0}
            }]));
        });
        let client = BooklyClient::new(Url::parse(&server.base_url()).unwrap());
        let store = AppStore::new();
        store.upsert_business(business("b1", "lilly-salon")).await;

        // First access fills the cache and marks b1 watched.
        let fetched = store.appointments_for(&client, "b1").await.unwrap();
        assert_eq!(fetched.len(), 1);

        // Stale cache gets replaced on the next pass.
        store.replace_appointments("b1", Vec::new()).await;
        refresh_pass(&store, &client).await;
        assert_eq!(store.appointments.read().await["b1"].len(), 1);
    }
}
