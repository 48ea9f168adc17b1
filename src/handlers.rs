use std::collections::{BTreeMap, BTreeSet};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures::future::try_join3;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    AppState,
    analytics::{self, HistoryReport, PAGE_SIZE, PageMeta, PeriodFilter},
    auth::verify_token,
    calendar::{self, MonthGrid},
    error::ApiError,
    models::{
        Appointment, AppointmentStatus, Business, BusinessRegistration, BusinessUpdate, DayHours,
        MessageResponse, NewAppointment, NewService, Service, ServiceUpdate, Weekday, WeeklyHours,
        slugify,
    },
    slots::{self, TimeSlot},
    validation::{validate_booking, validate_month, validate_page, validate_registration},
};

/// Wall clock in the configured business timezone. Every "today" and "this
/// month" decision goes through here.
fn now_local(state: &AppState) -> NaiveDateTime {
    Utc::now().with_timezone(&state.settings.timezone).naive_local()
}

async fn resolve_business(state: &AppState, business_id: &str) -> Result<Business, ApiError> {
    if let Some(business) = state.store.business(business_id).await {
        return Ok(business);
    }
    let business = state.client.business(business_id).await?;
    state.store.upsert_business(business.clone()).await;
    Ok(business)
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

fn authorize(
    state: &AppState,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    token: Option<&str>,
) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, token)
}

// ---- public surface ----

#[utoipa::path(get, path = "/", tag = "public")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Bookly Gateway",
        "endpoints": {
            "/book/{slug}": "Public booking page data",
            "/book/{slug}/availability": "Bookable times for a date",
            "/manage/{business_id}/dashboard": "Business dashboard (token required)"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "public")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "public")]
pub async fn healthz_ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.client.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "ok", "backend": "ok"})),
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "degraded", "backend": err.to_string()})),
        ),
    }
}

/// Everything the public booking page needs in one response.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingPageView {
    pub business: Business,
    pub services: Vec<Service>,
    pub hours: WeeklyHours,
    #[schema(value_type = Vec<String>, example = json!(["2024-07-04"]))]
    pub closed_dates: Vec<NaiveDate>,
    pub booking_url: String,
}

#[utoipa::path(
    get,
    path = "/book/{slug}",
    params(("slug" = String, Path, description = "Public business slug")),
    responses(
        (status = 200, description = "Booking page data", body = BookingPageView),
        (status = 303, description = "Unknown slug, redirect to /login")
    ),
    tag = "public"
)]
pub async fn get_booking_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let Some(business) = state.store.business_by_slug(&slug).await else {
        // Unknown slugs bounce to the login page rather than a blank view.
        info!(slug = %slug, "unknown booking slug, redirecting");
        return Ok(Redirect::to("/login").into_response());
    };

    let (services, hours, closed_dates) = try_join3(
        state.client.business_services(&business.id),
        state.client.business_hours(&business.id),
        state.client.closed_dates(&business.id),
    )
    .await?;

    let booking_url = business.booking_url(&state.settings.public_base_url);
    Ok(Json(BookingPageView {
        business,
        services,
        hours,
        closed_dates,
        booking_url,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityView {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    /// Slot start times as `HH:MM`.
    pub times: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/book/{slug}/availability",
    params(
        ("slug" = String, Path, description = "Public business slug"),
        ("date" = String, Query, description = "Date to check, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Bookable start times", body = AvailabilityView),
        (status = 404, description = "Business not found")
    ),
    tag = "public"
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state
        .store
        .business_by_slug(&slug)
        .await
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    let hours = state.client.business_hours(&business.id).await?;
    let closed: BTreeSet<NaiveDate> = state
        .client
        .closed_dates(&business.id)
        .await?
        .into_iter()
        .collect();

    let today = now_local(&state).date();
    let slots = calendar::available_slots(query.date, today, &hours, &closed);
    let times = slots
        .iter()
        .map(|slot| slot.start_time().format("%H:%M").to_string())
        .collect();

    Ok(Json(AvailabilityView {
        date: query.date,
        slots,
        times,
    }))
}

/// Public booking submission. Service, date, and time come from the picker;
/// the service price is resolved server-side from the business's service
/// list.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BookingRequest {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "hm_time_opt")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default = "default_send_confirmation")]
    pub send_email_confirmation: bool,
}

fn default_send_confirmation() -> bool {
    true
}

/// `Option<NaiveTime>` wrapper over [`hm_time`]; empty strings read as
/// missing, matching the original's unset form fields.
mod hm_time_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(value) => NaiveTime::parse_from_str(value, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid time: {value}"))),
        }
    }
}

#[utoipa::path(
    post,
    path = "/book/{slug}",
    params(("slug" = String, Path, description = "Public business slug")),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Appointment created", body = Appointment),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Business or service not found")
    ),
    tag = "public"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_booking(&request)?;

    let business = state
        .store
        .business_by_slug(&slug)
        .await
        .ok_or_else(|| ApiError::NotFound("Business not found".into()))?;

    let services = state.client.business_services(&business.id).await?;
    let service = services
        .iter()
        .find(|service| service.name == request.service_name)
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;

    // Checked by validate_booking above.
    let (Some(date), Some(time)) = (request.date, request.time) else {
        return Err(ApiError::BadRequest(
            "Please fill in all required fields".into(),
        ));
    };

    let payload = NewAppointment {
        business_id: business.id.clone(),
        business_name: business.name.clone(),
        service_name: service.name.clone(),
        service_price: service.price,
        date,
        time,
        customer_name: request.customer_name.clone(),
        customer_email: request.customer_email.clone(),
        customer_phone: request.customer_phone.clone(),
        send_email_confirmation: request.send_email_confirmation,
        status: AppointmentStatus::Confirmed,
    };

    let appointment = state.client.create_appointment(&payload).await?;
    info!(
        business_id = %business.id,
        appointment_id = %appointment.id,
        "booked appointment"
    );
    state.store.push_appointment(appointment.clone()).await;

    Ok((StatusCode::CREATED, Json(appointment)))
}

// ---- management surface ----

#[utoipa::path(
    post,
    path = "/manage/register",
    request_body = BusinessRegistration,
    responses(
        (status = 201, description = "Business registered", body = Business),
        (status = 400, description = "Missing or invalid fields")
    ),
    tag = "management"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(registration): Json<BusinessRegistration>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&registration)?;

    let mut business = state.client.register_business(&registration).await?;
    if business.slug.is_empty() {
        // Some backend versions omit the slug on the register response;
        // derive it the same way the backend does so the share URL works
        // immediately.
        business.slug = slugify(&registration.name);
    }
    for service in &registration.services {
        state.client.create_service(&business.id, service).await?;
    }
    info!(business_id = %business.id, slug = %business.slug, "registered business");
    state.store.upsert_business(business.clone()).await;

    Ok((StatusCode::CREATED, Json(business)))
}

#[utoipa::path(
    post,
    path = "/manage/login",
    request_body = crate::models::Credentials,
    responses(
        (status = 200, description = "Authenticated business", body = Business),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "management"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<crate::models::Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let business = state.client.login(&credentials).await?;
    state.store.upsert_business(business.clone()).await;
    Ok(Json(business))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub business_id: String,
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
    pub today_appointments: usize,
    pub booking_url: String,
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/dashboard",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Dashboard stats", body = DashboardView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let business = resolve_business(&state, &business_id).await?;
    let appointments = state
        .store
        .appointments_for(&state.client, &business_id)
        .await?;

    let now = now_local(&state);
    let today = now.date();
    let upcoming = appointments
        .iter()
        .filter(|apt| apt.date.and_time(apt.time) > now)
        .count();
    let today_count = appointments.iter().filter(|apt| apt.date == today).count();

    Ok(Json(DashboardView {
        business_id,
        total_appointments: appointments.len(),
        upcoming_appointments: upcoming,
        today_appointments: today_count,
        booking_url: business.booking_url(&state.settings.public_base_url),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarDay {
    pub day: u32,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub appointment_count: usize,
    pub is_closed: bool,
    pub is_open: bool,
    pub is_available: bool,
    pub is_today: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarView {
    pub year: i32,
    pub month: u32,
    pub leading_blanks: u32,
    pub days_in_month: u32,
    pub days: Vec<CalendarDay>,
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/calendar",
    params(
        ("business_id" = String, Path, description = "Business id"),
        ("year" = Option<i32>, Query, description = "Displayed year, defaults to current"),
        ("month" = Option<u32>, Query, description = "Displayed month 1-12, defaults to current")
    ),
    responses(
        (status = 200, description = "Month grid with per-day availability", body = CalendarView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn get_calendar(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let today = now_local(&state).date();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = validate_month(query.month.unwrap_or_else(|| today.month()))?;

    let grid = MonthGrid::new(year, month)
        .ok_or_else(|| ApiError::BadRequest("Invalid year/month".into()))?;

    let appointments = state
        .store
        .appointments_for(&state.client, &business_id)
        .await?;
    let hours = state.client.business_hours(&business_id).await?;
    let closed: BTreeSet<NaiveDate> = state
        .client
        .closed_dates(&business_id)
        .await?
        .into_iter()
        .collect();

    let days = grid
        .days()
        .map(|date| CalendarDay {
            day: date.day(),
            date,
            appointment_count: calendar::appointments_on(&appointments, date).len(),
            is_closed: closed.contains(&date),
            is_open: calendar::is_open(date, &hours, &closed),
            is_available: calendar::is_available(date, &hours, &closed),
            is_today: date == today,
        })
        .collect();

    Ok(Json(CalendarView {
        year,
        month,
        leading_blanks: grid.leading_blanks,
        days_in_month: grid.days_in_month,
        days,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub period: PeriodFilter,
    pub service: Option<String>,
    pub year: Option<i32>,
    pub page: Option<usize>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub derived_status: AppointmentStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryView {
    pub report: HistoryReport,
    pub rows: Vec<HistoryRow>,
    pub page: PageMeta,
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/history",
    params(
        ("business_id" = String, Path, description = "Business id"),
        ("period" = Option<String>, Query, description = "all | this-month | last-month"),
        ("service" = Option<String>, Query, description = "Exact service name filter"),
        ("year" = Option<i32>, Query, description = "Year for the 12-month series"),
        ("page" = Option<usize>, Query, description = "One-based page number")
    ),
    responses(
        (status = 200, description = "Analytics report plus one page of rows", body = HistoryView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn get_history(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let page = validate_page(query.page.unwrap_or(1))?;
    let now = now_local(&state);
    let today = now.date();

    let appointments = state
        .store
        .appointments_for(&state.client, &business_id)
        .await?;

    let report = HistoryReport::build(&appointments, today, query.year.unwrap_or_else(|| today.year()));

    let mut filtered: Vec<Appointment> =
        analytics::filter_appointments(&appointments, query.period, query.service.as_deref(), today)
            .into_iter()
            .cloned()
            .collect();
    // Most recent first, as the history list displays.
    filtered.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));

    let (rows, meta) = analytics::paginate(&filtered, page, PAGE_SIZE);
    let rows = rows
        .into_iter()
        .map(|appointment| HistoryRow {
            derived_status: analytics::derived_status(&appointment, now),
            appointment,
        })
        .collect();

    Ok(Json(HistoryView {
        report,
        rows,
        page: meta,
    }))
}

#[utoipa::path(
    put,
    path = "/manage/{business_id}/profile",
    params(("business_id" = String, Path, description = "Business id")),
    request_body = BusinessUpdate,
    responses(
        (status = 200, description = "Updated business", body = Business),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(updates): Json<BusinessUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let business = state.client.update_business(&business_id, &updates).await?;
    state.store.upsert_business(business.clone()).await;
    Ok(Json(business))
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/services",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Services for the business", body = [Service]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn list_services(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let services = state.client.business_services(&business_id).await?;
    Ok(Json(services))
}

#[utoipa::path(
    post,
    path = "/manage/{business_id}/services",
    params(("business_id" = String, Path, description = "Business id")),
    request_body = NewService,
    responses(
        (status = 201, description = "Created service", body = Service),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn create_service(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(service): Json<NewService>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    if service.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Service name is required".into()));
    }
    let created = state.client.create_service(&business_id, &service).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/manage/{business_id}/services/{service_id}",
    params(
        ("business_id" = String, Path, description = "Business id"),
        ("service_id" = String, Path, description = "Service id")
    ),
    request_body = ServiceUpdate,
    responses(
        (status = 200, description = "Updated service", body = Service),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn update_service(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path((_business_id, service_id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
    Json(updates): Json<ServiceUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let updated = state.client.update_service(&service_id, &updates).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/manage/{business_id}/services/{service_id}",
    params(
        ("business_id" = String, Path, description = "Business id"),
        ("service_id" = String, Path, description = "Service id")
    ),
    responses(
        (status = 200, description = "Deletion confirmation", body = MessageResponse),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn delete_service(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path((_business_id, service_id)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let message = state.client.delete_service(&service_id).await?;
    Ok(Json(message))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HoursView {
    pub hours: WeeklyHours,
    /// Human-readable ranges per day, e.g. "9:00 AM - 5:00 PM" or "Closed".
    pub display: BTreeMap<Weekday, String>,
}

fn hours_display(hours: &WeeklyHours) -> BTreeMap<Weekday, String> {
    Weekday::ALL
        .into_iter()
        .map(|day| {
            let day_hours = hours.day(day);
            let text = if day_hours.is_open {
                slots::format_slot_ranges(&day_hours.selected_slots)
            } else {
                "Closed".to_string()
            };
            (day, text)
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/hours",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Weekly hours with display ranges", body = HoursView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn get_hours(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let hours = state.client.business_hours(&business_id).await?;
    let display = hours_display(&hours);
    Ok(Json(HoursView { hours, display }))
}

#[utoipa::path(
    put,
    path = "/manage/{business_id}/hours",
    params(("business_id" = String, Path, description = "Business id")),
    request_body = WeeklyHours,
    responses(
        (status = 200, description = "Save confirmation", body = MessageResponse),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn save_hours(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(hours): Json<WeeklyHours>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let message = state
        .client
        .update_business_hours(&business_id, &hours)
        .await?;
    info!(business_id = %business_id, "saved weekly hours");
    Ok(Json(message))
}

#[utoipa::path(
    put,
    path = "/manage/{business_id}/hours/{day}",
    params(
        ("business_id" = String, Path, description = "Business id"),
        ("day" = String, Path, description = "Lowercase weekday name")
    ),
    request_body = DayHours,
    responses(
        (status = 200, description = "Save confirmation", body = MessageResponse),
        (status = 400, description = "Unknown weekday"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn save_day_hours(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path((business_id, day)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
    Json(hours): Json<DayHours>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let day = Weekday::parse(&day)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown weekday: {day}")))?;
    let message = state
        .client
        .update_day_hours(&business_id, day, &hours)
        .await?;
    Ok(Json(message))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClosedDatesView {
    #[schema(value_type = Vec<String>, example = json!(["2024-07-04"]))]
    pub closed_dates: Vec<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/closed-dates",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "Closed dates", body = ClosedDatesView),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn get_closed_dates(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let closed_dates = state.client.closed_dates(&business_id).await?;
    Ok(Json(ClosedDatesView { closed_dates }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClosedDatesRequest {
    #[schema(value_type = Vec<String>, example = json!(["2024-07-04"]))]
    pub closed_dates: Vec<NaiveDate>,
}

#[utoipa::path(
    put,
    path = "/manage/{business_id}/closed-dates",
    params(("business_id" = String, Path, description = "Business id")),
    request_body = ClosedDatesRequest,
    responses(
        (status = 200, description = "Bulk update result", body = crate::models::ClosedDatesUpdate),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn save_closed_dates(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(request): Json<ClosedDatesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let result = state
        .client
        .set_closed_dates(&business_id, &request.closed_dates)
        .await?;
    info!(
        business_id = %business_id,
        added = result.added,
        removed = result.removed,
        "updated closed dates"
    );
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/manage/{business_id}/appointments.ics",
    params(("business_id" = String, Path, description = "Business id")),
    responses(
        (status = 200, description = "iCalendar file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "No appointments found")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "management"
)]
pub async fn export_ical(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(business_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let business = resolve_business(&state, &business_id).await?;
    let appointments = state
        .store
        .appointments_for(&state.client, &business_id)
        .await?;

    if appointments.is_empty() {
        return Err(ApiError::NotFound("No appointments found".into()));
    }

    let body = state.exporter.generate(&business.name, &appointments);
    Ok((
        StatusCode::OK,
        [
            ("content-type", "text/calendar"),
            (
                "content-disposition",
                "attachment; filename=appointments.ics",
            ),
        ],
        body,
    ))
}
