use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::analytics::{HistoryReport, MonthTotals, PageMeta};
use crate::handlers::{
    AvailabilityView, BookingPageView, BookingRequest, CalendarDay, CalendarView, ClosedDatesView,
    DashboardView, HistoryView, HoursView,
};
use crate::models::{
    Appointment, Business, BusinessRegistration, BusinessUpdate, ClosedCheck, ClosedDatesUpdate,
    Credentials, DayHours, MessageResponse, NewAppointment, NewService, Service, ServiceUpdate,
    WeeklyHours,
};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .build(),
            ),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::get_booking_page,
        crate::handlers::get_availability,
        crate::handlers::create_booking,
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::get_dashboard,
        crate::handlers::get_calendar,
        crate::handlers::get_history,
        crate::handlers::update_profile,
        crate::handlers::list_services,
        crate::handlers::create_service,
        crate::handlers::update_service,
        crate::handlers::delete_service,
        crate::handlers::get_hours,
        crate::handlers::save_hours,
        crate::handlers::save_day_hours,
        crate::handlers::get_closed_dates,
        crate::handlers::save_closed_dates,
        crate::handlers::export_ical
    ),
    components(schemas(
        Appointment,
        AvailabilityView,
        BookingPageView,
        BookingRequest,
        Business,
        BusinessRegistration,
        BusinessUpdate,
        CalendarDay,
        CalendarView,
        ClosedCheck,
        ClosedDatesUpdate,
        ClosedDatesView,
        Credentials,
        DashboardView,
        DayHours,
        HistoryReport,
        HistoryView,
        HoursView,
        MessageResponse,
        MonthTotals,
        NewAppointment,
        NewService,
        PageMeta,
        Service,
        ServiceUpdate,
        WeeklyHours
    )),
    tags(
        (name = "public", description = "Public booking flow"),
        (name = "management", description = "Business management flow")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
