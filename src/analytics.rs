use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Appointment, AppointmentStatus};

/// Rows per history page, matching the original list view.
pub const PAGE_SIZE: usize = 10;

/// Month-over-month percentage change. An empty previous month reports 0,
/// never NaN or infinity.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Signed display form: "+12.5%", "-3.0%", "+0.0%".
pub fn format_percentage(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthTotals {
    pub month: String,
    pub appointments: usize,
    pub revenue: f64,
}

/// Aggregates derived from the full in-memory appointment list. Recomputed
/// on every request, exactly as the original recomputed per render.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryReport {
    pub total_appointments: usize,
    pub total_revenue: f64,
    pub current_month_appointments: usize,
    pub current_month_revenue: f64,
    pub last_month_appointments: usize,
    pub last_month_revenue: f64,
    pub revenue_change: f64,
    pub revenue_change_display: String,
    pub appointment_change: f64,
    pub appointment_change_display: String,
    pub service_breakdown: BTreeMap<String, usize>,
    pub year_series: Vec<MonthTotals>,
}

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl HistoryReport {
    pub fn build(appointments: &[Appointment], today: NaiveDate, selected_year: i32) -> Self {
        let current = MonthKey::of(today);
        let previous = current.previous();

        let in_month = |apt: &&Appointment, key: MonthKey| MonthKey::of(apt.date) == key;

        let current_month: Vec<&Appointment> = appointments
            .iter()
            .filter(|apt| in_month(apt, current))
            .collect();
        let last_month: Vec<&Appointment> = appointments
            .iter()
            .filter(|apt| in_month(apt, previous))
            .collect();

        let revenue = |rows: &[&Appointment]| rows.iter().map(|apt| apt.service_price).sum::<f64>();

        let total_revenue = appointments.iter().map(|apt| apt.service_price).sum();
        let current_month_revenue = revenue(&current_month);
        let last_month_revenue = revenue(&last_month);

        let revenue_change = percent_change(current_month_revenue, last_month_revenue);
        let appointment_change =
            percent_change(current_month.len() as f64, last_month.len() as f64);

        let mut service_breakdown: BTreeMap<String, usize> = BTreeMap::new();
        for apt in appointments {
            *service_breakdown.entry(apt.service_name.clone()).or_default() += 1;
        }

        let year_series = (1..=12u32)
            .map(|month| {
                let key = MonthKey {
                    year: selected_year,
                    month,
                };
                let rows: Vec<&Appointment> = appointments
                    .iter()
                    .filter(|apt| in_month(apt, key))
                    .collect();
                MonthTotals {
                    month: MONTH_ABBREVS[(month - 1) as usize].to_string(),
                    appointments: rows.len(),
                    revenue: revenue(&rows),
                }
            })
            .collect();

        Self {
            total_appointments: appointments.len(),
            total_revenue,
            current_month_appointments: current_month.len(),
            current_month_revenue,
            last_month_appointments: last_month.len(),
            last_month_revenue,
            revenue_change,
            revenue_change_display: format_percentage(revenue_change),
            appointment_change,
            appointment_change_display: format_percentage(appointment_change),
            service_breakdown,
            year_series,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodFilter {
    #[default]
    All,
    ThisMonth,
    LastMonth,
}

/// History list filters: period relative to `today`, plus an optional exact
/// service name.
pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    period: PeriodFilter,
    service: Option<&str>,
    today: NaiveDate,
) -> Vec<&'a Appointment> {
    let current = MonthKey::of(today);
    appointments
        .iter()
        .filter(|apt| match period {
            PeriodFilter::All => true,
            PeriodFilter::ThisMonth => MonthKey::of(apt.date) == current,
            PeriodFilter::LastMonth => MonthKey::of(apt.date) == current.previous(),
        })
        .filter(|apt| service.is_none_or(|name| apt.service_name == name))
        .collect()
}

/// Display status derived from the clock: past appointments read as
/// completed, future ones as confirmed, unless the stored status already
/// says cancelled.
pub fn derived_status(appointment: &Appointment, now: NaiveDateTime) -> AppointmentStatus {
    if appointment.status == AppointmentStatus::Cancelled {
        return AppointmentStatus::Cancelled;
    }
    if appointment.date.and_time(appointment.time) < now {
        AppointmentStatus::Completed
    } else {
        AppointmentStatus::Confirmed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub page: usize,
    pub per_page: usize,
    pub total_rows: usize,
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Pagination purely by slicing, one-based page numbers.
pub fn paginate<T: Clone>(rows: &[T], page: usize, per_page: usize) -> (Vec<T>, PageMeta) {
    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_rows);
    let slice = rows.get(start..end).unwrap_or_default().to_vec();

    let meta = PageMeta {
        page,
        per_page,
        total_rows,
        total_pages,
        has_prev: page > 1,
        has_next: page < total_pages,
    };
    (slice, meta)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn appointment(date: &str, service: &str, price: f64) -> Appointment {
        Appointment {
            id: format!("{date}-{service}"),
            business_id: "b1".into(),
            customer_name: "Jane".into(),
            customer_email: "jane@example.com".into(),
            customer_phone: String::new(),
            service_name: service.into(),
            service_price: price,
            date: date.parse().unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status: AppointmentStatus::Confirmed,
            customers: None,
            services: None,
        }
    }

    #[test]
    fn test_percent_change_empty_previous_month() {
        assert_eq!(percent_change(5.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert!(percent_change(150.0, 100.0) - 50.0 < 1e-9);
    }

    #[test]
    fn test_report_with_no_appointments_this_month() {
        let today: NaiveDate = "2024-06-20".parse().unwrap();
        let report = HistoryReport::build(&[], today, 2024);
        assert_eq!(report.revenue_change, 0.0);
        assert_eq!(report.appointment_change, 0.0);
        assert_eq!(report.revenue_change_display, "+0.0%");
        assert_eq!(report.year_series.len(), 12);
    }

    #[test]
    fn test_month_over_month() {
        let today: NaiveDate = "2024-06-20".parse().unwrap();
        let appointments = vec![
            appointment("2024-05-10", "Haircut", 100.0),
            appointment("2024-06-05", "Haircut", 150.0),
            appointment("2024-06-12", "Shave", 20.0),
        ];
        let report = HistoryReport::build(&appointments, today, 2024);
        assert_eq!(report.current_month_appointments, 2);
        assert_eq!(report.last_month_appointments, 1);
        assert!((report.revenue_change - 70.0).abs() < 1e-9);
        assert!((report.appointment_change - 100.0).abs() < 1e-9);
        assert_eq!(report.service_breakdown["Haircut"], 2);
        assert_eq!(report.year_series[5].appointments, 2);
        assert_eq!(report.year_series[4].revenue, 100.0);
    }

    #[test]
    fn test_january_previous_month_wraps() {
        let today: NaiveDate = "2024-01-15".parse().unwrap();
        let appointments = vec![
            appointment("2023-12-20", "Haircut", 50.0),
            appointment("2024-01-10", "Haircut", 100.0),
        ];
        let report = HistoryReport::build(&appointments, today, 2024);
        assert_eq!(report.last_month_appointments, 1);
        assert!((report.revenue_change - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_filters() {
        let today: NaiveDate = "2024-06-20".parse().unwrap();
        let appointments = vec![
            appointment("2024-05-10", "Haircut", 100.0),
            appointment("2024-06-05", "Haircut", 150.0),
            appointment("2024-06-12", "Shave", 20.0),
        ];
        let this_month =
            filter_appointments(&appointments, PeriodFilter::ThisMonth, None, today);
        assert_eq!(this_month.len(), 2);
        let last_month =
            filter_appointments(&appointments, PeriodFilter::LastMonth, None, today);
        assert_eq!(last_month.len(), 1);
        let shaves =
            filter_appointments(&appointments, PeriodFilter::All, Some("Shave"), today);
        assert_eq!(shaves.len(), 1);
    }

    #[test]
    fn test_pagination_last_partial_page() {
        let rows: Vec<u32> = (0..23).collect();
        let (page, meta) = paginate(&rows, 3, PAGE_SIZE);
        assert_eq!(page.len(), 3);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_prev);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_pagination_clamps_and_handles_empty() {
        let rows: Vec<u32> = (0..5).collect();
        let (page, meta) = paginate(&rows, 9, PAGE_SIZE);
        assert_eq!(meta.page, 1);
        assert_eq!(page.len(), 5);
        assert!(!meta.has_next);

        let empty: Vec<u32> = Vec::new();
        let (page, meta) = paginate(&empty, 1, PAGE_SIZE);
        assert!(page.is_empty());
        assert_eq!(meta.total_pages, 1);
    }

    #[test]
    fn test_derived_status() {
        let apt = appointment("2024-06-15", "Haircut", 45.0);
        let before = "2024-06-15"
            .parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let after = "2024-06-15"
            .parse::<NaiveDate>()
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(derived_status(&apt, before), AppointmentStatus::Confirmed);
        assert_eq!(derived_status(&apt, after), AppointmentStatus::Completed);
    }
}
