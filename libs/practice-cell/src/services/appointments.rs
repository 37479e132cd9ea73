use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use shared_config::AppointmentSelection;

use crate::models::Appointment;

/// One way of asking the practice system for a patient's appointments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentSource {
    /// Appointments included in the patient lookup response.
    Embedded,
    /// `GET /patients/{id}/appointments`
    PatientAppointments,
    /// `GET /appointments?filter[patient_id]=…`
    DirectEndpoint,
    /// `GET /appointments/upcoming?patient_id=…`
    Upcoming,
}

impl AppointmentSource {
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentSource::Embedded => "embedded",
            AppointmentSource::PatientAppointments => "patient_appointments",
            AppointmentSource::DirectEndpoint => "direct_endpoint",
            AppointmentSource::Upcoming => "upcoming",
        }
    }
}

/// Lookup order. Cheapest first: the embedded list costs no extra request.
pub const DEFAULT_STRATEGIES: [AppointmentSource; 4] = [
    AppointmentSource::Embedded,
    AppointmentSource::PatientAppointments,
    AppointmentSource::DirectEndpoint,
    AppointmentSource::Upcoming,
];

/// Applied to each strategy's result before it is absorbed, so a strategy
/// with nothing left after filtering counts as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentFilter {
    All,
    /// Not cancelled and starting at or after the given local time.
    UpcomingFrom(NaiveDateTime),
}

impl AppointmentFilter {
    pub fn keeps(&self, appointment: &Appointment) -> bool {
        match self {
            AppointmentFilter::All => true,
            AppointmentFilter::UpcomingFrom(now) => appointment.is_upcoming(*now),
        }
    }
}

/// Outcome of walking the strategy chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentLookup {
    pub appointments: Vec<Appointment>,
    /// Strategies whose results were kept, in the order they ran.
    pub sources: Vec<AppointmentSource>,
    /// Strategies that errored and were skipped.
    pub failed: Vec<AppointmentSource>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl AppointmentLookup {
    /// Records the result of one strategy. Returns true when the chain should stop.
    pub fn absorb(
        &mut self,
        source: AppointmentSource,
        appointments: Vec<Appointment>,
        policy: AppointmentSelection,
    ) -> bool {
        if appointments.is_empty() {
            return false;
        }

        let before = self.appointments.len();
        for appointment in appointments {
            if self.seen.insert(appointment.dedup_key()) {
                self.appointments.push(appointment);
            }
        }

        if self.appointments.len() > before {
            self.sources.push(source);
        }

        policy == AppointmentSelection::FirstNonEmpty
    }

    pub fn record_failure(&mut self, source: AppointmentSource) {
        self.failed.push(source);
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(id: &str) -> Appointment {
        Appointment {
            id: id.to_string(),
            date: "2030-01-01".to_string(),
            time: "10:00".to_string(),
            duration_minutes: 30,
            clinician: String::new(),
            location: String::new(),
            status: "booked".to_string(),
        }
    }

    #[test]
    fn test_first_non_empty_stops_at_first_hit() {
        let mut lookup = AppointmentLookup::default();
        let policy = AppointmentSelection::FirstNonEmpty;

        assert!(!lookup.absorb(AppointmentSource::Embedded, vec![], policy));
        assert!(lookup.absorb(AppointmentSource::DirectEndpoint, vec![appt("1"), appt("2")], policy));

        assert_eq!(lookup.appointments.len(), 2);
        assert_eq!(lookup.sources, vec![AppointmentSource::DirectEndpoint]);
    }

    #[test]
    fn test_merge_drops_duplicates_across_sources() {
        let mut lookup = AppointmentLookup::default();
        let policy = AppointmentSelection::Merge;

        assert!(!lookup.absorb(AppointmentSource::Embedded, vec![appt("1")], policy));
        assert!(!lookup.absorb(
            AppointmentSource::PatientAppointments,
            vec![appt("1"), appt("2")],
            policy
        ));
        assert!(!lookup.absorb(AppointmentSource::Upcoming, vec![appt("2")], policy));

        let ids: Vec<&str> = lookup.appointments.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(
            lookup.sources,
            vec![AppointmentSource::Embedded, AppointmentSource::PatientAppointments]
        );
    }

    #[test]
    fn test_duplicates_within_one_source_are_dropped() {
        let mut lookup = AppointmentLookup::default();
        lookup.absorb(
            AppointmentSource::Embedded,
            vec![appt("1"), appt("1")],
            AppointmentSelection::FirstNonEmpty,
        );
        assert_eq!(lookup.appointments.len(), 1);
    }

    #[test]
    fn test_upcoming_filter() {
        let now = NaiveDateTime::parse_from_str("2030-01-01 09:00", "%Y-%m-%d %H:%M").unwrap();
        let filter = AppointmentFilter::UpcomingFrom(now);

        assert!(filter.keeps(&appt("1")));
        assert!(!filter.keeps(&Appointment { date: "2001-01-01".to_string(), ..appt("2") }));
        assert!(!filter.keeps(&Appointment { status: "cancelled".to_string(), ..appt("3") }));
        assert!(AppointmentFilter::All.keeps(&Appointment { date: "2001-01-01".to_string(), ..appt("4") }));
    }

    #[test]
    fn test_source_names_match_serialization() {
        for source in DEFAULT_STRATEGIES {
            let json = serde_json::to_value(source).unwrap();
            assert_eq!(json, source.name());
        }
    }
}
