//! Resolution of the entities referenced by a service journey.

use crate::error::Error;
use netex_model::{
    DayType, DayTypeAssignment, NetexEntitiesIndex, NoticeAssignment, OperatingDay,
    OperatingPeriod, Operator, ServiceJourney,
};
use rustc_hash::FxHashSet;

/// The calendar entities referenced by a service journey, plus its notice
/// assignments and its optional operator override.
///
/// The service journey carried here is a copy of the source journey whose day
/// type and operator references are pinned to the versions of the resolved
/// entities.
#[derive(Debug, Clone)]
pub struct ServiceJourneyReferences {
    pub service_journey: ServiceJourney,
    pub day_types: Vec<DayType>,
    pub day_type_assignments: Vec<DayTypeAssignment>,
    pub operating_periods: Vec<OperatingPeriod>,
    pub operating_days: Vec<OperatingDay>,
    pub notice_assignments: Vec<NoticeAssignment>,
    /// Operator override; when absent the line operator applies
    pub operator: Option<Operator>,
}

impl ServiceJourneyReferences {
    pub fn resolve(
        service_journey: &ServiceJourney,
        common_index: &NetexEntitiesIndex,
        line_index: &NetexEntitiesIndex,
    ) -> Result<ServiceJourneyReferences, Error> {
        let mut service_journey = service_journey.clone();

        let mut day_types = Vec::new();
        let mut day_type_assignments = Vec::new();
        let mut operating_periods = Vec::new();
        let mut operating_days = Vec::new();
        let mut seen_operating_days = FxHashSet::default();

        // Service journeys used together with dated service journeys do not
        // have day types.
        if let Some(day_type_refs) = &mut service_journey.day_type_refs {
            let mut seen_day_types = FxHashSet::default();
            for day_type_ref in day_type_refs.iter_mut() {
                let day_type = common_index
                    .day_type(&day_type_ref.id)
                    .ok_or_else(|| Error::ReferenceError(day_type_ref.id.clone()))?;
                *day_type_ref = day_type_ref.pinned_to(&day_type.version);
                if seen_day_types.insert(day_type.id.clone()) {
                    day_types.push(day_type.clone());
                }
            }

            let mut seen_assignments = FxHashSet::default();
            for day_type in &day_types {
                for assignment in common_index.day_type_assignments_for_day_type(&day_type.id) {
                    if seen_assignments.insert(assignment.id.clone()) {
                        day_type_assignments.push(assignment.clone());
                    }
                }
            }

            let mut seen_periods = FxHashSet::default();
            for assignment in &day_type_assignments {
                if let Some(operating_day_ref) = &assignment.operating_day_ref {
                    let operating_day = common_index
                        .operating_day(&operating_day_ref.id)
                        .ok_or_else(|| Error::ReferenceError(operating_day_ref.id.clone()))?;
                    if seen_operating_days.insert(operating_day.id.clone()) {
                        operating_days.push(operating_day.clone());
                    }
                }
                if let Some(operating_period_ref) = &assignment.operating_period_ref {
                    let operating_period = common_index
                        .operating_period(&operating_period_ref.id)
                        .ok_or_else(|| Error::ReferenceError(operating_period_ref.id.clone()))?;
                    if seen_periods.insert(operating_period.id.clone()) {
                        operating_periods.push(operating_period.clone());
                    }
                }
            }
        }

        // Dated service journeys bind the journey to operating days directly;
        // both calendar mechanisms merge into one operating-days set.
        for dated in line_index.dated_service_journeys_for_service_journey(&service_journey.id) {
            let operating_day = common_index
                .operating_day(&dated.operating_day_ref.id)
                .ok_or_else(|| Error::ReferenceError(dated.operating_day_ref.id.clone()))?;
            if seen_operating_days.insert(operating_day.id.clone()) {
                operating_days.push(operating_day.clone());
            }
        }

        // The two filters are concatenated without deduplication: a service
        // journey id never equals a passing time id, so the passes select
        // disjoint assignments.
        let on_service_journey = line_index
            .notice_assignments()
            .iter()
            .filter(|assignment| assignment.noticed_object_ref.id == service_journey.id);
        let on_passing_times = line_index.notice_assignments().iter().filter(|assignment| {
            service_journey
                .passing_times
                .iter()
                .any(|passing_time| assignment.noticed_object_ref.id == passing_time.id)
        });
        let notice_assignments = on_service_journey.chain(on_passing_times).cloned().collect();

        let mut operator = None;
        if let Some(operator_ref) = &mut service_journey.operator_ref {
            // unlike the other optional references, a dangling operator
            // override is a data-integrity failure
            let resolved = common_index.operator(&operator_ref.id).ok_or_else(|| {
                Error::UnknownOperator {
                    operator: operator_ref.id.clone(),
                    service_journey: service_journey.id.clone(),
                }
            })?;
            *operator_ref = operator_ref.pinned_to(&resolved.version);
            operator = Some(resolved.clone());
        }

        Ok(ServiceJourneyReferences {
            service_journey,
            day_types,
            day_type_assignments,
            operating_periods,
            operating_days,
            notice_assignments,
            operator,
        })
    }
}
