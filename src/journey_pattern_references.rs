//! Resolution of the entities referenced by a journey pattern.

use crate::error::Error;
use netex_model::{
    Id, JourneyPattern, NetexEntitiesIndex, NoticeAssignment, PassengerStopAssignment,
    ScheduledStopPoint,
};
use rustc_hash::FxHashSet;

/// The entities referenced by a journey pattern: its scheduled stop points
/// and their stop assignments from the common file, plus the notice
/// assignments of the line file that annotate the pattern or its stop points.
///
/// The journey pattern carried here is a copy of the source pattern whose
/// stop point references are pinned to the versions of the resolved stop
/// points.
#[derive(Debug, Clone)]
pub struct JourneyPatternReferences {
    pub journey_pattern: JourneyPattern,
    pub scheduled_stop_points: Vec<ScheduledStopPoint>,
    pub passenger_stop_assignments: Vec<PassengerStopAssignment>,
    pub notice_assignments: Vec<NoticeAssignment>,
}

impl JourneyPatternReferences {
    pub fn resolve(
        journey_pattern: &JourneyPattern,
        common_index: &NetexEntitiesIndex,
        line_index: &NetexEntitiesIndex,
    ) -> Result<JourneyPatternReferences, Error> {
        let mut journey_pattern = journey_pattern.clone();

        let mut scheduled_stop_points = Vec::new();
        let mut seen_stop_points = FxHashSet::default();
        for stop_point_in_pattern in &mut journey_pattern.points_in_sequence {
            let stop_point_ref = &stop_point_in_pattern.scheduled_stop_point_ref;
            let stop_point = common_index
                .scheduled_stop_point(&stop_point_ref.id)
                .ok_or_else(|| Error::ReferenceError(stop_point_ref.id.clone()))?;
            stop_point_in_pattern.scheduled_stop_point_ref =
                stop_point_ref.pinned_to(&stop_point.version);
            if seen_stop_points.insert(stop_point.id.clone()) {
                scheduled_stop_points.push(stop_point.clone());
            }
        }

        let mut passenger_stop_assignments = Vec::new();
        let mut seen_assignments = FxHashSet::default();
        for stop_point in &scheduled_stop_points {
            for assignment in common_index.passenger_stop_assignments_for_stop_point(&stop_point.id)
            {
                if seen_assignments.insert(assignment.id.clone()) {
                    passenger_stop_assignments.push(assignment.clone());
                }
            }
        }

        // The two filters are concatenated without deduplication: a journey
        // pattern id never equals a stop-point-in-journey-pattern id, so the
        // passes select disjoint assignments.
        let on_journey_pattern = line_index
            .notice_assignments()
            .iter()
            .filter(|assignment| assignment.noticed_object_ref.id == journey_pattern.id);
        let on_stop_points = line_index.notice_assignments().iter().filter(|assignment| {
            journey_pattern
                .points_in_sequence
                .iter()
                .any(|stop_point| assignment.noticed_object_ref.id == stop_point.id())
        });
        let notice_assignments = on_journey_pattern.chain(on_stop_points).cloned().collect();

        Ok(JourneyPatternReferences {
            journey_pattern,
            scheduled_stop_points,
            passenger_stop_assignments,
            notice_assignments,
        })
    }
}
