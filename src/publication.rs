//! Assembled publication documents.
//!
//! A publication delivery is the self-contained output document: one
//! composite frame whose identity metadata is copied from the source dataset,
//! wrapping a resource frame, a service frame, a timetable frame and, when
//! the journey runs on day types, a service calendar frame. Every id
//! referenced from any frame of the document is defined by an entity present
//! in one of its own frames; empty frames and substructures are omitted
//! entirely so that the document satisfies the schema downstream validates
//! against.

use crate::error::Error;
use crate::journey_pattern_references::JourneyPatternReferences;
use crate::line_references::{AnyLine, LineReferences};
use crate::route_references::RouteReferences;
use crate::service_journey_references::ServiceJourneyReferences;
use chrono::NaiveDateTime;
use netex_model::serde_helpers::{deserialize_date_time, serialize_date_time};
use netex_model::{
    Authority, AvailabilityCondition, Branding, Codespace, DatedServiceJourney, DayType,
    DayTypeAssignment, DestinationDisplay, FrameDefaults, JourneyPattern, NetexEntitiesIndex,
    Network, Notice, NoticeAssignment, OperatingDay, OperatingPeriod, Operator,
    PassengerStopAssignment, Route, RoutePoint, ScheduledStopPoint, ServiceJourney,
    ServiceJourneyInterchange, ServiceLink,
};
use serde::{Deserialize, Serialize};

/// NeTEx profile version stamped on every delivery
pub const NETEX_VERSION: &str = "1.12:NO-NeTEx-networktimetable:1.3";
/// Participant emitting the deliveries
pub const NETEX_PARTICIPANT_REF: &str = "RB";

pub(crate) const DEFAULT_FRAME_ID: &str = "1";
pub(crate) const DEFAULT_FRAME_VERSION: &str = "1";

/// A self-contained publication document
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicationDelivery {
    pub version: String,
    pub participant_ref: String,
    pub description: String,
    #[serde(
        deserialize_with = "deserialize_date_time",
        serialize_with = "serialize_date_time"
    )]
    pub publication_timestamp: NaiveDateTime,
    pub composite_frame: DeliveryCompositeFrame,
}

/// The outermost container of a delivery. Identity, validity and defaults are
/// copied from the source dataset's own composite frame
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeliveryCompositeFrame {
    pub id: String,
    pub version: String,
    #[serde(
        deserialize_with = "deserialize_date_time",
        serialize_with = "serialize_date_time"
    )]
    pub created: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub codespaces: Vec<Codespace>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validity_conditions: Vec<AvailabilityCondition>,
    pub frame_defaults: FrameDefaults,
    pub frames: DeliveryFrames,
}

/// The frames nested in the composite frame. A frame with nothing to say is
/// omitted, never emitted empty
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeliveryFrames {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_frame: Option<ResourceFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_frame: Option<ServiceFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetable_frame: Option<TimetableFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_calendar_frame: Option<ServiceCalendarFrame>,
}

/// Organisations and brandings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResourceFrame {
    pub id: String,
    pub version: String,
    pub operators: Vec<Operator>,
    pub authorities: Vec<Authority>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brandings: Vec<Branding>,
}

/// Lines, routes, journey patterns and the stop topology they run over
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ServiceFrame {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<AnyLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub journey_patterns: Vec<JourneyPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scheduled_stop_points: Vec<ScheduledStopPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_assignments: Vec<PassengerStopAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route_points: Vec<RoutePoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_links: Vec<ServiceLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_displays: Vec<DestinationDisplay>,
}

/// The published service journey, its dated variants and its interchanges
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimetableFrame {
    pub id: String,
    pub version: String,
    pub service_journeys: Vec<ServiceJourney>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dated_service_journeys: Vec<DatedServiceJourney>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub journey_interchanges: Vec<ServiceJourneyInterchange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notice_assignments: Vec<NoticeAssignment>,
}

/// Calendar primitives of the published journey
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceCalendarFrame {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub day_types: Vec<DayType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub day_type_assignments: Vec<DayTypeAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operating_periods: Vec<OperatingPeriod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operating_days: Vec<OperatingDay>,
}

/// Delivery skeleton whose composite frame identity is copied from the source
/// dataset's composite frame.
pub(crate) fn delivery_from_source_frame(
    description: impl Into<String>,
    source_frame: &netex_model::CompositeFrame,
    publication_timestamp: NaiveDateTime,
) -> PublicationDelivery {
    PublicationDelivery {
        version: NETEX_VERSION.to_owned(),
        participant_ref: NETEX_PARTICIPANT_REF.to_owned(),
        description: description.into(),
        publication_timestamp,
        composite_frame: DeliveryCompositeFrame {
            id: source_frame.id.clone(),
            version: source_frame.version.clone(),
            created: source_frame.created,
            codespaces: source_frame.codespaces.clone(),
            validity_conditions: source_frame.validity_conditions.clone(),
            frame_defaults: source_frame.frame_defaults.clone(),
            frames: DeliveryFrames::default(),
        },
    }
}

/// Assembles the self-contained delivery for one service journey.
///
/// The line, route and journey pattern bundles are computed once per anchor
/// and shared across the many service journeys that reference them; the
/// service journey bundle is resolved here. Output invariants: the resource
/// frame holds the deduplicated union of the line operator and the journey's
/// operator override; interchange endpoint reference versions are cleared
/// (interchanges cross dataset-version boundaries); the calendar frame only
/// appears when the journey actually carries calendar entities.
#[allow(clippy::too_many_arguments)]
pub fn build_service_journey_delivery(
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    line_index: &NetexEntitiesIndex,
    service_journey_id: &str,
    line_references: &LineReferences,
    route_references: &RouteReferences,
    journey_pattern_references: &JourneyPatternReferences,
    publication_timestamp: NaiveDateTime,
) -> Result<PublicationDelivery, Error> {
    let service_journey = line_index
        .service_journey(service_journey_id)
        .ok_or_else(|| Error::ReferenceError(service_journey_id.to_owned()))?;

    let service_journey_references =
        ServiceJourneyReferences::resolve(service_journey, common_index, line_index)?;

    let source_composite_frame = line_index
        .composite_frames()
        .first()
        .ok_or(Error::MissingCompositeFrame)?;
    let mut delivery = delivery_from_source_frame(
        line_references.line.name(),
        source_composite_frame,
        publication_timestamp,
    );
    let codespace = codespace.to_uppercase();

    // resource frame

    let mut operators = vec![line_references.operator.clone()];
    if let Some(override_operator) = &service_journey_references.operator {
        if override_operator.id != line_references.operator.id {
            operators.push(override_operator.clone());
        }
    }
    delivery.composite_frame.frames.resource_frame = Some(ResourceFrame {
        id: format!("{codespace}:ResourceFrame:{DEFAULT_FRAME_ID}"),
        version: DEFAULT_FRAME_VERSION.to_owned(),
        operators,
        authorities: vec![line_references.authority.clone()],
        brandings: line_references.branding.clone().into_iter().collect(),
    });

    // service frame

    let source_service_frame = line_index
        .service_frames()
        .first()
        .ok_or(Error::MissingServiceFrame)?;
    delivery.composite_frame.frames.service_frame = Some(ServiceFrame {
        id: source_service_frame.id.clone(),
        version: source_service_frame.version.clone(),
        network: Some(line_references.network.clone()),
        lines: vec![line_references.line.clone()],
        routes: vec![route_references.route.clone()],
        journey_patterns: vec![journey_pattern_references.journey_pattern.clone()],
        scheduled_stop_points: journey_pattern_references.scheduled_stop_points.clone(),
        stop_assignments: journey_pattern_references.passenger_stop_assignments.clone(),
        route_points: route_references.route_points.clone(),
        ..ServiceFrame::default()
    });

    // timetable frame

    let dated_service_journeys = line_index
        .dated_service_journeys_for_service_journey(service_journey_id)
        .into_iter()
        .cloned()
        .collect();

    // interchanges legitimately reference journeys of other dataset versions;
    // pinning a version here would invalidate the output once the referenced
    // journey is republished
    let journey_interchanges: Vec<ServiceJourneyInterchange> = line_index
        .interchanges_for_service_journey(service_journey_id)
        .into_iter()
        .map(|interchange| {
            let mut interchange = interchange.clone();
            interchange.from_journey_ref = interchange.from_journey_ref.unversioned();
            interchange.to_journey_ref = interchange.to_journey_ref.unversioned();
            interchange
        })
        .collect();

    let notice_assignments: Vec<NoticeAssignment> = service_journey_references
        .notice_assignments
        .iter()
        .chain(journey_pattern_references.notice_assignments.iter())
        .cloned()
        .collect();

    delivery.composite_frame.frames.timetable_frame = Some(TimetableFrame {
        id: format!("{codespace}:TimetableFrame:{DEFAULT_FRAME_ID}"),
        version: DEFAULT_FRAME_VERSION.to_owned(),
        service_journeys: vec![service_journey_references.service_journey.clone()],
        dated_service_journeys,
        journey_interchanges,
        notice_assignments,
    });

    // service calendar frame; a journey published through dated service
    // journeys has no day types and may end up with operating days only
    let has_calendar = !service_journey_references.day_types.is_empty()
        || !service_journey_references.operating_periods.is_empty()
        || !service_journey_references.operating_days.is_empty();
    if has_calendar {
        let (day_types, day_type_assignments) = if service_journey_references.day_types.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                service_journey_references.day_types.clone(),
                service_journey_references.day_type_assignments.clone(),
            )
        };
        delivery.composite_frame.frames.service_calendar_frame = Some(ServiceCalendarFrame {
            id: format!("{codespace}:ServiceCalendarFrame:{DEFAULT_FRAME_ID}"),
            version: DEFAULT_FRAME_VERSION.to_owned(),
            day_types,
            day_type_assignments,
            operating_periods: service_journey_references.operating_periods.clone(),
            operating_days: service_journey_references.operating_days.clone(),
        });
    }

    Ok(delivery)
}
