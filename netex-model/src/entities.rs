use crate::serde_helpers::*;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Objects that have an identifier implement this trait
///
/// NeTEx identifiers are technical codespace-scoped strings such as
/// `RUT:ServiceJourney:1234` and should not be shown to travellers
pub trait Id {
    /// Identifier of the object
    fn id(&self) -> &str;
}

/// A reference to a versioned NeTEx entity.
///
/// The version is optional: references in a line file frequently omit it when
/// pointing at entities defined in the common file, and resolution writes the
/// version of the resolved entity back onto the reference so that the output
/// document is self-consistent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct VersionedRef {
    /// Identifier of the referenced entity
    #[serde(rename = "ref")]
    pub id: String,
    /// Version of the referenced entity, if pinned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl VersionedRef {
    /// An unversioned reference
    pub fn new(id: impl Into<String>) -> Self {
        VersionedRef {
            id: id.into(),
            version: None,
        }
    }

    /// A reference pinned to a specific version
    pub fn versioned(id: impl Into<String>, version: impl Into<String>) -> Self {
        VersionedRef {
            id: id.into(),
            version: Some(version.into()),
        }
    }

    /// Copy of this reference with its version replaced by the version of the
    /// entity it resolved to
    pub fn pinned_to(&self, version: &str) -> Self {
        VersionedRef {
            id: self.id.clone(),
            version: Some(version.to_owned()),
        }
    }

    /// Copy of this reference with the version removed
    pub fn unversioned(&self) -> Self {
        VersionedRef {
            id: self.id.clone(),
            version: None,
        }
    }
}

impl fmt::Display for VersionedRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} (version {})", self.id, v),
            None => write!(f, "{}", self.id),
        }
    }
}

/// XML namespace declaration for a data provider, carried on the composite frame
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Codespace {
    pub xmlns: String,
    pub xmlns_url: String,
}

/// Validity window attached to the composite frame of a dataset
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AvailabilityCondition {
    pub id: String,
    pub version: String,
    #[serde(
        deserialize_with = "deserialize_date_time",
        serialize_with = "serialize_date_time"
    )]
    pub from_date: NaiveDateTime,
    #[serde(
        default,
        deserialize_with = "deserialize_option_date_time",
        serialize_with = "serialize_option_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub to_date: Option<NaiveDateTime>,
}

/// Defaults applying to every frame nested in a composite frame
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FrameDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_codespace_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_timezone: Option<String>,
}

/// Identity and versioning metadata of the outermost container of a dataset
/// document. The assembler copies these fields verbatim into its output
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompositeFrame {
    pub id: String,
    pub version: String,
    /// Creation timestamp of the frame. The latest creation timestamp across
    /// every frame in a dataset identifies the dataset version
    #[serde(
        deserialize_with = "deserialize_date_time",
        serialize_with = "serialize_date_time"
    )]
    pub created: NaiveDateTime,
    pub codespaces: Vec<Codespace>,
    pub validity_conditions: Vec<AvailabilityCondition>,
    pub frame_defaults: FrameDefaults,
}

impl Id for CompositeFrame {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Identity of a service frame in the source line file, copied into the output
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceFrameInfo {
    pub id: String,
    pub version: String,
}

/// Transit authority responsible for a network
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Authority {
    pub id: String,
    pub version: String,
    pub name: String,
}

/// Company operating service journeys
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: String,
    pub version: String,
    pub name: String,
    /// Optional commercial branding of the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding_ref: Option<VersionedRef>,
}

/// Commercial brand under which lines are marketed
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Branding {
    pub id: String,
    pub version: String,
    pub name: String,
}

/// Named group of lines nested inside a network
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GroupOfLines {
    pub id: String,
    pub version: String,
    pub name: String,
}

/// Network grouping the lines of an authority.
///
/// A line's representation reference may point at the network directly or at
/// one of its nested groups of lines
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub version: String,
    pub name: String,
    /// The authority responsible for this network
    pub transport_organisation_ref: VersionedRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups_of_lines: Vec<GroupOfLines>,
}

/// A transit line with a fixed route
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Line {
    pub id: String,
    pub version: String,
    pub name: String,
    /// Short code identifying the line for riders, like "31" or "F1"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_code: Option<String>,
    pub operator_ref: VersionedRef,
    /// Points either at a network or at a group of lines nested in a network
    pub represented_by_group_ref: VersionedRef,
}

/// A demand-responsive transit line (flexible booking, no fixed stops)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FlexibleLine {
    pub id: String,
    pub version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_code: Option<String>,
    pub operator_ref: VersionedRef,
    pub represented_by_group_ref: VersionedRef,
}

/// Geographic point a route passes through
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoutePoint {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

/// One step in the ordered point sequence of a route
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PointOnRoute {
    pub id: String,
    pub order: u32,
    pub point_ref: VersionedRef,
}

/// Ordered sequence of route points a line follows in one direction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub version: String,
    pub name: String,
    pub line_ref: VersionedRef,
    pub points_in_sequence: Vec<PointOnRoute>,
}

/// Logical stop place referenced by journey patterns, mapped to a physical
/// quay through a passenger stop assignment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScheduledStopPoint {
    pub id: String,
    pub version: String,
    pub name: String,
}

/// Binds a scheduled stop point to the physical quay where passengers board
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PassengerStopAssignment {
    pub id: String,
    pub version: String,
    pub order: u32,
    pub scheduled_stop_point_ref: VersionedRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quay_ref: Option<VersionedRef>,
}

/// One stop in the ordered stop sequence of a journey pattern
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StopPointInJourneyPattern {
    pub id: String,
    pub version: String,
    pub order: u32,
    pub scheduled_stop_point_ref: VersionedRef,
}

/// The ordered sequence of stop points a family of service journeys follows
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JourneyPattern {
    pub id: String,
    pub version: String,
    pub route_ref: VersionedRef,
    pub points_in_sequence: Vec<StopPointInJourneyPattern>,
}

/// Arrival/departure times of a service journey at one stop point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TimetabledPassingTime {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
}

/// One scheduled trip: passing times plus a calendar reference.
///
/// The unit of publication granularity: each service journey is re-published
/// as its own self-contained document
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceJourney {
    pub id: String,
    pub version: String,
    pub journey_pattern_ref: VersionedRef,
    /// Operator override; when absent the line operator applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator_ref: Option<VersionedRef>,
    /// Day types defining the running dates. Journeys published through dated
    /// service journeys carry no day types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_type_refs: Option<Vec<VersionedRef>>,
    pub passing_times: Vec<TimetabledPassingTime>,
}

/// Calendar primitive naming a class of running days ("weekdays", "saturday")
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayType {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Binds a day type to a concrete date, operating day or operating period.
/// An assignment carries at most one of the operating-day / operating-period
/// references
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayTypeAssignment {
    pub id: String,
    pub version: String,
    pub day_type_ref: VersionedRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_day_ref: Option<VersionedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_period_ref: Option<VersionedRef>,
    #[serde(
        default,
        deserialize_with = "deserialize_option_date",
        serialize_with = "serialize_option_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
}

/// A single calendar date a service may run on
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OperatingDay {
    pub id: String,
    pub version: String,
    #[serde(
        deserialize_with = "deserialize_date",
        serialize_with = "serialize_date"
    )]
    pub calendar_date: NaiveDate,
}

/// A contiguous range of calendar dates a service may run on
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OperatingPeriod {
    pub id: String,
    pub version: String,
    #[serde(
        deserialize_with = "deserialize_date",
        serialize_with = "serialize_date"
    )]
    pub from_date: NaiveDate,
    #[serde(
        deserialize_with = "deserialize_date",
        serialize_with = "serialize_date"
    )]
    pub to_date: NaiveDate,
}

/// Binds a service journey directly to one operating day, the alternative
/// calendar mechanism to day types
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DatedServiceJourney {
    pub id: String,
    pub version: String,
    pub service_journey_ref: VersionedRef,
    pub operating_day_ref: VersionedRef,
}

/// Planned transfer between two service journeys.
///
/// Interchanges legitimately cross dataset-version boundaries: the referenced
/// journeys may be republished independently, so the assembler clears the
/// endpoint reference versions in its output
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceJourneyInterchange {
    pub id: String,
    pub version: String,
    pub from_journey_ref: VersionedRef,
    pub to_journey_ref: VersionedRef,
    pub from_point_ref: VersionedRef,
    pub to_point_ref: VersionedRef,
}

/// Rider-facing text attached to journeys, patterns or stop points
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: String,
    pub version: String,
    pub text: String,
}

/// Binds a notice to the object it annotates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NoticeAssignment {
    pub id: String,
    pub version: String,
    pub notice_ref: VersionedRef,
    pub noticed_object_ref: VersionedRef,
}

/// Text shown on vehicle signage identifying the destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DestinationDisplay {
    pub id: String,
    pub version: String,
    pub front_text: String,
}

/// Track geometry between two route points
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceLink {
    pub id: String,
    pub version: String,
    pub from_point_ref: VersionedRef,
    pub to_point_ref: VersionedRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

macro_rules! impl_id {
    ($($t:ty),* $(,)?) => {
        $(impl Id for $t {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_id!(
    Authority,
    Operator,
    Branding,
    GroupOfLines,
    Network,
    Line,
    FlexibleLine,
    RoutePoint,
    Route,
    ScheduledStopPoint,
    PassengerStopAssignment,
    StopPointInJourneyPattern,
    JourneyPattern,
    ServiceJourney,
    DayType,
    DayTypeAssignment,
    OperatingDay,
    OperatingPeriod,
    DatedServiceJourney,
    ServiceJourneyInterchange,
    Notice,
    NoticeAssignment,
    DestinationDisplay,
    ServiceLink,
);
