use crate::error::Error;
use crate::journey_pattern_references::JourneyPatternReferences;
use crate::line_references::{AnyLine, LineReferences};
use crate::publication::{build_service_journey_delivery, PublicationDelivery};
use crate::publisher::{
    publish_common_file, publish_dataset, publish_line, DeliverySink, JsonLinesSink,
};
use crate::route_references::RouteReferences;
use crate::service_journey_references::ServiceJourneyReferences;
use crate::InMemoryImportEventRepository;
use chrono::{NaiveDate, NaiveDateTime};
use netex_model::*;
use rustc_hash::FxHashSet;

const CODESPACE: &str = "tst";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn date_time(second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 4, 5)
        .unwrap()
        .and_hms_opt(6, 7, second)
        .unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, day).unwrap()
}

fn composite_frame(id: &str, created: NaiveDateTime) -> CompositeFrame {
    CompositeFrame {
        id: id.to_owned(),
        version: "2".to_owned(),
        created,
        codespaces: vec![Codespace {
            xmlns: "TST".to_owned(),
            xmlns_url: "http://www.rutebanken.org/ns/tst".to_owned(),
        }],
        validity_conditions: vec![AvailabilityCondition {
            id: "TST:AvailabilityCondition:1".to_owned(),
            version: "1".to_owned(),
            from_date: created,
            to_date: None,
        }],
        frame_defaults: FrameDefaults {
            default_codespace_ref: Some("TST".to_owned()),
            default_timezone: Some("Europe/Oslo".to_owned()),
        },
    }
}

fn common_index() -> NetexEntitiesIndex {
    let mut index = NetexEntitiesIndex::new();
    index.add_composite_frame(composite_frame("TST:CompositeFrame:1", date_time(8)));

    index.add_operator(Operator {
        id: "TST:Operator:1".to_owned(),
        version: "2".to_owned(),
        name: "Sporveien".to_owned(),
        branding_ref: Some(VersionedRef::new("TST:Branding:1")),
    });
    index.add_operator(Operator {
        id: "TST:Operator:2".to_owned(),
        version: "7".to_owned(),
        name: "Unibuss".to_owned(),
        branding_ref: None,
    });
    index.add_authority(Authority {
        id: "TST:Authority:1".to_owned(),
        version: "3".to_owned(),
        name: "Ruter".to_owned(),
    });
    index.add_branding(Branding {
        id: "TST:Branding:1".to_owned(),
        version: "9".to_owned(),
        name: "T-bane".to_owned(),
    });
    index.add_network(Network {
        id: "TST:Network:1".to_owned(),
        version: "4".to_owned(),
        name: "Oslo".to_owned(),
        transport_organisation_ref: VersionedRef::new("TST:Authority:1"),
        groups_of_lines: vec![GroupOfLines {
            id: "TST:GroupOfLines:1".to_owned(),
            version: "1".to_owned(),
            name: "Metro".to_owned(),
        }],
    });

    index.add_route_point(RoutePoint {
        id: "TST:RoutePoint:1".to_owned(),
        version: "5".to_owned(),
        longitude: Some(10.71),
        latitude: Some(59.93),
    });
    index.add_route_point(RoutePoint {
        id: "TST:RoutePoint:2".to_owned(),
        version: "6".to_owned(),
        longitude: Some(10.77),
        latitude: Some(59.91),
    });

    index.add_scheduled_stop_point(ScheduledStopPoint {
        id: "TST:ScheduledStopPoint:1".to_owned(),
        version: "8".to_owned(),
        name: "Majorstuen".to_owned(),
    });
    index.add_scheduled_stop_point(ScheduledStopPoint {
        id: "TST:ScheduledStopPoint:2".to_owned(),
        version: "9".to_owned(),
        name: "Tøyen".to_owned(),
    });
    index.add_passenger_stop_assignment(PassengerStopAssignment {
        id: "TST:PassengerStopAssignment:1".to_owned(),
        version: "1".to_owned(),
        order: 1,
        scheduled_stop_point_ref: VersionedRef::new("TST:ScheduledStopPoint:1"),
        quay_ref: Some(VersionedRef::versioned("NSR:Quay:101", "1")),
    });
    index.add_passenger_stop_assignment(PassengerStopAssignment {
        id: "TST:PassengerStopAssignment:2".to_owned(),
        version: "1".to_owned(),
        order: 2,
        scheduled_stop_point_ref: VersionedRef::new("TST:ScheduledStopPoint:2"),
        quay_ref: Some(VersionedRef::versioned("NSR:Quay:102", "1")),
    });

    index.add_day_type(DayType {
        id: "TST:DayType:1".to_owned(),
        version: "10".to_owned(),
        name: Some("Weekdays".to_owned()),
    });
    index.add_day_type_assignment(DayTypeAssignment {
        id: "TST:DayTypeAssignment:1".to_owned(),
        version: "1".to_owned(),
        day_type_ref: VersionedRef::new("TST:DayType:1"),
        operating_day_ref: None,
        operating_period_ref: Some(VersionedRef::new("TST:OperatingPeriod:1")),
        date: None,
    });
    index.add_day_type_assignment(DayTypeAssignment {
        id: "TST:DayTypeAssignment:2".to_owned(),
        version: "1".to_owned(),
        day_type_ref: VersionedRef::new("TST:DayType:1"),
        operating_day_ref: Some(VersionedRef::new("TST:OperatingDay:1")),
        operating_period_ref: None,
        date: None,
    });
    index.add_operating_day(OperatingDay {
        id: "TST:OperatingDay:1".to_owned(),
        version: "11".to_owned(),
        calendar_date: date(1),
    });
    index.add_operating_day(OperatingDay {
        id: "TST:OperatingDay:2".to_owned(),
        version: "12".to_owned(),
        calendar_date: date(2),
    });
    index.add_operating_period(OperatingPeriod {
        id: "TST:OperatingPeriod:1".to_owned(),
        version: "13".to_owned(),
        from_date: date(1),
        to_date: date(30),
    });

    index.add_notice(Notice {
        id: "TST:Notice:100".to_owned(),
        version: "1".to_owned(),
        text: "Night services only run on weekends".to_owned(),
    });
    index.add_destination_display(DestinationDisplay {
        id: "TST:DestinationDisplay:1".to_owned(),
        version: "1".to_owned(),
        front_text: "Tøyen".to_owned(),
    });
    for n in 1..=3 {
        index.add_service_link(ServiceLink {
            id: format!("TST:ServiceLink:{n}"),
            version: "1".to_owned(),
            from_point_ref: VersionedRef::versioned("TST:ScheduledStopPoint:1", "8"),
            to_point_ref: VersionedRef::versioned("TST:ScheduledStopPoint:2", "9"),
            distance: Some(2300.0),
        });
    }

    index
}

fn line(id: &str) -> Line {
    Line {
        id: id.to_owned(),
        version: "1".to_owned(),
        name: "Majorstuen-Tøyen".to_owned(),
        public_code: Some("4".to_owned()),
        operator_ref: VersionedRef::new("TST:Operator:1"),
        represented_by_group_ref: VersionedRef::new("TST:GroupOfLines:1"),
    }
}

fn flexible_line(id: &str) -> FlexibleLine {
    FlexibleLine {
        id: id.to_owned(),
        version: "1".to_owned(),
        name: "Flex Vestby".to_owned(),
        public_code: None,
        operator_ref: VersionedRef::new("TST:Operator:1"),
        represented_by_group_ref: VersionedRef::new("TST:Network:1"),
    }
}

fn passing_time(id: &str, departure: &str) -> TimetabledPassingTime {
    TimetabledPassingTime {
        id: id.to_owned(),
        arrival_time: None,
        departure_time: Some(departure.to_owned()),
    }
}

fn notice_assignment(id: &str, noticed_object: &str) -> NoticeAssignment {
    NoticeAssignment {
        id: id.to_owned(),
        version: "1".to_owned(),
        notice_ref: VersionedRef::new("TST:Notice:100"),
        noticed_object_ref: VersionedRef::new(noticed_object),
    }
}

/// One line, one route, one journey pattern and two service journeys: one on
/// day types, one dated with an operator override.
fn line_index() -> NetexEntitiesIndex {
    let mut index = NetexEntitiesIndex::new();
    index.add_composite_frame(composite_frame("TST:CompositeFrame:99", date_time(9)));
    index.add_service_frame(ServiceFrameInfo {
        id: "TST:ServiceFrame:42".to_owned(),
        version: "2".to_owned(),
    });

    index.add_line(line("TST:Line:1"));
    index.add_route(Route {
        id: "TST:Route:1".to_owned(),
        version: "1".to_owned(),
        name: "Majorstuen-Tøyen-Majorstuen".to_owned(),
        line_ref: VersionedRef::new("TST:Line:1"),
        points_in_sequence: vec![
            PointOnRoute {
                id: "TST:PointOnRoute:1".to_owned(),
                order: 1,
                point_ref: VersionedRef::new("TST:RoutePoint:1"),
            },
            PointOnRoute {
                id: "TST:PointOnRoute:2".to_owned(),
                order: 2,
                point_ref: VersionedRef::new("TST:RoutePoint:2"),
            },
            // the route returns to its starting point
            PointOnRoute {
                id: "TST:PointOnRoute:3".to_owned(),
                order: 3,
                point_ref: VersionedRef::new("TST:RoutePoint:1"),
            },
        ],
    });
    index.add_journey_pattern(JourneyPattern {
        id: "TST:JourneyPattern:1".to_owned(),
        version: "1".to_owned(),
        route_ref: VersionedRef::new("TST:Route:1"),
        points_in_sequence: vec![
            StopPointInJourneyPattern {
                id: "TST:StopPointInJourneyPattern:1".to_owned(),
                version: "1".to_owned(),
                order: 1,
                scheduled_stop_point_ref: VersionedRef::new("TST:ScheduledStopPoint:1"),
            },
            StopPointInJourneyPattern {
                id: "TST:StopPointInJourneyPattern:2".to_owned(),
                version: "1".to_owned(),
                order: 2,
                scheduled_stop_point_ref: VersionedRef::new("TST:ScheduledStopPoint:2"),
            },
        ],
    });

    index.add_service_journey(ServiceJourney {
        id: "TST:ServiceJourney:1".to_owned(),
        version: "1".to_owned(),
        journey_pattern_ref: VersionedRef::new("TST:JourneyPattern:1"),
        operator_ref: None,
        // the same day type referenced twice must be collected once
        day_type_refs: Some(vec![
            VersionedRef::new("TST:DayType:1"),
            VersionedRef::new("TST:DayType:1"),
        ]),
        passing_times: vec![
            passing_time("TST:TimetabledPassingTime:1", "07:00:00"),
            passing_time("TST:TimetabledPassingTime:2", "07:04:00"),
        ],
    });
    index.add_service_journey(ServiceJourney {
        id: "TST:ServiceJourney:2".to_owned(),
        version: "1".to_owned(),
        journey_pattern_ref: VersionedRef::new("TST:JourneyPattern:1"),
        operator_ref: Some(VersionedRef::new("TST:Operator:2")),
        day_type_refs: None,
        passing_times: vec![passing_time("TST:TimetabledPassingTime:3", "23:30:00")],
    });
    index.add_dated_service_journey(DatedServiceJourney {
        id: "TST:DatedServiceJourney:1".to_owned(),
        version: "1".to_owned(),
        service_journey_ref: VersionedRef::new("TST:ServiceJourney:2"),
        operating_day_ref: VersionedRef::new("TST:OperatingDay:2"),
    });

    index.add_service_journey_interchange(ServiceJourneyInterchange {
        id: "TST:ServiceJourneyInterchange:1".to_owned(),
        version: "1".to_owned(),
        from_journey_ref: VersionedRef::versioned("TST:ServiceJourney:1", "1"),
        to_journey_ref: VersionedRef::versioned("OTH:ServiceJourney:77", "12"),
        from_point_ref: VersionedRef::new("TST:ScheduledStopPoint:2"),
        to_point_ref: VersionedRef::new("OTH:ScheduledStopPoint:8"),
    });

    index.add_notice_assignment(notice_assignment(
        "TST:NoticeAssignment:1",
        "TST:ServiceJourney:1",
    ));
    index.add_notice_assignment(notice_assignment(
        "TST:NoticeAssignment:2",
        "TST:JourneyPattern:1",
    ));
    index.add_notice_assignment(notice_assignment(
        "TST:NoticeAssignment:3",
        "TST:StopPointInJourneyPattern:2",
    ));
    index.add_notice_assignment(notice_assignment(
        "TST:NoticeAssignment:4",
        "TST:TimetabledPassingTime:2",
    ));

    index
}

fn assemble(
    common: &NetexEntitiesIndex,
    line: &NetexEntitiesIndex,
    service_journey_id: &str,
) -> PublicationDelivery {
    let line_references = LineReferences::resolve(line, common).unwrap();
    let route_references =
        RouteReferences::resolve(line.routes().next().unwrap(), common).unwrap();
    let journey_pattern_references =
        JourneyPatternReferences::resolve(line.journey_patterns().next().unwrap(), common, line)
            .unwrap();
    build_service_journey_delivery(
        CODESPACE,
        common,
        line,
        service_journey_id,
        &line_references,
        &route_references,
        &journey_pattern_references,
        date_time(30),
    )
    .unwrap()
}

#[derive(Default)]
struct RecordingSink {
    deliveries: Vec<PublicationDelivery>,
    /// Service link id whose chunk the sink rejects as oversized
    oversized_link: Option<String>,
}

impl DeliverySink for RecordingSink {
    fn deliver(&mut self, delivery: &PublicationDelivery) -> anyhow::Result<()> {
        if let (Some(oversized), Some(service_frame)) = (
            &self.oversized_link,
            &delivery.composite_frame.frames.service_frame,
        ) {
            if service_frame.service_links.iter().any(|l| &l.id == oversized) {
                return Err(anyhow::Error::new(Error::RecordTooLarge {
                    part: oversized.clone(),
                }));
            }
        }
        self.deliveries.push(delivery.clone());
        Ok(())
    }
}

#[test]
fn test_corrected_references_agree_with_resolved_versions() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:1");
    let frames = &delivery.composite_frame.frames;
    let service_frame = frames.service_frame.as_ref().unwrap();

    let published_line = match &service_frame.lines[0] {
        AnyLine::Line(line) => line,
        AnyLine::FlexibleLine(_) => panic!("expected a line"),
    };
    assert_eq!(Some("2"), published_line.operator_ref.version.as_deref());
    assert_eq!(
        Some("4"),
        published_line.represented_by_group_ref.version.as_deref()
    );

    let route = &service_frame.routes[0];
    let point_versions: Vec<_> = route
        .points_in_sequence
        .iter()
        .map(|p| p.point_ref.version.as_deref())
        .collect();
    assert_eq!(vec![Some("5"), Some("6"), Some("5")], point_versions);

    let journey_pattern = &service_frame.journey_patterns[0];
    let stop_versions: Vec<_> = journey_pattern
        .points_in_sequence
        .iter()
        .map(|p| p.scheduled_stop_point_ref.version.as_deref())
        .collect();
    assert_eq!(vec![Some("8"), Some("9")], stop_versions);

    let timetable_frame = frames.timetable_frame.as_ref().unwrap();
    let service_journey = &timetable_frame.service_journeys[0];
    for day_type_ref in service_journey.day_type_refs.as_ref().unwrap() {
        assert_eq!(Some("10"), day_type_ref.version.as_deref());
    }
}

#[test]
fn test_delivery_is_self_contained() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:1");
    let frames = &delivery.composite_frame.frames;
    let resource_frame = frames.resource_frame.as_ref().unwrap();
    let service_frame = frames.service_frame.as_ref().unwrap();
    let timetable_frame = frames.timetable_frame.as_ref().unwrap();
    let calendar_frame = frames.service_calendar_frame.as_ref().unwrap();

    let mut defined: FxHashSet<&str> = FxHashSet::default();
    defined.extend(resource_frame.operators.iter().map(|o| o.id.as_str()));
    defined.extend(resource_frame.authorities.iter().map(|a| a.id.as_str()));
    defined.extend(resource_frame.brandings.iter().map(|b| b.id.as_str()));
    let network = service_frame.network.as_ref().unwrap();
    defined.insert(&network.id);
    defined.extend(network.groups_of_lines.iter().map(|g| g.id.as_str()));
    defined.extend(service_frame.lines.iter().map(|l| l.id()));
    defined.extend(service_frame.routes.iter().map(|r| r.id.as_str()));
    defined.extend(service_frame.journey_patterns.iter().map(|jp| jp.id.as_str()));
    defined.extend(
        service_frame
            .scheduled_stop_points
            .iter()
            .map(|sp| sp.id.as_str()),
    );
    defined.extend(service_frame.route_points.iter().map(|rp| rp.id.as_str()));
    defined.extend(
        timetable_frame
            .service_journeys
            .iter()
            .map(|sj| sj.id.as_str()),
    );
    defined.extend(calendar_frame.day_types.iter().map(|dt| dt.id.as_str()));
    defined.extend(calendar_frame.operating_days.iter().map(|od| od.id.as_str()));
    defined.extend(
        calendar_frame
            .operating_periods
            .iter()
            .map(|op| op.id.as_str()),
    );

    let mut referenced: Vec<&str> = Vec::new();
    for any_line in &service_frame.lines {
        referenced.push(&any_line.operator_ref().id);
        referenced.push(&any_line.represented_by_group_ref().id);
    }
    referenced.push(&network.transport_organisation_ref.id);
    for route in &service_frame.routes {
        referenced.push(&route.line_ref.id);
        referenced.extend(route.points_in_sequence.iter().map(|p| p.point_ref.id.as_str()));
    }
    for journey_pattern in &service_frame.journey_patterns {
        referenced.push(&journey_pattern.route_ref.id);
        referenced.extend(
            journey_pattern
                .points_in_sequence
                .iter()
                .map(|p| p.scheduled_stop_point_ref.id.as_str()),
        );
    }
    for assignment in &service_frame.stop_assignments {
        referenced.push(&assignment.scheduled_stop_point_ref.id);
    }
    for service_journey in &timetable_frame.service_journeys {
        referenced.push(&service_journey.journey_pattern_ref.id);
        if let Some(day_type_refs) = &service_journey.day_type_refs {
            referenced.extend(day_type_refs.iter().map(|r| r.id.as_str()));
        }
    }
    for assignment in &calendar_frame.day_type_assignments {
        referenced.push(&assignment.day_type_ref.id);
        if let Some(r) = &assignment.operating_day_ref {
            referenced.push(&r.id);
        }
        if let Some(r) = &assignment.operating_period_ref {
            referenced.push(&r.id);
        }
    }

    for id in referenced {
        assert!(defined.contains(id), "dangling reference to {id}");
    }
}

#[test]
fn test_circular_route_points_collected_once_in_visit_order() {
    let common = common_index();
    let line = line_index();
    let references = RouteReferences::resolve(line.routes().next().unwrap(), &common).unwrap();
    let ids: Vec<_> = references.route_points.iter().map(|rp| rp.id.as_str()).collect();
    assert_eq!(vec!["TST:RoutePoint:1", "TST:RoutePoint:2"], ids);
}

#[test]
fn test_notice_assignments_cover_journey_pattern_and_passing_times() {
    let common = common_index();
    let line = line_index();

    let journey_pattern_references =
        JourneyPatternReferences::resolve(line.journey_patterns().next().unwrap(), &common, &line)
            .unwrap();
    let jp_ids: Vec<_> = journey_pattern_references
        .notice_assignments
        .iter()
        .map(|na| na.id.as_str())
        .collect();
    assert_eq!(
        vec!["TST:NoticeAssignment:2", "TST:NoticeAssignment:3"],
        jp_ids
    );

    let delivery = assemble(&common, &line, "TST:ServiceJourney:1");
    let timetable_frame = delivery
        .composite_frame
        .frames
        .timetable_frame
        .as_ref()
        .unwrap();
    let ids: Vec<_> = timetable_frame
        .notice_assignments
        .iter()
        .map(|na| na.id.as_str())
        .collect();
    // journey-level assignments first, then the pattern-level ones
    assert_eq!(
        vec![
            "TST:NoticeAssignment:1",
            "TST:NoticeAssignment:4",
            "TST:NoticeAssignment:2",
            "TST:NoticeAssignment:3",
        ],
        ids
    );
}

#[test]
fn test_interchange_endpoint_versions_cleared() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:1");
    let timetable_frame = delivery
        .composite_frame
        .frames
        .timetable_frame
        .as_ref()
        .unwrap();

    assert_eq!(1, timetable_frame.journey_interchanges.len());
    let interchange = &timetable_frame.journey_interchanges[0];
    assert_eq!(None, interchange.from_journey_ref.version);
    assert_eq!(None, interchange.to_journey_ref.version);
}

#[test]
fn test_dated_service_journey_gets_operating_days_without_day_types() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:2");
    let frames = &delivery.composite_frame.frames;

    let calendar_frame = frames.service_calendar_frame.as_ref().unwrap();
    assert!(calendar_frame.day_types.is_empty());
    assert!(calendar_frame.day_type_assignments.is_empty());
    assert!(calendar_frame.operating_periods.is_empty());
    let days: Vec<_> = calendar_frame
        .operating_days
        .iter()
        .map(|od| od.id.as_str())
        .collect();
    assert_eq!(vec!["TST:OperatingDay:2"], days);

    let timetable_frame = frames.timetable_frame.as_ref().unwrap();
    assert_eq!(1, timetable_frame.dated_service_journeys.len());
    assert_eq!(
        "TST:DatedServiceJourney:1",
        timetable_frame.dated_service_journeys[0].id
    );
}

#[test]
fn test_operator_override_joins_resource_frame() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:2");
    let frames = &delivery.composite_frame.frames;

    let operators: Vec<_> = frames
        .resource_frame
        .as_ref()
        .unwrap()
        .operators
        .iter()
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(vec!["TST:Operator:1", "TST:Operator:2"], operators);

    let service_journey = &frames.timetable_frame.as_ref().unwrap().service_journeys[0];
    assert_eq!(
        Some("7"),
        service_journey
            .operator_ref
            .as_ref()
            .unwrap()
            .version
            .as_deref()
    );
}

#[test]
fn test_operator_override_equal_to_line_operator_not_duplicated() {
    let common = common_index();
    let mut line = line_index();
    line.add_service_journey(ServiceJourney {
        id: "TST:ServiceJourney:3".to_owned(),
        version: "1".to_owned(),
        journey_pattern_ref: VersionedRef::new("TST:JourneyPattern:1"),
        operator_ref: Some(VersionedRef::new("TST:Operator:1")),
        day_type_refs: None,
        passing_times: vec![passing_time("TST:TimetabledPassingTime:4", "08:00:00")],
    });

    let delivery = assemble(&common, &line, "TST:ServiceJourney:3");
    let resource_frame = delivery
        .composite_frame
        .frames
        .resource_frame
        .as_ref()
        .unwrap();
    assert_eq!(1, resource_frame.operators.len());
}

#[test]
fn test_journey_without_calendar_has_no_calendar_frame() {
    let common = common_index();
    let mut line = line_index();
    line.add_service_journey(ServiceJourney {
        id: "TST:ServiceJourney:4".to_owned(),
        version: "1".to_owned(),
        journey_pattern_ref: VersionedRef::new("TST:JourneyPattern:1"),
        operator_ref: None,
        day_type_refs: None,
        passing_times: vec![passing_time("TST:TimetabledPassingTime:5", "09:00:00")],
    });

    let delivery = assemble(&common, &line, "TST:ServiceJourney:4");
    assert!(delivery
        .composite_frame
        .frames
        .service_calendar_frame
        .is_none());
}

#[test]
fn test_unknown_operator_override_is_fatal() {
    let common = common_index();
    let mut service_journey = line_index().service_journey("TST:ServiceJourney:2").unwrap().clone();
    service_journey.operator_ref = Some(VersionedRef::new("TST:Operator:404"));

    let line = line_index();
    let error =
        ServiceJourneyReferences::resolve(&service_journey, &common, &line).unwrap_err();
    assert!(matches!(
        error,
        Error::UnknownOperator { operator, service_journey }
            if operator == "TST:Operator:404" && service_journey == "TST:ServiceJourney:2"
    ));
}

#[test]
fn test_line_cardinality() {
    let common = common_index();

    let empty = NetexEntitiesIndex::new();
    assert!(matches!(
        LineReferences::resolve(&empty, &common),
        Err(Error::NoLine)
    ));

    let mut two_lines = NetexEntitiesIndex::new();
    two_lines.add_line(line("TST:Line:1"));
    two_lines.add_line(line("TST:Line:2"));
    assert!(matches!(
        LineReferences::resolve(&two_lines, &common),
        Err(Error::MultipleLines)
    ));

    let mut two_flexible = NetexEntitiesIndex::new();
    two_flexible.add_flexible_line(flexible_line("TST:FlexibleLine:1"));
    two_flexible.add_flexible_line(flexible_line("TST:FlexibleLine:2"));
    assert!(matches!(
        LineReferences::resolve(&two_flexible, &common),
        Err(Error::MultipleFlexibleLines)
    ));

    let mut both = NetexEntitiesIndex::new();
    both.add_line(line("TST:Line:1"));
    both.add_flexible_line(flexible_line("TST:FlexibleLine:1"));
    assert!(matches!(
        LineReferences::resolve(&both, &common),
        Err(Error::BothLineAndFlexibleLine)
    ));
}

#[test]
fn test_network_reachable_directly_or_through_group() {
    let common = common_index();

    // through the group of lines, as in the shared fixture
    let through_group = LineReferences::resolve(&line_index(), &common).unwrap();
    assert_eq!("TST:Network:1", through_group.network.id);
    assert_eq!("TST:Authority:1", through_group.authority.id);
    assert_eq!(
        Some("TST:Branding:1"),
        through_group.branding.as_ref().map(|b| b.id.as_str())
    );

    // directly
    let mut direct = NetexEntitiesIndex::new();
    let mut directly_represented = line("TST:Line:1");
    directly_represented.represented_by_group_ref = VersionedRef::new("TST:Network:1");
    direct.add_line(directly_represented);
    assert_eq!(
        "TST:Network:1",
        LineReferences::resolve(&direct, &common).unwrap().network.id
    );

    // not at all
    let mut dangling = NetexEntitiesIndex::new();
    let mut unrepresented = line("TST:Line:1");
    unrepresented.represented_by_group_ref = VersionedRef::new("TST:GroupOfLines:404");
    dangling.add_line(unrepresented);
    assert!(matches!(
        LineReferences::resolve(&dangling, &common),
        Err(Error::NetworkNotFound(id)) if id == "TST:GroupOfLines:404"
    ));
}

#[test]
fn test_publish_line_delivers_one_document_per_service_journey() {
    init_logging();
    let common = common_index();
    let line = line_index();
    let mut sink = RecordingSink::default();

    let nb = publish_line(CODESPACE, &common, &line, date_time(30), &mut sink).unwrap();
    assert_eq!(2, nb);
    assert_eq!(2, sink.deliveries.len());
    for delivery in &sink.deliveries {
        assert_eq!("Majorstuen-Tøyen", delivery.description);
        assert_eq!("TST:CompositeFrame:99", delivery.composite_frame.id);
        let service_frame = delivery
            .composite_frame
            .frames
            .service_frame
            .as_ref()
            .unwrap();
        assert_eq!("TST:ServiceFrame:42", service_frame.id);
    }
}

#[test]
fn test_publish_common_file_chunks_service_links() {
    let common = common_index();
    let mut sink = RecordingSink::default();

    // 3 service links with a range size of 2: a full chunk and a partial one
    let nb = publish_common_file(CODESPACE, &common, 2, date_time(30), &mut sink).unwrap();
    assert_eq!(3, nb);

    let notices_delivery = &sink.deliveries[0];
    assert_eq!("Notices and Destination Displays", notices_delivery.description);
    assert_eq!("TST:CompositeFrame:1", notices_delivery.composite_frame.id);
    let service_frame = notices_delivery
        .composite_frame
        .frames
        .service_frame
        .as_ref()
        .unwrap();
    assert_eq!("TST:ServiceFrame:1", service_frame.id);
    assert_eq!(1, service_frame.notices.len());
    assert_eq!(1, service_frame.destination_displays.len());

    let chunk_sizes: Vec<usize> = sink.deliveries[1..]
        .iter()
        .map(|delivery| {
            let service_frame = delivery
                .composite_frame
                .frames
                .service_frame
                .as_ref()
                .unwrap();
            assert_eq!("Service Links", delivery.description);
            for link in &service_frame.service_links {
                assert_eq!(None, link.from_point_ref.version);
                assert_eq!(None, link.to_point_ref.version);
            }
            service_frame.service_links.len()
        })
        .collect();
    assert_eq!(vec![2, 1], chunk_sizes);
}

#[test]
fn test_oversized_chunk_skipped_siblings_published() {
    let common = common_index();
    let mut sink = RecordingSink {
        oversized_link: Some("TST:ServiceLink:1".to_owned()),
        ..RecordingSink::default()
    };

    let nb = publish_common_file(CODESPACE, &common, 2, date_time(30), &mut sink).unwrap();
    // the first service-link chunk is rejected, the notices delivery and the
    // second chunk still go out
    assert_eq!(2, nb);
    assert_eq!(2, sink.deliveries.len());
    let last_frame = sink.deliveries[1]
        .composite_frame
        .frames
        .service_frame
        .as_ref()
        .unwrap();
    assert_eq!(1, last_frame.service_links.len());
    assert_eq!("TST:ServiceLink:3", last_frame.service_links[0].id);
}

#[test]
fn test_json_lines_sink_round_trips_and_bounds_record_size() {
    let common = common_index();
    let line = line_index();
    let delivery = assemble(&common, &line, "TST:ServiceJourney:1");

    let mut buffer = Vec::new();
    JsonLinesSink::new(&mut buffer).deliver(&delivery).unwrap();
    let parsed: PublicationDelivery = serde_json::from_slice(&buffer).unwrap();
    assert_eq!(delivery.description, parsed.description);
    assert_eq!(delivery.composite_frame.id, parsed.composite_frame.id);
    assert_eq!(
        delivery.publication_timestamp,
        parsed.publication_timestamp
    );

    let mut bounded = JsonLinesSink::with_max_record_size(Vec::new(), 10);
    let error = bounded.deliver(&delivery).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<Error>(),
        Some(Error::RecordTooLarge { .. })
    ));
}

#[test]
fn test_publish_dataset_once_per_dataset_version() {
    init_logging();
    let common = common_index();
    let lines = vec![line_index()];
    let repository = InMemoryImportEventRepository::new();
    let mut sink = RecordingSink::default();

    let notification = publish_dataset(
        CODESPACE,
        "datasets/tst-netex.zip",
        &common,
        &lines,
        2,
        date_time(30),
        &repository,
        &mut sink,
    )
    .unwrap()
    .expect("first import publishes");

    // the line file's composite frame is the most recent one
    assert_eq!("TST_2023-04-05T06_07_09", notification.import_key);
    assert_eq!("TST", notification.codespace);
    assert_eq!(date_time(9), notification.import_date_time);
    assert_eq!("datasets/tst-netex.zip", notification.dataset_locator);
    assert_eq!(2, notification.nb_service_journeys);
    // the chunk count is final once the notification exists
    assert_eq!(3, notification.nb_common_file_deliveries);
    // 3 common file deliveries + 2 journey deliveries
    assert_eq!(5, sink.deliveries.len());

    let replay = publish_dataset(
        CODESPACE,
        "datasets/tst-netex.zip",
        &common,
        &lines,
        2,
        date_time(31),
        &repository,
        &mut sink,
    )
    .unwrap();
    assert!(replay.is_none());
    assert_eq!(5, sink.deliveries.len());
}

#[test]
fn test_notification_timestamp_truncated_like_the_import_key() {
    let mut common = common_index();
    let lines = vec![line_index()];
    // a composite frame created with sub-second precision, newer than the
    // rest of the dataset
    common.add_composite_frame(composite_frame(
        "TST:CompositeFrame:2",
        NaiveDate::from_ymd_opt(2023, 4, 5)
            .unwrap()
            .and_hms_nano_opt(6, 7, 10, 123_000_000)
            .unwrap(),
    ));

    let repository = InMemoryImportEventRepository::new();
    let mut sink = RecordingSink::default();
    let notification = publish_dataset(
        CODESPACE,
        "datasets/tst-netex.zip",
        &common,
        &lines,
        2,
        date_time(30),
        &repository,
        &mut sink,
    )
    .unwrap()
    .expect("first import publishes");

    assert_eq!("TST_2023-04-05T06_07_10", notification.import_key);
    assert_eq!(date_time(10), notification.import_date_time);
    assert_eq!(0, chrono::Timelike::nanosecond(&notification.import_date_time));
}
