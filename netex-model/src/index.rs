use crate::entities::*;
use rustc_hash::FxHashMap;

/// Read-only lookup structure over one parsed NeTEx document.
///
/// One instance exists per common file and one per line file. The index is
/// populated once through the `add_*` methods while the document is parsed
/// and is treated as immutable afterwards: every lookup is a pure read, so an
/// index is safe to share across unlimited concurrent readers.
///
/// Besides the primary id-keyed maps, the index maintains the secondary
/// multi-maps the resolvers need: stop assignments by stop point, day-type
/// assignments by day type, dated service journeys by service journey, and
/// interchanges by the service journeys they connect.
#[derive(Default)]
pub struct NetexEntitiesIndex {
    lines: FxHashMap<String, Line>,
    flexible_lines: FxHashMap<String, FlexibleLine>,
    networks: FxHashMap<String, Network>,
    authorities: FxHashMap<String, Authority>,
    operators: FxHashMap<String, Operator>,
    brandings: FxHashMap<String, Branding>,
    route_points: FxHashMap<String, RoutePoint>,
    routes: FxHashMap<String, Route>,
    journey_patterns: FxHashMap<String, JourneyPattern>,
    scheduled_stop_points: FxHashMap<String, ScheduledStopPoint>,
    passenger_stop_assignments: FxHashMap<String, PassengerStopAssignment>,
    service_journeys: FxHashMap<String, ServiceJourney>,
    day_types: FxHashMap<String, DayType>,
    day_type_assignments: FxHashMap<String, DayTypeAssignment>,
    operating_days: FxHashMap<String, OperatingDay>,
    operating_periods: FxHashMap<String, OperatingPeriod>,
    dated_service_journeys: FxHashMap<String, DatedServiceJourney>,
    service_journey_interchanges: FxHashMap<String, ServiceJourneyInterchange>,
    notices: FxHashMap<String, Notice>,
    destination_displays: FxHashMap<String, DestinationDisplay>,
    service_links: FxHashMap<String, ServiceLink>,
    notice_assignments: Vec<NoticeAssignment>,
    composite_frames: Vec<CompositeFrame>,
    service_frames: Vec<ServiceFrameInfo>,

    // secondary indexes, maintained on insertion; values keep insertion order
    stop_assignments_by_stop_point: FxHashMap<String, Vec<String>>,
    day_type_assignments_by_day_type: FxHashMap<String, Vec<String>>,
    dated_service_journeys_by_service_journey: FxHashMap<String, Vec<String>>,
    interchanges_by_service_journey: FxHashMap<String, Vec<String>>,

    // insertion order of lines and flexible lines, for deterministic iteration
    line_order: Vec<String>,
    flexible_line_order: Vec<String>,
    route_order: Vec<String>,
    journey_pattern_order: Vec<String>,
    service_journey_order: Vec<String>,
    service_link_order: Vec<String>,
    notice_order: Vec<String>,
    destination_display_order: Vec<String>,
}

impl NetexEntitiesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&mut self, line: Line) {
        self.line_order.push(line.id.clone());
        self.lines.insert(line.id.clone(), line);
    }

    pub fn add_flexible_line(&mut self, line: FlexibleLine) {
        self.flexible_line_order.push(line.id.clone());
        self.flexible_lines.insert(line.id.clone(), line);
    }

    pub fn add_network(&mut self, network: Network) {
        self.networks.insert(network.id.clone(), network);
    }

    pub fn add_authority(&mut self, authority: Authority) {
        self.authorities.insert(authority.id.clone(), authority);
    }

    pub fn add_operator(&mut self, operator: Operator) {
        self.operators.insert(operator.id.clone(), operator);
    }

    pub fn add_branding(&mut self, branding: Branding) {
        self.brandings.insert(branding.id.clone(), branding);
    }

    pub fn add_route_point(&mut self, route_point: RoutePoint) {
        self.route_points.insert(route_point.id.clone(), route_point);
    }

    pub fn add_route(&mut self, route: Route) {
        self.route_order.push(route.id.clone());
        self.routes.insert(route.id.clone(), route);
    }

    pub fn add_journey_pattern(&mut self, journey_pattern: JourneyPattern) {
        self.journey_pattern_order.push(journey_pattern.id.clone());
        self.journey_patterns
            .insert(journey_pattern.id.clone(), journey_pattern);
    }

    pub fn add_scheduled_stop_point(&mut self, stop_point: ScheduledStopPoint) {
        self.scheduled_stop_points
            .insert(stop_point.id.clone(), stop_point);
    }

    pub fn add_passenger_stop_assignment(&mut self, assignment: PassengerStopAssignment) {
        self.stop_assignments_by_stop_point
            .entry(assignment.scheduled_stop_point_ref.id.clone())
            .or_default()
            .push(assignment.id.clone());
        self.passenger_stop_assignments
            .insert(assignment.id.clone(), assignment);
    }

    pub fn add_service_journey(&mut self, service_journey: ServiceJourney) {
        self.service_journey_order.push(service_journey.id.clone());
        self.service_journeys
            .insert(service_journey.id.clone(), service_journey);
    }

    pub fn add_day_type(&mut self, day_type: DayType) {
        self.day_types.insert(day_type.id.clone(), day_type);
    }

    pub fn add_day_type_assignment(&mut self, assignment: DayTypeAssignment) {
        self.day_type_assignments_by_day_type
            .entry(assignment.day_type_ref.id.clone())
            .or_default()
            .push(assignment.id.clone());
        self.day_type_assignments
            .insert(assignment.id.clone(), assignment);
    }

    pub fn add_operating_day(&mut self, operating_day: OperatingDay) {
        self.operating_days
            .insert(operating_day.id.clone(), operating_day);
    }

    pub fn add_operating_period(&mut self, operating_period: OperatingPeriod) {
        self.operating_periods
            .insert(operating_period.id.clone(), operating_period);
    }

    pub fn add_dated_service_journey(&mut self, dated: DatedServiceJourney) {
        self.dated_service_journeys_by_service_journey
            .entry(dated.service_journey_ref.id.clone())
            .or_default()
            .push(dated.id.clone());
        self.dated_service_journeys.insert(dated.id.clone(), dated);
    }

    pub fn add_service_journey_interchange(&mut self, interchange: ServiceJourneyInterchange) {
        for journey_id in [
            &interchange.from_journey_ref.id,
            &interchange.to_journey_ref.id,
        ] {
            let ids = self
                .interchanges_by_service_journey
                .entry(journey_id.clone())
                .or_default();
            // an interchange from a journey to itself is indexed once
            if !ids.contains(&interchange.id) {
                ids.push(interchange.id.clone());
            }
        }
        self.service_journey_interchanges
            .insert(interchange.id.clone(), interchange);
    }

    pub fn add_notice_assignment(&mut self, assignment: NoticeAssignment) {
        self.notice_assignments.push(assignment);
    }

    pub fn add_notice(&mut self, notice: Notice) {
        self.notice_order.push(notice.id.clone());
        self.notices.insert(notice.id.clone(), notice);
    }

    pub fn add_destination_display(&mut self, display: DestinationDisplay) {
        self.destination_display_order.push(display.id.clone());
        self.destination_displays.insert(display.id.clone(), display);
    }

    pub fn add_service_link(&mut self, service_link: ServiceLink) {
        self.service_link_order.push(service_link.id.clone());
        self.service_links
            .insert(service_link.id.clone(), service_link);
    }

    pub fn add_composite_frame(&mut self, frame: CompositeFrame) {
        self.composite_frames.push(frame);
    }

    pub fn add_service_frame(&mut self, frame: ServiceFrameInfo) {
        self.service_frames.push(frame);
    }

    /// Gets a [Line] by its id
    pub fn line(&self, id: &str) -> Option<&Line> {
        self.lines.get(id)
    }

    /// All lines, in insertion order
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.line_order.iter().filter_map(|id| self.lines.get(id))
    }

    pub fn nb_lines(&self) -> usize {
        self.lines.len()
    }

    /// Gets a [FlexibleLine] by its id
    pub fn flexible_line(&self, id: &str) -> Option<&FlexibleLine> {
        self.flexible_lines.get(id)
    }

    /// All flexible lines, in insertion order
    pub fn flexible_lines(&self) -> impl Iterator<Item = &FlexibleLine> {
        self.flexible_line_order
            .iter()
            .filter_map(|id| self.flexible_lines.get(id))
    }

    pub fn nb_flexible_lines(&self) -> usize {
        self.flexible_lines.len()
    }

    pub fn network(&self, id: &str) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn authority(&self, id: &str) -> Option<&Authority> {
        self.authorities.get(id)
    }

    pub fn operator(&self, id: &str) -> Option<&Operator> {
        self.operators.get(id)
    }

    pub fn branding(&self, id: &str) -> Option<&Branding> {
        self.brandings.get(id)
    }

    pub fn route_point(&self, id: &str) -> Option<&RoutePoint> {
        self.route_points.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    /// All routes, in insertion order
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.route_order.iter().filter_map(|id| self.routes.get(id))
    }

    pub fn journey_pattern(&self, id: &str) -> Option<&JourneyPattern> {
        self.journey_patterns.get(id)
    }

    /// All journey patterns, in insertion order
    pub fn journey_patterns(&self) -> impl Iterator<Item = &JourneyPattern> {
        self.journey_pattern_order
            .iter()
            .filter_map(|id| self.journey_patterns.get(id))
    }

    pub fn scheduled_stop_point(&self, id: &str) -> Option<&ScheduledStopPoint> {
        self.scheduled_stop_points.get(id)
    }

    pub fn service_journey(&self, id: &str) -> Option<&ServiceJourney> {
        self.service_journeys.get(id)
    }

    /// All service journeys, in insertion order
    pub fn service_journeys(&self) -> impl Iterator<Item = &ServiceJourney> {
        self.service_journey_order
            .iter()
            .filter_map(|id| self.service_journeys.get(id))
    }

    pub fn nb_service_journeys(&self) -> usize {
        self.service_journeys.len()
    }

    pub fn day_type(&self, id: &str) -> Option<&DayType> {
        self.day_types.get(id)
    }

    pub fn operating_day(&self, id: &str) -> Option<&OperatingDay> {
        self.operating_days.get(id)
    }

    pub fn operating_period(&self, id: &str) -> Option<&OperatingPeriod> {
        self.operating_periods.get(id)
    }

    pub fn notice(&self, id: &str) -> Option<&Notice> {
        self.notices.get(id)
    }

    /// All notices, in insertion order
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notice_order.iter().filter_map(|id| self.notices.get(id))
    }

    /// All destination displays, in insertion order
    pub fn destination_displays(&self) -> impl Iterator<Item = &DestinationDisplay> {
        self.destination_display_order
            .iter()
            .filter_map(|id| self.destination_displays.get(id))
    }

    pub fn service_link(&self, id: &str) -> Option<&ServiceLink> {
        self.service_links.get(id)
    }

    /// All service links, in insertion order
    pub fn service_links(&self) -> impl Iterator<Item = &ServiceLink> {
        self.service_link_order
            .iter()
            .filter_map(|id| self.service_links.get(id))
    }

    pub fn nb_service_links(&self) -> usize {
        self.service_links.len()
    }

    /// All notice assignments, in document order. There is no useful primary
    /// key access pattern for notice assignments: the resolvers scan them
    pub fn notice_assignments(&self) -> &[NoticeAssignment] {
        &self.notice_assignments
    }

    pub fn composite_frames(&self) -> &[CompositeFrame] {
        &self.composite_frames
    }

    pub fn service_frames(&self) -> &[ServiceFrameInfo] {
        &self.service_frames
    }

    /// Passenger stop assignments referencing the given scheduled stop point
    pub fn passenger_stop_assignments_for_stop_point(
        &self,
        stop_point_id: &str,
    ) -> Vec<&PassengerStopAssignment> {
        self.multi_lookup(
            &self.stop_assignments_by_stop_point,
            stop_point_id,
            &self.passenger_stop_assignments,
        )
    }

    /// Day type assignments referencing the given day type
    pub fn day_type_assignments_for_day_type(&self, day_type_id: &str) -> Vec<&DayTypeAssignment> {
        self.multi_lookup(
            &self.day_type_assignments_by_day_type,
            day_type_id,
            &self.day_type_assignments,
        )
    }

    /// Dated service journeys referencing the given service journey
    pub fn dated_service_journeys_for_service_journey(
        &self,
        service_journey_id: &str,
    ) -> Vec<&DatedServiceJourney> {
        self.multi_lookup(
            &self.dated_service_journeys_by_service_journey,
            service_journey_id,
            &self.dated_service_journeys,
        )
    }

    /// Interchanges whose from/to references name the given service journey
    pub fn interchanges_for_service_journey(
        &self,
        service_journey_id: &str,
    ) -> Vec<&ServiceJourneyInterchange> {
        self.multi_lookup(
            &self.interchanges_by_service_journey,
            service_journey_id,
            &self.service_journey_interchanges,
        )
    }

    fn multi_lookup<'a, T>(
        &self,
        secondary: &'a FxHashMap<String, Vec<String>>,
        key: &str,
        primary: &'a FxHashMap<String, T>,
    ) -> Vec<&'a T> {
        secondary
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| primary.get(id)).collect())
            .unwrap_or_default()
    }
}
