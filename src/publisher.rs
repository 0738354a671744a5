//! Fan-out of a dataset into per-journey and common-file deliveries.
//!
//! One dataset version is published as: one delivery per service journey of
//! every line file, plus the shared-entity deliveries extracted from the
//! common file. The reference bundles that do not vary per journey (line,
//! routes, journey patterns) are resolved once per line file and shared
//! across the journey fan-out.

use crate::common_file::{
    build_notice_and_destination_display_delivery, build_service_link_delivery,
};
use crate::error::Error;
use crate::import_event::{
    dataset_creation_time, import_key, truncate_to_seconds, ImportEventRepository,
    ImportNotification,
};
use crate::journey_pattern_references::JourneyPatternReferences;
use crate::line_references::LineReferences;
use crate::publication::{build_service_journey_delivery, PublicationDelivery};
use crate::range_splitter;
use crate::route_references::RouteReferences;
use chrono::NaiveDateTime;
use log::{debug, error, info};
use netex_model::NetexEntitiesIndex;
use rustc_hash::FxHashMap;

/// Maximum number of service links per common-file delivery
pub const DEFAULT_SERVICE_LINK_RANGE_SIZE: usize = 300;

/// Progress is logged every this many published journeys
const CHECKPOINT_INTERVAL: usize = 500;

/// Where assembled deliveries go.
///
/// The transport is free to fail a single delivery with
/// [Error::RecordTooLarge] (wrapped in the `anyhow` error); the publisher
/// skips that delivery and carries on with its siblings. Any other failure
/// aborts the dataset.
pub trait DeliverySink {
    fn deliver(&mut self, delivery: &PublicationDelivery) -> anyhow::Result<()>;
}

/// Sink serializing each delivery as one line of JSON.
///
/// When a maximum record size is set, a delivery serializing beyond it is
/// rejected with [Error::RecordTooLarge] without being written, the way a
/// bounded-record transport would reject it.
pub struct JsonLinesSink<W: std::io::Write> {
    writer: W,
    max_record_size: Option<usize>,
}

impl<W: std::io::Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer,
            max_record_size: None,
        }
    }

    pub fn with_max_record_size(writer: W, max_record_size: usize) -> Self {
        JsonLinesSink {
            writer,
            max_record_size: Some(max_record_size),
        }
    }
}

impl<W: std::io::Write> DeliverySink for JsonLinesSink<W> {
    fn deliver(&mut self, delivery: &PublicationDelivery) -> anyhow::Result<()> {
        let record = serde_json::to_vec(delivery)?;
        if let Some(max_record_size) = self.max_record_size {
            if record.len() > max_record_size {
                return Err(anyhow::Error::new(Error::RecordTooLarge {
                    part: delivery.description.clone(),
                }));
            }
        }
        self.writer.write_all(&record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// What one dataset version amounted to once published
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatasetStat {
    pub nb_lines: usize,
    pub nb_service_journeys: usize,
    pub nb_common_file_deliveries: usize,
}

/// Publishes every service journey of one line file.
///
/// Returns the number of journey deliveries sent to the sink.
pub fn publish_line(
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    line_index: &NetexEntitiesIndex,
    publication_timestamp: NaiveDateTime,
    sink: &mut dyn DeliverySink,
) -> Result<usize, Error> {
    let line_references = LineReferences::resolve(line_index, common_index)?;
    info!(
        "publishing line {} ({} service journeys)",
        line_references.line.id(),
        line_index.nb_service_journeys()
    );

    let mut route_references: FxHashMap<String, RouteReferences> = FxHashMap::default();
    for route in line_index.routes() {
        route_references.insert(
            route.id.clone(),
            RouteReferences::resolve(route, common_index)?,
        );
    }

    let mut journey_pattern_references: FxHashMap<String, JourneyPatternReferences> =
        FxHashMap::default();
    for journey_pattern in line_index.journey_patterns() {
        journey_pattern_references.insert(
            journey_pattern.id.clone(),
            JourneyPatternReferences::resolve(journey_pattern, common_index, line_index)?,
        );
    }

    let mut nb_published = 0;
    for service_journey in line_index.service_journeys() {
        let journey_pattern = journey_pattern_references
            .get(&service_journey.journey_pattern_ref.id)
            .ok_or_else(|| {
                Error::ReferenceError(service_journey.journey_pattern_ref.id.clone())
            })?;
        let route = route_references
            .get(&journey_pattern.journey_pattern.route_ref.id)
            .ok_or_else(|| {
                Error::ReferenceError(journey_pattern.journey_pattern.route_ref.id.clone())
            })?;

        let delivery = build_service_journey_delivery(
            codespace,
            common_index,
            line_index,
            &service_journey.id,
            &line_references,
            route,
            journey_pattern,
            publication_timestamp,
        )?;
        sink.deliver(&delivery).map_err(Error::Transport)?;

        nb_published += 1;
        if nb_published % CHECKPOINT_INTERVAL == 0 {
            debug!(
                "line {}: {nb_published} service journeys published",
                line_references.line.id()
            );
        }
    }
    Ok(nb_published)
}

/// Publishes the shared-entity deliveries of the common file: one delivery
/// with the notices and destination displays, then the service links chunked
/// into ranges of at most `range_size` links.
///
/// Returns the number of deliveries sent to the sink. A chunk rejected by the
/// transport as too large is logged and skipped; the remaining chunks are
/// still published.
pub fn publish_common_file(
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    range_size: usize,
    publication_timestamp: NaiveDateTime,
    sink: &mut dyn DeliverySink,
) -> Result<usize, Error> {
    let mut nb_published = 0;

    if common_index.notices().next().is_some()
        || common_index.destination_displays().next().is_some()
    {
        let delivery = build_notice_and_destination_display_delivery(
            codespace,
            common_index,
            publication_timestamp,
        )?;
        if deliver_skipping_oversized(sink, &delivery, "notices and destination displays")? {
            nb_published += 1;
        }
    }

    for range in range_splitter::split(common_index.nb_service_links(), range_size) {
        let delivery =
            build_service_link_delivery(codespace, common_index, &range, publication_timestamp)?;
        let part = format!("service links {}..={}", range.lower(), range.upper());
        if deliver_skipping_oversized(sink, &delivery, &part)? {
            nb_published += 1;
        }
    }

    Ok(nb_published)
}

/// Publishes one dataset version end to end: the common-file deliveries, then
/// every line file's journey fan-out. `dataset_locator` names where the
/// published dataset lives and is carried into the notification unchanged.
///
/// Returns `None` when the repository has already seen this dataset version's
/// import key; nothing is published in that case.
#[allow(clippy::too_many_arguments)]
pub fn publish_dataset(
    codespace: &str,
    dataset_locator: &str,
    common_index: &NetexEntitiesIndex,
    line_indexes: &[NetexEntitiesIndex],
    range_size: usize,
    publication_timestamp: NaiveDateTime,
    repository: &dyn ImportEventRepository,
    sink: &mut dyn DeliverySink,
) -> Result<Option<ImportNotification>, Error> {
    let creation_time = dataset_creation_time(
        std::iter::once(common_index).chain(line_indexes.iter()),
    )
    .ok_or(Error::MissingCompositeFrame)?;
    let import_key = import_key(codespace, creation_time);

    if repository.check_and_mark(&import_key) {
        info!("dataset version {import_key} already published, skipping");
        return Ok(None);
    }

    let nb_common_file_deliveries = publish_common_file(
        codespace,
        common_index,
        range_size,
        publication_timestamp,
        sink,
    )?;
    let mut stat = DatasetStat {
        nb_common_file_deliveries,
        ..DatasetStat::default()
    };
    for line_index in line_indexes {
        stat.nb_service_journeys +=
            publish_line(codespace, common_index, line_index, publication_timestamp, sink)?;
        stat.nb_lines += 1;
    }
    info!(
        "dataset version {import_key} published: {} lines, {} service journeys, {} common file deliveries",
        stat.nb_lines, stat.nb_service_journeys, stat.nb_common_file_deliveries
    );

    Ok(Some(ImportNotification {
        codespace: codespace.to_uppercase(),
        import_key,
        // same precision as the import key
        import_date_time: truncate_to_seconds(creation_time),
        dataset_locator: dataset_locator.to_owned(),
        nb_service_journeys: stat.nb_service_journeys,
        nb_common_file_deliveries: stat.nb_common_file_deliveries,
    }))
}

/// Returns whether the delivery was accepted. An oversized record is skipped,
/// any other transport failure is propagated.
fn deliver_skipping_oversized(
    sink: &mut dyn DeliverySink,
    delivery: &PublicationDelivery,
    part: &str,
) -> Result<bool, Error> {
    match sink.deliver(delivery) {
        Ok(()) => Ok(true),
        Err(cause) => match cause.downcast_ref::<Error>() {
            Some(Error::RecordTooLarge { .. }) => {
                error!("skipping {part}: record too large for the transport");
                Ok(false)
            }
            _ => Err(Error::Transport(cause)),
        },
    }
}
