/*! Reference resolution and document reassembly of [NeTEx](https://netex-cen.eu/)
timetable datasets.

A transit dataset arrives as one *common file* of shared entities plus one
*line file* per transit line, with entities referencing each other across the
two documents. This crate republishes such a dataset at service-journey
granularity: for every service journey of every line it assembles a
self-contained publication delivery holding the journey together with the
full closure of the entities it references, each reference pinned to the
version of the entity actually resolved. The shared entities that belong to
no single journey (notices, destination displays, service links) are
republished in common-file deliveries, chunked so no delivery exceeds the
transport size limit.

The inputs are [NetexEntitiesIndex] values from the [netex_model] crate, one
per source document. The indexes are read-only throughout: the resolvers copy
the entities they correct, so concurrent publication of several line files
over one shared common file needs no synchronization.

```
use netex_publication::{publish_dataset, DeliverySink, InMemoryImportEventRepository,
                        PublicationDelivery, DEFAULT_SERVICE_LINK_RANGE_SIZE};
use netex_model::NetexEntitiesIndex;

struct Collect(Vec<PublicationDelivery>);
impl DeliverySink for Collect {
    fn deliver(&mut self, delivery: &PublicationDelivery) -> anyhow::Result<()> {
        self.0.push(delivery.clone());
        Ok(())
    }
}

let common_index = NetexEntitiesIndex::new();
let repository = InMemoryImportEventRepository::new();
let mut sink = Collect(Vec::new());
let outcome = publish_dataset(
    "tst",
    "datasets/tst-netex.zip",
    &common_index,
    &[],
    DEFAULT_SERVICE_LINK_RANGE_SIZE,
    chrono::Utc::now().naive_utc(),
    &repository,
    &mut sink,
);
// no composite frame at all, so there is no dataset version to publish
assert!(outcome.is_err());
```
*/

pub mod common_file;
pub mod error;
pub mod import_event;
pub mod journey_pattern_references;
pub mod line_references;
pub mod publication;
pub mod publisher;
pub mod range_splitter;
pub mod route_references;
pub mod service_journey_references;

pub use error::Error;
pub use import_event::{
    dataset_creation_time, import_key, ImportEventRepository, ImportNotification,
    InMemoryImportEventRepository,
};
pub use journey_pattern_references::JourneyPatternReferences;
pub use line_references::{AnyLine, LineReferences};
pub use publication::{build_service_journey_delivery, PublicationDelivery};
pub use publisher::{
    publish_common_file, publish_dataset, publish_line, DatasetStat, DeliverySink, JsonLinesSink,
    DEFAULT_SERVICE_LINK_RANGE_SIZE,
};
pub use route_references::RouteReferences;
pub use service_journey_references::ServiceJourneyReferences;

#[cfg(test)]
mod tests;
