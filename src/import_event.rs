//! Import keys and dedup of already-published dataset versions.
//!
//! A dataset version is identified by `{codespace}_{creation time}`, where
//! the creation time is the latest composite frame creation timestamp in the
//! dataset. The same dataset version can be received several times (the
//! upstream export is at-least-once); an [ImportEventRepository] remembers
//! the keys already published so reprocessing is skipped instead of
//! republishing every journey.

use chrono::{NaiveDateTime, Timelike};
use netex_model::serde_helpers::serialize_date_time;
use netex_model::NetexEntitiesIndex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::Mutex;

/// Key identifying one version of one codespace's dataset.
///
/// The creation time is truncated to whole seconds: upstream exporters do not
/// emit sub-second precision consistently, and a key that varies with the
/// fractional part would defeat deduplication. Colons of the timestamp are
/// replaced so the key is usable as a file name.
pub fn import_key(codespace: &str, creation_time: NaiveDateTime) -> String {
    let creation_time = truncate_to_seconds(creation_time);
    let timestamp = creation_time
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
        .replace(':', "_");
    format!("{}_{timestamp}", codespace.to_uppercase())
}

/// Creation time of a dataset: the latest `created` timestamp across its
/// composite frames, or `None` when no index carries one.
pub fn dataset_creation_time<'a>(
    indexes: impl IntoIterator<Item = &'a NetexEntitiesIndex>,
) -> Option<NaiveDateTime> {
    indexes
        .into_iter()
        .flat_map(|index| index.composite_frames())
        .map(|frame| frame.created)
        .max()
}

pub(crate) fn truncate_to_seconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    // with_nanosecond(0) only fails on a leap second, which carries
    // nanosecond >= 1_000_000_000
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

/// Notification payload emitted after a dataset version has been fully
/// published.
///
/// The timestamp carries the same whole-seconds precision as the import key,
/// and the common-file delivery count is final: every chunk has been pushed
/// (or skipped as oversized) before the notification exists.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ImportNotification {
    pub codespace: String,
    pub import_key: String,
    #[serde(serialize_with = "serialize_date_time")]
    pub import_date_time: NaiveDateTime,
    /// Where the published dataset lives, as given by the caller (blob path,
    /// file name); carried through opaquely
    pub dataset_locator: String,
    pub nb_service_journeys: usize,
    pub nb_common_file_deliveries: usize,
}

/// Remembers the import keys already published.
///
/// `check_and_mark` is atomic: when several workers race on the same key,
/// exactly one of them observes it as new.
pub trait ImportEventRepository: Send + Sync {
    /// Marks the key as seen. Returns true when the key had already been
    /// marked before this call.
    fn check_and_mark(&self, import_key: &str) -> bool;
}

/// In-process repository, suitable for a single-node deployment and for
/// tests. Keys live as long as the process
#[derive(Default)]
pub struct InMemoryImportEventRepository {
    seen: Mutex<FxHashSet<String>>,
}

impl InMemoryImportEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImportEventRepository for InMemoryImportEventRepository {
    fn check_and_mark(&self, import_key: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| {
            // the set stays consistent even if a holder panicked mid-call
            poisoned.into_inner()
        });
        !seen.insert(import_key.to_owned())
    }
}
