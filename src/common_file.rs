//! Deliveries extracted from the common file.
//!
//! Two kinds of shared entities are republished on their own, outside any
//! line: the notices and destination displays, and the service links. Service
//! links carry geometry and get large, so they are chunked into several
//! deliveries by the range splitter; the other shared entities fit in one.

use crate::error::Error;
use crate::publication::{
    delivery_from_source_frame, PublicationDelivery, ServiceFrame, DEFAULT_FRAME_ID,
    DEFAULT_FRAME_VERSION,
};
use crate::range_splitter::Range;
use chrono::NaiveDateTime;
use netex_model::{NetexEntitiesIndex, ServiceLink};

const NOTICES_DELIVERY_DESCRIPTION: &str = "Notices and Destination Displays";
const SERVICE_LINKS_DELIVERY_DESCRIPTION: &str = "Service Links";

/// Delivery holding every notice and destination display of the common file.
pub fn build_notice_and_destination_display_delivery(
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    publication_timestamp: NaiveDateTime,
) -> Result<PublicationDelivery, Error> {
    let mut delivery = common_delivery_skeleton(
        NOTICES_DELIVERY_DESCRIPTION,
        codespace,
        common_index,
        publication_timestamp,
    )?;
    delivery.composite_frame.frames.service_frame = Some(ServiceFrame {
        notices: common_index.notices().cloned().collect(),
        destination_displays: common_index.destination_displays().cloned().collect(),
        ..common_service_frame(codespace)
    });
    Ok(delivery)
}

/// Delivery holding one chunk of the common file's service links.
///
/// Service links are stop-point geometry shared across datasets; a link's
/// endpoint references would otherwise pin stop point versions of a dataset
/// this delivery does not carry, so the versions are cleared.
pub fn build_service_link_delivery(
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    range: &Range,
    publication_timestamp: NaiveDateTime,
) -> Result<PublicationDelivery, Error> {
    let service_links: Vec<ServiceLink> = range
        .slice(&common_index.service_links().collect::<Vec<_>>())
        .iter()
        .map(|link| {
            let mut link = (*link).clone();
            link.from_point_ref = link.from_point_ref.unversioned();
            link.to_point_ref = link.to_point_ref.unversioned();
            link
        })
        .collect();

    let mut delivery = common_delivery_skeleton(
        SERVICE_LINKS_DELIVERY_DESCRIPTION,
        codespace,
        common_index,
        publication_timestamp,
    )?;
    delivery.composite_frame.frames.service_frame = Some(ServiceFrame {
        service_links,
        ..common_service_frame(codespace)
    });
    Ok(delivery)
}

/// Delivery whose validity metadata is copied from the common file's
/// composite frame but whose frame ids are minted under the codespace: the
/// common file's own composite frame id names the whole dataset, not one
/// extract of it.
fn common_delivery_skeleton(
    description: &str,
    codespace: &str,
    common_index: &NetexEntitiesIndex,
    publication_timestamp: NaiveDateTime,
) -> Result<PublicationDelivery, Error> {
    let source_frame = common_index
        .composite_frames()
        .first()
        .ok_or(Error::MissingCompositeFrame)?;
    let mut delivery =
        delivery_from_source_frame(description, source_frame, publication_timestamp);
    let codespace = codespace.to_uppercase();
    delivery.composite_frame.id = format!("{codespace}:CompositeFrame:{DEFAULT_FRAME_ID}");
    delivery.composite_frame.version = DEFAULT_FRAME_VERSION.to_owned();
    Ok(delivery)
}

fn common_service_frame(codespace: &str) -> ServiceFrame {
    let codespace = codespace.to_uppercase();
    ServiceFrame {
        id: format!("{codespace}:ServiceFrame:{DEFAULT_FRAME_ID}"),
        version: DEFAULT_FRAME_VERSION.to_owned(),
        ..ServiceFrame::default()
    }
}
