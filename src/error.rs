//! Module for the error management
use thiserror::Error;

/// An error that can occur while resolving references or assembling a
/// publication delivery.
///
/// The resolution errors are fatal for the dataset version being processed:
/// they indicate a malformed or inconsistent export, and retrying at this
/// layer cannot fix them.
#[derive(Error, Debug)]
pub enum Error {
    /// The line file contains neither a line nor a flexible line
    #[error("the line file contains neither a line nor a flexible line")]
    NoLine,
    /// The line file contains more than one line
    #[error("the line file contains more than one line")]
    MultipleLines,
    /// The line file contains more than one flexible line
    #[error("the line file contains more than one flexible line")]
    MultipleFlexibleLines,
    /// The line file contains both a line and a flexible line
    #[error("the line file contains both a line and a flexible line")]
    BothLineAndFlexibleLine,
    /// The representation reference points neither at a network nor at a
    /// group of lines nested in a network
    #[error("no network found for reference {0}")]
    NetworkNotFound(String),
    /// A service journey overrides the line operator with a reference to an
    /// operator that does not exist in the common file
    #[error("unknown operator {operator} for service journey {service_journey}")]
    UnknownOperator {
        /// The dangling operator reference
        operator: String,
        /// The service journey carrying the override
        service_journey: String,
    },
    /// A reference names an id that is not present in any index
    #[error("the id {0} is not known")]
    ReferenceError(String),
    /// The line file carries no composite frame to copy identity metadata from
    #[error("no composite frame in the line file")]
    MissingCompositeFrame,
    /// The line file carries no service frame to copy identity metadata from
    #[error("no service frame in the line file")]
    MissingServiceFrame,
    /// A serialized delivery exceeds the maximum record size of the transport.
    /// Raised by the transport sink; the affected common-file chunk is skipped
    /// and its siblings still proceed
    #[error("record too large for the transport: {part}")]
    RecordTooLarge {
        /// Which part of the dataset could not be published
        part: String,
    },
    /// Any other failure raised by the transport sink
    #[error("transport failure")]
    Transport(#[source] anyhow::Error),
}
