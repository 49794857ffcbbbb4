use std::io;
use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open file {}: {source}", .path.display())]
    FailedToOpenFile { source: io::Error, path: PathBuf },

    #[error("failed to create output file {}: {source}", .path.display())]
    FailedToCreateFile { source: io::Error, path: PathBuf },

    #[error("an I/O error has occurred: {0}")]
    Io(#[from] io::Error),

    #[error("malformed XML near byte {offset}: {source}")]
    Xml { source: quick_xml::Error, offset: u64 },

    #[error("invalid XML content: {0}")]
    InvalidContent(#[from] quick_xml::Error),

    #[error("malformed attribute list: {0}")]
    InvalidAttribute(#[from] AttrError),

    #[error("header declares weights but contains no <initrwgt> element")]
    MissingInitRwgt,

    #[error("event {event_number} has no <rwgt> element")]
    MissingRwgt { event_number: u64 },

    #[error("weight id `{id}` is not declared in the header")]
    UnknownWeightId { id: String },

    #[error("unexpected end of document inside <{element}>")]
    TruncatedDocument { element: &'static str },
}

impl Error {
    /// Attaches the reader position to parse faults so operators can locate
    /// the offending region in multi-gigabyte inputs.
    pub(crate) fn xml(source: quick_xml::Error, offset: u64) -> Self {
        Error::Xml { source, offset }
    }
}
