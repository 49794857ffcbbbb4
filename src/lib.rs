//! Split multi-weight Les Houches Event (LHE) files into single-weight files.
//!
//! Event samples generated with reweighting enabled carry every weight
//! variant in every `<event>` block. Some downstream tools expect exactly one
//! variant per file, so this crate re-emits the document once per declared
//! weight id with the header and every event pruned down to that id.
//!
//! The document is never materialized. The header is scanned once to build a
//! [`WeightCatalog`], then each output file is produced by independent
//! streaming passes over the raw input, which keeps peak memory independent
//! of event count. Inputs of tens of gigabytes are the intended workload.

pub mod err;
mod lhe_scanner;
mod lhe_splitter;
mod weights;

pub use err::{Error, Result};
pub use lhe_scanner::{DEFAULT_LHE_VERSION, scan_weights};
pub use lhe_splitter::{LheSplitter, output_path_for};
pub use weights::{WeightCatalog, WeightDef, WeightEntry, WeightGroupShell};
