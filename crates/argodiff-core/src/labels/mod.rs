//! Tracking-label extraction and affected-application resolution

pub mod extractor;
pub mod resolver;

pub use extractor::{extract_tracking_label, read_tracking_label, LabelDocument};
pub use resolver::{is_affected, LabelIndex};
