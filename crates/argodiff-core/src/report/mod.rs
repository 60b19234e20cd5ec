//! Pull request comment rendering
//!
//! A run renders once, scrubs secrets from the rendered text, and splits it
//! into as many comments as GitHub's size limit requires.

pub mod paginate;
pub mod renderer;
pub mod scrub;

pub use paginate::{paginate_report, split_into_chunks, MAX_COMMENT_LENGTH};
pub use renderer::{report_marker, ReportRenderer, GLYPH_ERROR, GLYPH_OUT_OF_SYNC, GLYPH_SYNCED};
pub use scrub::{scrub_secrets, REDACTED};
