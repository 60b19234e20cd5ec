//! Noise filtering for `argocd app diff` output
//!
//! The CLI prints one section per resource, each introduced by a header such as
//! `===== apps/Deployment default/web ======`. Every section is scanned on its
//! own: `managedFields` blocks under `metadata` are dropped, tracking-label
//! churn is removed, and sections left without a single change line vanish.

pub mod residual;
pub mod scanner;

pub use residual::{LabelNoise, PART_OF_LABEL};
pub use scanner::{scan_section, ScanError, ScanState};

use crate::config::DEFAULT_TRACKING_LABEL;
use crate::error::Result;
use log::{debug, warn};
use std::sync::OnceLock;

/// Prefix of the per-resource section header
pub const SECTION_HEADER_PREFIX: &str = "===== ";

/// Section-aware diff filter for one tracking label key
#[derive(Debug, Clone)]
pub struct DiffFilter {
    noise: LabelNoise,
}

impl DiffFilter {
    /// Build a filter removing churn of `tracking_key`
    pub fn new(tracking_key: &str) -> Result<Self> {
        Ok(Self {
            noise: LabelNoise::new(tracking_key)?,
        })
    }

    /// Filter a whole diff, returning the reassembled meaningful sections
    pub fn filter(&self, raw: &str) -> String {
        let sections = split_sections(raw);
        let total = sections.len();

        let kept: Vec<String> = sections
            .into_iter()
            .map(|section| self.filter_section(section))
            .filter(|section| is_meaningful(section))
            .collect();

        debug!("Kept {} of {} diff sections", kept.len(), total);
        collapse_blank_lines(&kept.join("\n")).trim().to_string()
    }

    /// Filter a single section; the result is trimmed
    pub fn filter_section(&self, section: &str) -> String {
        if !section.lines().any(scanner::is_change_line) {
            return section.trim().to_string();
        }

        let scanned = match scan_section(section) {
            Ok(scanned) => scanned,
            Err(e) => {
                warn!("Falling back to label-only filtering: {}", e);
                section.to_string()
            }
        };

        self.noise.remove(&scanned).trim().to_string()
    }
}

/// Filter with the default `argocd.argoproj.io/instance` tracking label
pub fn filter_diff(raw: &str) -> String {
    static DEFAULT_FILTER: OnceLock<DiffFilter> = OnceLock::new();
    DEFAULT_FILTER
        .get_or_init(|| {
            DiffFilter::new(DEFAULT_TRACKING_LABEL).expect("default tracking label is a valid pattern")
        })
        .filter(raw)
}

/// Whether `line` opens a new resource section
#[inline]
pub fn is_section_header(line: &str) -> bool {
    line.starts_with(SECTION_HEADER_PREFIX)
}

/// Split at every header line, keeping the header with its section
pub fn split_sections(raw: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in raw.split_inclusive('\n') {
        if is_section_header(line) && offset > start {
            sections.push(&raw[start..offset]);
            start = offset;
        }
        offset += line.len();
    }

    if start < raw.len() {
        sections.push(&raw[start..]);
    }
    sections
}

/// A section survives when it is non-blank and, if it has a header, still
/// carries at least one change line
pub fn is_meaningful(section: &str) -> bool {
    let section = section.trim();
    if section.is_empty() {
        return false;
    }
    let has_header = section.lines().any(is_section_header);
    !has_header || section.lines().any(scanner::is_change_line)
}

/// Collapse runs of three or more newlines to exactly two
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}
