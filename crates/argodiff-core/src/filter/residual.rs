//! Line-pattern removals for label noise the block scanner does not cover

use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;

/// Secondary label Argo CD adds next to the tracking label
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";

/// Optional normal-diff change command (`12c12`, `3,4d2`) owning the next lines
const CHANGE_COMMAND: &str = r"(?:\d+(?:,\d+)?[acd]\d+(?:,\d+)?\n)?";

/// Compiled removal patterns for one tracking label key
#[derive(Debug, Clone)]
pub struct LabelNoise {
    tracking_pair: Regex,
    part_of: Regex,
}

impl LabelNoise {
    /// Compile the patterns for `tracking_key`
    pub fn new(tracking_key: &str) -> Result<Self> {
        let key = regex::escape(tracking_key);
        let tracking_pair = Regex::new(&format!(
            r"(?m)^{cmd}[<\-] +{key}:[^\n]*\n(?:---\n)?[>+] +{key}:[^\n]*(?:\n|$)",
            cmd = CHANGE_COMMAND,
            key = key
        ))
        .map_err(|e| Error::Config(format!("Invalid tracking label pattern: {}", e)))?;

        let part_of = Regex::new(&format!(
            r"(?m)^{cmd}[<>+\-] +{key}:[^\n]*(?:\n|$)",
            cmd = CHANGE_COMMAND,
            key = regex::escape(PART_OF_LABEL)
        ))
        .map_err(|e| Error::Config(format!("Invalid part-of label pattern: {}", e)))?;

        Ok(Self {
            tracking_pair,
            part_of,
        })
    }

    /// Remove tracking-label change pairs and part-of label lines
    ///
    /// Removing one match can bring two unrelated lines next to each other,
    /// so both patterns are applied until neither matches.
    pub fn remove<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(text);
        while self.tracking_pair.is_match(&text) || self.part_of.is_match(&text) {
            let stripped = self
                .part_of
                .replace_all(&self.tracking_pair.replace_all(&text, ""), "")
                .into_owned();
            text = Cow::Owned(stripped);
        }
        text
    }
}
