//! Indentation-aware line scanner that drops `managedFields` blocks
//!
//! Only change lines (`+`/`-` prefixed, excluding `+++`/`---` file markers)
//! drive the state machine. Their indentation is measured after the marker.
//! Every other line (section headers, hunk markers, context) passes through.
//!
//! | state                     | change line                                    | next state            | line     |
//! |---------------------------|------------------------------------------------|-----------------------|----------|
//! | `Outside`/`InMetadata`    | body is `metadata:`                            | `InMetadata`          | kept     |
//! | `Outside`/`InMetadata`    | indent 0, body not `metadata:`                 | `Outside`             | kept     |
//! | `InMetadata`              | body is `managedFields:`                       | `SkippingBlock(i)`    | dropped  |
//! | `Outside`/`InMetadata`    | anything else                                  | unchanged             | kept     |
//! | `SkippingBlock(b)`        | indent == b, body not starting with `-`        | `InMetadata`, re-check| kept*    |
//! | `SkippingBlock(b)`        | anything else                                  | `SkippingBlock(b)`    | dropped  |
//!
//! \* the line that closes a block is evaluated again as if in `InMetadata`,
//! so a `managedFields:` key right after a removed block opens a new one.
//! Dropped lines never touch the metadata flag.

use std::fmt;

/// Key that opens the metadata block
pub const METADATA_KEY: &str = "metadata:";

/// Key of the server-managed block that is never worth reviewing
pub const NOISY_BLOCK_KEY: &str = "managedFields:";

/// Scanner state carried across the lines of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Not inside a `metadata:` block
    Outside,
    /// Inside a `metadata:` block, not skipping
    InMetadata,
    /// Dropping the lines of a noisy block whose key sits at this indentation
    SkippingBlock(usize),
}

impl ScanState {
    /// Advance over one non-blank change line, returning whether to keep it
    pub fn step(self, indent: usize, trimmed: &str) -> (Self, bool) {
        let in_metadata = match self {
            Self::SkippingBlock(baseline) => {
                if indent != baseline || trimmed.starts_with('-') {
                    return (self, false);
                }
                true
            }
            Self::InMetadata => true,
            Self::Outside => false,
        };

        let in_metadata = if trimmed == METADATA_KEY {
            true
        } else if indent == 0 {
            false
        } else {
            in_metadata
        };

        if in_metadata && trimmed == NOISY_BLOCK_KEY {
            return (Self::SkippingBlock(indent), false);
        }

        let next = if in_metadata {
            Self::InMetadata
        } else {
            Self::Outside
        };
        (next, true)
    }
}

/// Failure that makes the indentation of a line meaningless
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A tab appears before the first non-space character of a change line
    TabIndentation {
        /// 1-based line number within the section
        line: usize,
    },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::TabIndentation { line } => {
                write!(f, "tab in indentation of line {}", line)
            }
        }
    }
}

impl std::error::Error for ScanError {}

/// `+++ path` / `--- path` file markers and the bare `---` gap of normal diffs
#[inline]
pub fn is_file_marker(line: &str) -> bool {
    line.starts_with("+++ ") || line.starts_with("--- ") || line == "+++" || line == "---"
}

/// Body after the `+`/`-` marker, or `None` for lines that do not take part in scanning
#[inline]
pub fn change_body(line: &str) -> Option<&str> {
    if is_file_marker(line) {
        return None;
    }
    line.strip_prefix('+').or_else(|| line.strip_prefix('-'))
}

/// Any added/removed line, in unified (`+`/`-`) or normal (`>`/`<`) format
#[inline]
pub fn is_change_line(line: &str) -> bool {
    change_body(line).is_some() || line.starts_with('<') || line.starts_with('>')
}

/// Leading spaces of `body`; `Ok(None)` for a blank body
fn indentation(body: &str) -> Result<Option<usize>, ()> {
    for (i, ch) in body.char_indices() {
        match ch {
            ' ' => continue,
            '\t' => return Err(()),
            '\r' | '\n' => return Ok(None),
            _ => return Ok(Some(i)),
        }
    }
    Ok(None)
}

/// Drop every line of `section` that falls inside a `managedFields` block
pub fn scan_section(section: &str) -> Result<String, ScanError> {
    let mut state = ScanState::Outside;
    let mut kept: Vec<&str> = Vec::new();

    for (number, line) in section.split('\n').enumerate() {
        let Some(body) = change_body(line) else {
            kept.push(line);
            continue;
        };

        let indent = indentation(body)
            .map_err(|_| ScanError::TabIndentation { line: number + 1 })?;

        let keep = match indent {
            Some(indent) => {
                let (next, keep) = state.step(indent, body.trim());
                state = next;
                keep
            }
            None => !matches!(state, ScanState::SkippingBlock(_)),
        };

        if keep {
            kept.push(line);
        }
    }

    Ok(kept.join("\n"))
}
