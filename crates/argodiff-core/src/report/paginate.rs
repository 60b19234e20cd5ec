//! Splitting of reports that exceed GitHub's comment size limit

/// GitHub rejects comment bodies longer than this
pub const MAX_COMMENT_LENGTH: usize = 65536;

/// Room kept free in every part for the continuation heading and fence repairs
const PART_OVERHEAD: usize = 512;

/// Split `text` into pieces of at most `max` bytes
///
/// Pieces end right after a newline whenever one fits, and never inside a
/// UTF-8 sequence. A single line longer than `max` is cut at `max`.
pub fn split_into_chunks(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= max {
            chunks.push(rest);
            break;
        }

        let mut end = max;
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if let Some(newline) = rest[..end].rfind('\n') {
            end = newline + 1;
        }
        if end == 0 {
            end = rest
                .char_indices()
                .nth(1)
                .map_or(rest.len(), |(index, _)| index);
        }

        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Turn one rendered report into the comment bodies to post
///
/// Every part after the first opens with `marker` so the whole set is
/// replaced on the next run. A code fence left open at the end of a part is
/// closed there and reopened at the top of the next one.
pub fn paginate_report(report: &str, marker: &str, max: usize) -> Vec<String> {
    if report.len() <= max {
        return vec![report.to_string()];
    }

    let budget = max.saturating_sub(PART_OVERHEAD + marker.len()).max(1);
    let chunks = split_into_chunks(report, budget);
    let total = chunks.len();
    let mut open_fence: Option<&str> = None;

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut body = String::with_capacity(chunk.len() + PART_OVERHEAD);
            if index > 0 {
                body.push_str(&format!("{}(continued, part {}/{})\n\n", marker, index + 1, total));
                if let Some(fence) = open_fence {
                    body.push_str(fence);
                    body.push('\n');
                }
            }
            body.push_str(chunk);

            for line in chunk.lines() {
                if line.starts_with("```") {
                    open_fence = match open_fence {
                        Some(_) => None,
                        None => Some(line),
                    };
                }
            }
            if open_fence.is_some() {
                if !body.ends_with('\n') {
                    body.push('\n');
                }
                body.push_str("```\n");
            }
            body
        })
        .collect()
}
