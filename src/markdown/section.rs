//! Named-section surgery on a markdown document: the pure part.
//!
//! The section body runs from just after the heading line to the start of
//! the next heading of the same or a higher level, or to the end of the
//! document. Everything outside that range, the heading line included, is
//! kept byte for byte.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    #[error("Could not find the '{0}' section")]
    NotFound(String),

    #[error("'{0}' is not a markdown heading")]
    NotAHeading(String),
}

/// Heading level of a line: the number of leading `#` followed by a space.
fn heading_level(line: &str) -> Option<usize> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        Some(' ') | Some('\t') => Some(hashes),
        _ => None,
    }
}

/// Fence character and run length of a code fence line.
fn fence(line: &str) -> Option<(u8, usize)> {
    let trimmed = line.trim_start();
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let run = trimmed.bytes().take_while(|b| *b == marker).count();
    (run >= 3).then_some((marker, run))
}

/// Lines with the byte offset they start at; line text excludes `\n`/`\r\n`.
fn lines_with_offsets(document: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    let mut offset = 0;
    document.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        (start, line.strip_suffix('\r').unwrap_or(line))
    })
}

/// Locate the body range `[start, end)` of the section under `heading`.
pub fn find_section(document: &str, heading: &str) -> Result<(usize, usize), SectionError> {
    let heading = heading.trim_end();
    let level = heading_level(heading).ok_or_else(|| SectionError::NotAHeading(heading.to_string()))?;

    let mut open_fence: Option<(u8, usize)> = None;
    let mut body_start = None;

    for (offset, line) in lines_with_offsets(document) {
        match (open_fence, fence(line)) {
            (None, Some(opened)) => {
                open_fence = Some(opened);
                continue;
            }
            // closed only by the same character, at least as long
            (Some((marker, run)), Some((m, r))) if m == marker && r >= run => {
                open_fence = None;
                continue;
            }
            (Some(_), _) => continue,
            (None, None) => {}
        }
        match body_start {
            None => {
                if line.trim_end() == heading {
                    let line_end = document[offset..]
                        .find('\n')
                        .map(|n| offset + n + 1)
                        .unwrap_or(document.len());
                    body_start = Some(line_end);
                }
            }
            Some(start) => {
                if heading_level(line).is_some_and(|l| l <= level) {
                    return Ok((start, offset));
                }
            }
        }
    }

    body_start
        .map(|start| (start, document.len()))
        .ok_or_else(|| SectionError::NotFound(heading.to_string()))
}

/// Replace the body under `heading` with `body`.
///
/// Pure: the input is never modified, and on error nothing is produced.
/// Re-applying the same body yields the same document.
pub fn replace_section(document: &str, heading: &str, body: &str) -> Result<String, SectionError> {
    let (start, end) = find_section(document, heading)?;

    let mut updated = String::with_capacity(start + body.len() + (document.len() - end) + 1);
    updated.push_str(&document[..start]);
    if start == document.len() && !document.ends_with('\n') && !document.is_empty() {
        // heading was the last line without a newline
        updated.push('\n');
    }
    updated.push_str(body);
    updated.push_str(&document[end..]);
    Ok(updated)
}
