//! Content segmentation: splits raw assistant text into typed blocks.
//!
//! A priority-ordered scanner repeatedly locates the earliest-starting
//! match among the known patterns (fenced code block, pipe table, image
//! reference, object-literal blob), emits the text before it as markdown,
//! emits the match as its typed block, and continues on the remainder.
//! Ties on start offset are broken by pattern priority in that order.
//!
//! The scanner never fails on well-formed string input: unmatched or
//! partial syntax simply falls through to markdown. Concatenating the
//! source text of every segment reproduces the input exactly.

use std::ops::Range;

/// Minimum length for a bare payload to be classified as embedded base64.
const EMBEDDED_PAYLOAD_MIN_LEN: usize = 60;

/// Image reference carried by a [`Block::Image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Inline base64 payload (long single-alphabet run).
    Embedded(String),
    /// Anything else: a URL, path, or backend image uid.
    Direct(String),
}

impl ImageRef {
    /// The raw reference content, whichever way it is classified.
    pub fn content(&self) -> &str {
        match self {
            ImageRef::Embedded(content) | ImageRef::Direct(content) => content,
        }
    }
}

/// A classified contiguous span of assistant text.
///
/// Table and code contents are opaque leaves; nothing is re-detected
/// inside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Markdown(String),
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Code(String),
    Image(ImageRef),
}

/// One consumed span of input with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Byte range of the consumed source text (delimiters included).
    pub range: Range<usize>,
    pub block: Block,
}

struct PatternMatch {
    start: usize,
    end: usize,
    block: Block,
}

/// Splits `text` into classified segments covering every input byte.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(found) = find_earliest_match(text, cursor) else {
            segments.push(Segment {
                range: cursor..text.len(),
                block: Block::Markdown(text[cursor..].to_string()),
            });
            break;
        };
        if found.start > cursor {
            segments.push(Segment {
                range: cursor..found.start,
                block: Block::Markdown(text[cursor..found.start].to_string()),
            });
        }
        cursor = found.end;
        segments.push(Segment {
            range: found.start..found.end,
            block: found.block,
        });
    }

    segments
}

/// Splits `text` into typed blocks, pruning whitespace-only markdown.
pub fn detect_blocks(text: &str) -> Vec<Block> {
    segment(text)
        .into_iter()
        .filter(|segment| match &segment.block {
            Block::Markdown(markdown) => !markdown.trim().is_empty(),
            _ => true,
        })
        .map(|segment| segment.block)
        .collect()
}

/// Classifies an image reference as an embedded payload or a direct one.
pub fn classify_image(content: &str) -> ImageRef {
    if looks_like_embedded_payload(content) {
        ImageRef::Embedded(content.to_string())
    } else {
        ImageRef::Direct(content.to_string())
    }
}

fn looks_like_embedded_payload(content: &str) -> bool {
    content.len() >= EMBEDDED_PAYLOAD_MIN_LEN
        && content
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

fn find_earliest_match(text: &str, from: usize) -> Option<PatternMatch> {
    // Candidate order doubles as tie-break priority: min_by_key keeps the
    // first of equally early matches.
    let candidates = [
        match_code_fence(text, from),
        match_table(text, from),
        match_image(text, from),
        match_object_literal(text, from),
    ];
    candidates.into_iter().flatten().min_by_key(|m| m.start)
}

fn is_line_start(text: &str, pos: usize) -> bool {
    pos == 0 || text.as_bytes().get(pos - 1) == Some(&b'\n')
}

/// Exclusive end of the line starting at `start` (newline not included).
fn line_end(text: &str, start: usize) -> usize {
    text[start..].find('\n').map_or(text.len(), |i| start + i)
}

/// Byte just past the line starting at `start`, newline included.
fn after_line(text: &str, start: usize) -> usize {
    text[start..]
        .find('\n')
        .map_or(text.len(), |i| start + i + 1)
}

fn next_line_start(text: &str, pos: usize) -> Option<usize> {
    text[pos..].find('\n').map(|i| pos + i + 1)
}

fn first_line_start(text: &str, from: usize) -> Option<usize> {
    if is_line_start(text, from) {
        Some(from)
    } else {
        next_line_start(text, from)
    }
}

fn match_code_fence(text: &str, from: usize) -> Option<PatternMatch> {
    let mut search = from;
    while let Some(found) = text[search..].find("```") {
        let start = search + found;
        if !is_line_start(text, start) {
            search = start + 3;
            continue;
        }
        // The opening fence line must terminate; a dangling opener at end
        // of input is not a code block.
        let body_start = next_line_start(text, start)?;

        let mut close_search = body_start;
        while let Some(close_found) = text[close_search..].find("```") {
            let close_start = close_search + close_found;
            if !is_line_start(text, close_start) {
                close_search = close_start + 3;
                continue;
            }
            let inner = &text[body_start..close_start];
            let code = inner.strip_suffix('\n').unwrap_or(inner);
            return Some(PatternMatch {
                start,
                end: after_line(text, close_start),
                block: Block::Code(code.to_string()),
            });
        }
        // Unclosed fence: nothing after this point can form a code block.
        return None;
    }
    None
}

fn match_table(text: &str, from: usize) -> Option<PatternMatch> {
    let mut line_start = first_line_start(text, from)?;
    while line_start < text.len() {
        let header_end = line_end(text, line_start);
        let header = &text[line_start..header_end];
        if header.contains('|')
            && let Some(divider_start) = next_line_start(text, line_start)
        {
            let divider = &text[divider_start..line_end(text, divider_start)];
            if is_divider_row(divider) {
                let columns = split_row(header);
                let mut rows = Vec::new();
                let mut end = after_line(text, divider_start);
                let mut row_start = end;
                while row_start < text.len() {
                    let row = &text[row_start..line_end(text, row_start)];
                    if !row.contains('|') {
                        break;
                    }
                    rows.push(split_row(row));
                    end = after_line(text, row_start);
                    row_start = end;
                }
                return Some(PatternMatch {
                    start: line_start,
                    end,
                    block: Block::Table { columns, rows },
                });
            }
        }
        let Some(next) = next_line_start(text, line_start) else {
            break;
        };
        line_start = next;
    }
    None
}

/// A divider row looks like `| --- | :---: |`: every cell is dashes with
/// optional leading/trailing colons. Anything else fails the candidate.
fn is_divider_row(line: &str) -> bool {
    if !line.contains('|') {
        return false;
    }
    let cells = split_row(line);
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let body = cell.strip_prefix(':').unwrap_or(cell);
            let body = body.strip_suffix(':').unwrap_or(body);
            !body.is_empty() && body.bytes().all(|b| b == b'-')
        })
}

/// Splits a pipe row into trimmed cells, dropping the outer pipes.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn match_image(text: &str, from: usize) -> Option<PatternMatch> {
    let mut search = from;
    while let Some(found) = text[search..].find("![") {
        let start = search + found;
        let alt_start = start + 2;
        if let Some(bracket) = text[alt_start..].find(']') {
            let alt = &text[alt_start..alt_start + bracket];
            let after_bracket = alt_start + bracket + 1;
            if !alt.contains('\n') && text[after_bracket..].starts_with('(') {
                let target_start = after_bracket + 1;
                if let Some(paren) = text[target_start..].find(')') {
                    let target = &text[target_start..target_start + paren];
                    if !target.contains('\n') {
                        return Some(PatternMatch {
                            start,
                            end: target_start + paren + 1,
                            block: Block::Image(classify_image(target.trim())),
                        });
                    }
                }
            }
        }
        search = alt_start;
    }
    None
}

/// Matches a raw object-literal blob: a line whose first non-space bytes
/// open a quoted-key object, consumed through the balancing close brace.
fn match_object_literal(text: &str, from: usize) -> Option<PatternMatch> {
    let mut line_start = first_line_start(text, from)?;
    while line_start < text.len() {
        let rest = &text[line_start..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with("{\"") || trimmed.starts_with("{'") {
            let brace_start = line_start + (rest.len() - trimmed.len());
            if let Some(end) = find_balanced_close(text, brace_start) {
                return Some(PatternMatch {
                    start: brace_start,
                    end,
                    block: Block::Code(text[brace_start..end].to_string()),
                });
            }
        }
        let Some(next) = next_line_start(text, line_start) else {
            break;
        };
        line_start = next;
    }
    None
}

fn find_balanced_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, ch) in text[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(text: &str) -> String {
        segment(text)
            .iter()
            .map(|segment| &text[segment.range.clone()])
            .collect()
    }

    #[test]
    fn test_plain_markdown_is_one_block() {
        let blocks = detect_blocks("Hello **world**");
        assert_eq!(blocks, vec![Block::Markdown("Hello **world**".to_string())]);
    }

    #[test]
    fn test_detection_is_idempotent_on_markdown() {
        let blocks = detect_blocks("Just some *prose* here.");
        let Block::Markdown(markdown) = &blocks[0] else {
            panic!("expected markdown");
        };
        assert_eq!(detect_blocks(markdown), blocks);
    }

    #[test]
    fn test_prose_table_prose() {
        let text = "Before.\n| a | b |\n| --- | --- |\n| 1 | 2 |\n| 3 | 4 |\n| 5 | 6 |\nAfter.";
        let blocks = detect_blocks(text);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::Markdown("Before.\n".to_string()));
        let Block::Table { columns, rows } = &blocks[1] else {
            panic!("expected table");
        };
        assert_eq!(columns, &vec!["a".to_string(), "b".to_string()]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["5".to_string(), "6".to_string()]);
        assert_eq!(blocks[2], Block::Markdown("After.".to_string()));
    }

    #[test]
    fn test_bad_divider_falls_through_to_markdown() {
        let text = "| a | b |\n| oops | nope |\n| 1 | 2 |";
        let blocks = detect_blocks(text);
        assert_eq!(blocks, vec![Block::Markdown(text.to_string())]);
    }

    #[test]
    fn test_divider_with_alignment_colons() {
        let text = "| a | b |\n| :--- | ---: |\n| 1 | 2 |\n";
        let blocks = detect_blocks(text);
        assert!(matches!(blocks[0], Block::Table { .. }));
    }

    #[test]
    fn test_code_fence_contents_are_opaque() {
        let text = "intro\n```\n| a | b |\n| --- | --- |\n```\noutro";
        let blocks = detect_blocks(text);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1], Block::Code("| a | b |\n| --- | --- |".to_string()));
    }

    #[test]
    fn test_unclosed_fence_falls_through_to_markdown() {
        let text = "start\n```rust\nlet x = 1;";
        let blocks = detect_blocks(text);
        assert_eq!(blocks, vec![Block::Markdown(text.to_string())]);
    }

    #[test]
    fn test_image_direct_reference() {
        let blocks = detect_blocks("see ![diagram](images/arch.png) here");
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[1],
            Block::Image(ImageRef::Direct("images/arch.png".to_string()))
        );
    }

    #[test]
    fn test_image_embedded_payload() {
        let payload = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk";
        assert!(payload.len() >= EMBEDDED_PAYLOAD_MIN_LEN);
        let text = format!("![img]({payload})");
        let blocks = detect_blocks(&text);
        assert_eq!(blocks, vec![Block::Image(ImageRef::Embedded(payload.to_string()))]);
    }

    #[test]
    fn test_short_payload_stays_direct() {
        let blocks = detect_blocks("![img](abc123)");
        assert_eq!(blocks, vec![Block::Image(ImageRef::Direct("abc123".to_string()))]);
    }

    #[test]
    fn test_object_literal_blob_becomes_code() {
        let text = "above\n{\"type\": \"image\", \"content\": {\"uid\": \"x\"}}\nbelow";
        let blocks = detect_blocks(text);

        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[1],
            Block::Code("{\"type\": \"image\", \"content\": {\"uid\": \"x\"}}".to_string())
        );
    }

    #[test]
    fn test_unbalanced_object_literal_is_markdown() {
        let text = "{\"type\": \"image\"";
        assert_eq!(detect_blocks(text), vec![Block::Markdown(text.to_string())]);
    }

    #[test]
    fn test_earliest_match_wins() {
        // The image appears before the table, so it must be emitted first.
        let text = "![a](b)\n| x | y |\n| --- | --- |\n| 1 | 2 |\n";
        let blocks = detect_blocks(text);
        assert!(matches!(blocks[0], Block::Image(_)));
        assert!(matches!(blocks[1], Block::Table { .. }));
    }

    #[test]
    fn test_whitespace_only_markdown_is_pruned() {
        let text = "```\na\n```\n\n```\nb\n```";
        let blocks = detect_blocks(text);
        assert_eq!(
            blocks,
            vec![Block::Code("a".to_string()), Block::Code("b".to_string())]
        );
    }

    #[test]
    fn test_segments_reconstruct_input_exactly() {
        let inputs = [
            "",
            "plain prose only",
            "Before.\n| a | b |\n| --- | --- |\n| 1 | 2 |\nAfter.",
            "```\ncode\n```\ntrailing",
            "mixed ![i](x) and\n{\"k\": \"v\"}\nand | not | a table\ndone",
            "| broken |\n| divider? |\n",
            "unterminated ```\nfence",
            "unicode → émoji 👋 and ![é](ü)",
        ];
        for input in inputs {
            assert_eq!(reconstruct(input), input, "lossy segmentation of {input:?}");
        }
    }
}
