//! Semantic section tags within assistant text.
//!
//! One layer above the block detector. Two tag families are matched left
//! to right, never nested: closed tags (`<brief_summary>…</brief_summary>`,
//! `<detailed_summary>…</detailed_summary>`, `<history>…</history>`) and
//! prefix markers (`[reasoning]`, `[reply]`) whose content runs to the
//! next recognized tag or the end of the string.
//!
//! An opened closed-tag with no matching end is not recognized at all and
//! stays ordinary text. Text outside recognized tags goes straight to the
//! block detector, so tagless input degrades to plain block rendering.

use super::blocks::{Block, detect_blocks};

/// Prefix marker opening a collapsible reasoning section.
pub const REASONING_MARKER: &str = "[reasoning]";
/// Prefix marker opening the primary visible reply.
pub const REPLY_MARKER: &str = "[reply]";

/// Semantic kind of a tagged section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `<brief_summary>`: rendered inline.
    Brief,
    /// `<detailed_summary>`: rendered as a collapsible section.
    Detailed,
    /// `<history>`: a single embedded-frame descriptor, not markdown.
    History,
    /// `[reasoning]` prefix: collapsible reasoning section.
    Reasoning,
    /// `[reply]` prefix: the primary visible reply.
    Reply,
}

impl SectionKind {
    /// Whether the renderer collapses this section by default.
    pub fn collapsible(self) -> bool {
        matches!(self, SectionKind::Detailed | SectionKind::Reasoning)
    }
}

/// Body of a section: detector blocks, or an embedded-frame descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Blocks(Vec<Block>),
    Frame(String),
}

/// A semantically tagged region of assistant text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

/// One node of the render tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Untagged text, rendered inline as plain blocks.
    Inline(Vec<Block>),
    Section(Section),
}

const CLOSED_TAGS: [(SectionKind, &str, &str); 3] = [
    (SectionKind::Brief, "<brief_summary>", "</brief_summary>"),
    (SectionKind::Detailed, "<detailed_summary>", "</detailed_summary>"),
    (SectionKind::History, "<history>", "</history>"),
];

const PREFIX_TAGS: [(SectionKind, &str); 2] = [
    (SectionKind::Reasoning, REASONING_MARKER),
    (SectionKind::Reply, REPLY_MARKER),
];

enum TagSite {
    Closed {
        kind: SectionKind,
        inner_start: usize,
        inner_end: usize,
        end: usize,
    },
    Prefix {
        kind: SectionKind,
        content_start: usize,
    },
}

/// Finds the earliest recognized tag at or after `from`.
///
/// A closed tag only counts when its closer exists; an orphaned opener is
/// skipped and will fall out as ordinary text.
fn find_tag(text: &str, from: usize) -> Option<(usize, TagSite)> {
    let mut earliest: Option<(usize, TagSite)> = None;

    for (kind, opener, closer) in CLOSED_TAGS {
        let mut search = from;
        while let Some(found) = text[search..].find(opener) {
            let start = search + found;
            let inner_start = start + opener.len();
            if let Some(close) = text[inner_start..].find(closer) {
                let inner_end = inner_start + close;
                let site = TagSite::Closed {
                    kind,
                    inner_start,
                    inner_end,
                    end: inner_end + closer.len(),
                };
                if earliest.as_ref().is_none_or(|(at, _)| start < *at) {
                    earliest = Some((start, site));
                }
                break;
            }
            // Orphaned opener; keep looking for one with a closer.
            search = inner_start;
        }
    }

    for (kind, marker) in PREFIX_TAGS {
        if let Some(found) = text[from..].find(marker) {
            let start = from + found;
            let site = TagSite::Prefix {
                kind,
                content_start: start + marker.len(),
            };
            if earliest.as_ref().is_none_or(|(at, _)| start < *at) {
                earliest = Some((start, site));
            }
        }
    }

    earliest
}

/// Parses assistant text into the section-level render tree.
pub fn parse_sections(text: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some((start, site)) = find_tag(text, cursor) else {
            push_inline(&mut fragments, &text[cursor..]);
            break;
        };
        if start > cursor {
            push_inline(&mut fragments, &text[cursor..start]);
        }
        match site {
            TagSite::Closed {
                kind,
                inner_start,
                inner_end,
                end,
            } => {
                let inner = &text[inner_start..inner_end];
                let body = if kind == SectionKind::History {
                    SectionBody::Frame(inner.trim().to_string())
                } else {
                    SectionBody::Blocks(detect_blocks(inner))
                };
                fragments.push(Fragment::Section(Section { kind, body }));
                cursor = end;
            }
            TagSite::Prefix {
                kind,
                content_start,
            } => {
                let content_end =
                    find_tag(text, content_start).map_or(text.len(), |(next, _)| next);
                let body = SectionBody::Blocks(detect_blocks(&text[content_start..content_end]));
                fragments.push(Fragment::Section(Section { kind, body }));
                cursor = content_end;
            }
        }
    }

    fragments
}

fn push_inline(fragments: &mut Vec<Fragment>, text: &str) {
    let blocks = detect_blocks(text);
    if !blocks.is_empty() {
        fragments.push(Fragment::Inline(blocks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markdown(text: &str) -> Block {
        Block::Markdown(text.to_string())
    }

    #[test]
    fn test_untagged_text_is_inline() {
        let fragments = parse_sections("just prose");
        assert_eq!(fragments, vec![Fragment::Inline(vec![markdown("just prose")])]);
    }

    #[test]
    fn test_detailed_summary_then_untagged_tail() {
        let fragments = parse_sections("<detailed_summary>foo</detailed_summary>bar");
        assert_eq!(
            fragments,
            vec![
                Fragment::Section(Section {
                    kind: SectionKind::Detailed,
                    body: SectionBody::Blocks(vec![markdown("foo")]),
                }),
                Fragment::Inline(vec![markdown("bar")]),
            ]
        );
    }

    #[test]
    fn test_brief_summary_renders_inline_kind() {
        let fragments = parse_sections("<brief_summary>tl;dr</brief_summary>");
        let Fragment::Section(section) = &fragments[0] else {
            panic!("expected section");
        };
        assert_eq!(section.kind, SectionKind::Brief);
        assert!(!section.kind.collapsible());
    }

    #[test]
    fn test_history_is_a_frame_descriptor() {
        let fragments = parse_sections("<history> conv-123 </history>");
        assert_eq!(
            fragments,
            vec![Fragment::Section(Section {
                kind: SectionKind::History,
                body: SectionBody::Frame("conv-123".to_string()),
            })]
        );
    }

    #[test]
    fn test_prefix_tags_run_to_next_tag() {
        let fragments = parse_sections("[reasoning]think first[reply]the answer");
        assert_eq!(fragments.len(), 2);
        assert_eq!(
            fragments[0],
            Fragment::Section(Section {
                kind: SectionKind::Reasoning,
                body: SectionBody::Blocks(vec![markdown("think first")]),
            })
        );
        assert_eq!(
            fragments[1],
            Fragment::Section(Section {
                kind: SectionKind::Reply,
                body: SectionBody::Blocks(vec![markdown("the answer")]),
            })
        );
    }

    #[test]
    fn test_prefix_content_stops_at_closed_tag() {
        let fragments =
            parse_sections("[reply]answer<brief_summary>short</brief_summary>");
        assert_eq!(fragments.len(), 2);
        let Fragment::Section(reply) = &fragments[0] else {
            panic!("expected section");
        };
        assert_eq!(reply.body, SectionBody::Blocks(vec![markdown("answer")]));
    }

    #[test]
    fn test_unclosed_tag_is_ordinary_text() {
        let text = "<detailed_summary>never closed";
        let fragments = parse_sections(text);
        assert_eq!(fragments, vec![Fragment::Inline(vec![markdown(text)])]);
    }

    #[test]
    fn test_lone_closing_tag_is_ordinary_text() {
        let text = "before </history> after";
        let fragments = parse_sections(text);
        assert_eq!(fragments, vec![Fragment::Inline(vec![markdown(text)])]);
    }

    #[test]
    fn test_first_opener_pairs_with_the_closer() {
        let fragments = parse_sections("<history>lost <history>found</history>");
        assert_eq!(
            fragments,
            vec![Fragment::Section(Section {
                kind: SectionKind::History,
                body: SectionBody::Frame("lost <history>found".to_string()),
            })]
        );
    }

    #[test]
    fn test_text_between_tags_is_inline() {
        let fragments = parse_sections(
            "<brief_summary>a</brief_summary> between [reply]end",
        );
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[1], Fragment::Inline(vec![markdown(" between ")]));
    }

    #[test]
    fn test_section_text_delegates_to_detector() {
        let fragments =
            parse_sections("<detailed_summary>intro\n```\ncode\n```\n</detailed_summary>");
        let Fragment::Section(section) = &fragments[0] else {
            panic!("expected section");
        };
        let SectionBody::Blocks(blocks) = &section.body else {
            panic!("expected blocks");
        };
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], Block::Code("code".to_string()));
    }
}
