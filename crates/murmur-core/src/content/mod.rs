//! Assistant content parsing: block segmentation, inline spans, and
//! semantic sections.

pub mod blocks;
pub mod inline;
pub mod sections;

pub use blocks::{Block, ImageRef, Segment, classify_image, detect_blocks, segment};
pub use inline::{InlineSpan, InlineStyle, inline_spans};
pub use sections::{Fragment, Section, SectionBody, SectionKind, parse_sections};

use crate::convo::{ContentKind, ContentPart};

/// Builds the render tree for one assistant message.
///
/// Image parts become inline image blocks directly; message parts go
/// through the tag parser and from there to the block detector.
pub fn render_message(parts: &[ContentPart]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for part in parts {
        match part.kind {
            ContentKind::Image => fragments.push(Fragment::Inline(vec![Block::Image(
                classify_image(&part.content),
            )])),
            ContentKind::Message => fragments.extend(parse_sections(&part.content)),
        }
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_message_mixes_parts() {
        let parts = vec![
            ContentPart::message("<brief_summary>hi</brief_summary>"),
            ContentPart::image("img-7"),
        ];
        let fragments = render_message(&parts);

        assert_eq!(fragments.len(), 2);
        assert!(matches!(
            &fragments[0],
            Fragment::Section(section) if section.kind == SectionKind::Brief
        ));
        assert_eq!(
            fragments[1],
            Fragment::Inline(vec![Block::Image(ImageRef::Direct("img-7".to_string()))])
        );
    }

    #[test]
    fn test_render_message_empty_parts() {
        assert!(render_message(&[]).is_empty());
    }
}
