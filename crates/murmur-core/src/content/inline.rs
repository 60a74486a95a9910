//! Inline markdown span parsing for markdown block rendering.
//!
//! Markdown blocks stay raw strings in the render tree; this parses one
//! into styled spans when the renderer needs emphasis and inline code.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// Inline emphasis applied to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineStyle {
    #[default]
    Plain,
    Bold,
    Italic,
    Code,
}

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub style: InlineStyle,
}

/// Parses markdown text into styled spans.
///
/// Block structure (headings, lists, paragraphs) is flattened; only the
/// inline styles survive. Consecutive same-style runs are merged.
pub fn inline_spans(text: &str) -> Vec<InlineSpan> {
    let parser = Parser::new_ext(text, Options::empty());
    let mut spans: Vec<InlineSpan> = Vec::new();
    let mut stack = vec![InlineStyle::Plain];

    for event in parser {
        match event {
            Event::Start(Tag::Strong) => stack.push(InlineStyle::Bold),
            Event::Start(Tag::Emphasis) => stack.push(InlineStyle::Italic),
            Event::End(TagEnd::Strong | TagEnd::Emphasis) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(text) => push_span(&mut spans, &text, current(&stack)),
            Event::Code(code) => push_span(&mut spans, &code, InlineStyle::Code),
            Event::SoftBreak | Event::HardBreak => push_span(&mut spans, "\n", current(&stack)),
            _ => {}
        }
    }

    spans
}

fn current(stack: &[InlineStyle]) -> InlineStyle {
    stack.last().copied().unwrap_or(InlineStyle::Plain)
}

fn push_span(spans: &mut Vec<InlineSpan>, text: &str, style: InlineStyle) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.style == style
    {
        last.text.push_str(text);
        return;
    }
    spans.push(InlineSpan {
        text: text.to_string(),
        style,
    });
}
