use crate::block::{StyleState, TextRun};
use crate::config::SoftBreak;
use crate::runs::{normalize, text_runs};
use crate::syntax::SyntaxNode;

/// Map the inline children of one block to normalized text runs.
///
/// Every call starts from an unstyled, unlinked state; nothing carries over
/// between blocks or table cells.
pub fn map_inline(children: &[SyntaxNode], soft_break: SoftBreak) -> Vec<TextRun> {
    let mut runs = Vec::new();
    walk(children, StyleState::default(), soft_break, &mut runs);
    normalize(runs)
}

fn walk(nodes: &[SyntaxNode], style: StyleState, soft_break: SoftBreak, out: &mut Vec<TextRun>) {
    for node in nodes {
        match node {
            SyntaxNode::Text(text) => out.extend(text_runs(text, &style)),
            SyntaxNode::InlineCode(code) => out.extend(text_runs(code, &style.code())),
            SyntaxNode::Strong(children) => walk(children, style.bold(), soft_break, out),
            SyntaxNode::Emphasis(children) => walk(children, style.italic(), soft_break, out),
            SyntaxNode::Strikethrough(children) => {
                walk(children, style.strikethrough(), soft_break, out)
            }
            SyntaxNode::Link { url, children } => {
                walk(children, style.linked(url.as_str()), soft_break, out)
            }
            SyntaxNode::HardBreak => out.push(TextRun::new("\n", style.unlinked())),
            SyntaxNode::SoftBreak => {
                let text = match soft_break {
                    SoftBreak::Newline => "\n",
                    SoftBreak::Space => " ",
                };
                out.push(TextRun::new(text, style.unlinked()));
            }
            SyntaxNode::UnknownInline { children, .. }
            | SyntaxNode::Inline(children)
            | SyntaxNode::Paragraph(children) => walk(children, style.clone(), soft_break, out),
            // Block constructs never appear inside inline content
            SyntaxNode::Heading { .. }
            | SyntaxNode::List { .. }
            | SyntaxNode::Item { .. }
            | SyntaxNode::CodeBlock { .. }
            | SyntaxNode::BlockQuote(_)
            | SyntaxNode::Table { .. }
            | SyntaxNode::ThematicBreak
            | SyntaxNode::UnknownBlock { .. } => {
                tracing::debug!("Skipping block node inside inline content");
            }
        }
    }
}
