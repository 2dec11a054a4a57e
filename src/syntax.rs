//! Markdown syntax tree.
//!
//! pulldown-cmark produces a flat stream of start/end events. This module
//! folds that stream into a tree of [`SyntaxNode`] values using a stack of
//! open frames: `Start` pushes a frame, content events append to the frame on
//! top, and `End` pops the frame, closes it into a node and appends the node
//! to its parent.
//!
//! Inline content that sits directly inside a block container (tight list
//! items, HTML blocks, the document root) is grouped into
//! [`SyntaxNode::Inline`] wrappers so block-level consumers only ever see
//! block nodes in a container's child list.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::error::MarkdownParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    // Block nodes
    Heading { level: u8, children: Vec<SyntaxNode> },
    Paragraph(Vec<SyntaxNode>),
    /// Inline content not wrapped in a paragraph.
    Inline(Vec<SyntaxNode>),
    List { ordered: bool, items: Vec<SyntaxNode> },
    Item { checked: Option<bool>, children: Vec<SyntaxNode> },
    CodeBlock { info: Option<String>, text: String },
    BlockQuote(Vec<SyntaxNode>),
    Table { rows: Vec<TableRow> },
    ThematicBreak,
    /// A block construct with no dedicated mapping (HTML blocks, footnote
    /// definitions, metadata).
    UnknownBlock { kind: &'static str, children: Vec<SyntaxNode> },

    // Inline nodes
    Text(String),
    Emphasis(Vec<SyntaxNode>),
    Strong(Vec<SyntaxNode>),
    Strikethrough(Vec<SyntaxNode>),
    InlineCode(String),
    Link { url: String, children: Vec<SyntaxNode> },
    SoftBreak,
    HardBreak,
    /// An inline construct with no dedicated mapping (images).
    UnknownInline { kind: &'static str, children: Vec<SyntaxNode> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<Vec<SyntaxNode>>,
}

impl SyntaxNode {
    pub fn text(text: impl Into<String>) -> Self {
        SyntaxNode::Text(text.into())
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            SyntaxNode::Text(_)
                | SyntaxNode::Emphasis(_)
                | SyntaxNode::Strong(_)
                | SyntaxNode::Strikethrough(_)
                | SyntaxNode::InlineCode(_)
                | SyntaxNode::Link { .. }
                | SyntaxNode::SoftBreak
                | SyntaxNode::HardBreak
                | SyntaxNode::UnknownInline { .. }
        )
    }

    /// A node that carries no visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            SyntaxNode::Text(text) => text.trim().is_empty(),
            SyntaxNode::SoftBreak | SyntaxNode::HardBreak => true,
            SyntaxNode::Inline(children) | SyntaxNode::Paragraph(children) => {
                children.iter().all(SyntaxNode::is_blank)
            }
            _ => false,
        }
    }
}

/// Tokenizer options: CommonMark plus tables, task lists and strikethrough.
pub fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Tokenize markdown and fold it into a syntax tree.
pub fn parse(markdown: &str) -> Result<Vec<SyntaxNode>, MarkdownParseError> {
    build_tree(Parser::new_ext(markdown, options()))
}

struct Frame<'a> {
    tag: Option<Tag<'a>>,
    children: Vec<SyntaxNode>,
    checked: Option<bool>,
    cells: Vec<Vec<SyntaxNode>>,
    rows: Vec<TableRow>,
}

impl<'a> Frame<'a> {
    fn new(tag: Option<Tag<'a>>) -> Self {
        Self {
            tag,
            children: Vec::new(),
            checked: None,
            cells: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn is_item(&self) -> bool {
        matches!(self.tag, Some(Tag::Item))
    }
}

/// What a frame turns into once its end event arrives.
enum Closed {
    Node(SyntaxNode),
    Row(TableRow),
    Cell(Vec<SyntaxNode>),
}

/// Fold a pulldown-cmark event stream into top-level syntax nodes.
pub fn build_tree<'a>(
    events: impl IntoIterator<Item = Event<'a>>,
) -> Result<Vec<SyntaxNode>, MarkdownParseError> {
    let mut stack = vec![Frame::new(None)];

    for event in events {
        match event {
            Event::Start(tag) => stack.push(Frame::new(Some(tag))),
            Event::End(end) => {
                let Some(frame) = stack.pop() else {
                    return Err(MarkdownParseError::UnexpectedEnd(format!("{end:?}")));
                };
                let Some(tag) = frame.tag.as_ref() else {
                    return Err(MarkdownParseError::UnexpectedEnd(format!("{end:?}")));
                };
                if tag.to_end() != end {
                    return Err(MarkdownParseError::MismatchedEnd {
                        expected: format!("{:?}", tag.to_end()),
                        found: format!("{end:?}"),
                    });
                }
                let closed = close(frame);
                let Some(parent) = stack.last_mut() else {
                    return Err(MarkdownParseError::UnexpectedEnd(format!("{end:?}")));
                };
                match closed {
                    Closed::Node(node) => parent.children.push(node),
                    Closed::Row(row) => parent.rows.push(row),
                    Closed::Cell(cell) => parent.cells.push(cell),
                }
            }
            Event::TaskListMarker(checked) => {
                if let Some(item) = stack.iter_mut().rev().find(|frame| frame.is_item()) {
                    item.checked = Some(checked);
                }
            }
            Event::Rule => push(&mut stack, SyntaxNode::ThematicBreak),
            Event::SoftBreak => push(&mut stack, SyntaxNode::SoftBreak),
            Event::HardBreak => push(&mut stack, SyntaxNode::HardBreak),
            Event::Code(code) => push(&mut stack, SyntaxNode::InlineCode(code.into_string())),
            Event::FootnoteReference(label) => {
                push(&mut stack, SyntaxNode::Text(format!("[^{}]", &*label)))
            }
            // Raw HTML and math are kept as literal text
            Event::Text(text)
            | Event::Html(text)
            | Event::InlineHtml(text)
            | Event::InlineMath(text)
            | Event::DisplayMath(text) => push(&mut stack, SyntaxNode::Text(text.into_string())),
        }
    }

    if stack.len() != 1 {
        return Err(MarkdownParseError::Unclosed(stack.len() - 1));
    }
    let root = stack.pop().map(|frame| frame.children).unwrap_or_default();
    Ok(group_inlines(root))
}

fn push(stack: &mut [Frame<'_>], node: SyntaxNode) {
    if let Some(frame) = stack.last_mut() {
        frame.children.push(node);
    }
}

fn close(frame: Frame<'_>) -> Closed {
    let Frame {
        tag,
        children,
        checked,
        cells,
        rows,
    } = frame;
    let Some(tag) = tag else {
        return Closed::Node(SyntaxNode::Inline(children));
    };

    let node = match tag {
        Tag::Paragraph => SyntaxNode::Paragraph(children),
        Tag::Heading { level, .. } => SyntaxNode::Heading {
            level: heading_level_to_u8(level),
            children,
        },
        Tag::BlockQuote(_) => SyntaxNode::BlockQuote(group_inlines(children)),
        Tag::CodeBlock(kind) => {
            let info = match kind {
                CodeBlockKind::Fenced(info) if !info.trim().is_empty() => Some(info.into_string()),
                _ => None,
            };
            SyntaxNode::CodeBlock {
                info,
                text: plain_text(&children),
            }
        }
        Tag::HtmlBlock => {
            let html = plain_text(&children);
            SyntaxNode::UnknownBlock {
                kind: "html_block",
                children: vec![SyntaxNode::Inline(vec![SyntaxNode::Text(
                    html.trim_end_matches('\n').to_string(),
                )])],
            }
        }
        Tag::List(start) => SyntaxNode::List {
            ordered: start.is_some(),
            items: children,
        },
        Tag::Item => SyntaxNode::Item {
            checked,
            children: group_inlines(children),
        },
        Tag::Table(_) => SyntaxNode::Table { rows },
        Tag::TableHead => return Closed::Row(TableRow { header: true, cells }),
        Tag::TableRow => {
            return Closed::Row(TableRow {
                header: false,
                cells,
            });
        }
        Tag::TableCell => return Closed::Cell(children),
        Tag::Emphasis => SyntaxNode::Emphasis(children),
        Tag::Strong => SyntaxNode::Strong(children),
        Tag::Strikethrough => SyntaxNode::Strikethrough(children),
        Tag::Link { dest_url, .. } => SyntaxNode::Link {
            url: dest_url.into_string(),
            children,
        },
        Tag::Image { .. } => SyntaxNode::UnknownInline {
            kind: "image",
            children,
        },
        Tag::MetadataBlock(_) => SyntaxNode::UnknownBlock {
            kind: "metadata",
            children: Vec::new(),
        },
        Tag::FootnoteDefinition(_) => SyntaxNode::UnknownBlock {
            kind: "footnote_definition",
            children: group_inlines(children),
        },
        _ => SyntaxNode::UnknownBlock {
            kind: "other",
            children: group_inlines(children),
        },
    };
    Closed::Node(node)
}

/// Wrap each run of consecutive inline nodes in a [`SyntaxNode::Inline`].
fn group_inlines(children: Vec<SyntaxNode>) -> Vec<SyntaxNode> {
    let mut grouped = Vec::with_capacity(children.len());
    let mut pending = Vec::new();
    for child in children {
        if child.is_inline() {
            pending.push(child);
            continue;
        }
        if !pending.is_empty() {
            grouped.push(SyntaxNode::Inline(std::mem::take(&mut pending)));
        }
        grouped.push(child);
    }
    if !pending.is_empty() {
        grouped.push(SyntaxNode::Inline(pending));
    }
    grouped
}

fn plain_text(children: &[SyntaxNode]) -> String {
    children
        .iter()
        .filter_map(|child| match child {
            SyntaxNode::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
