use tracing::{debug, warn};

use crate::block::{Block, CHILDREN_LIMIT, StyleState, TableRow, TextRun};
use crate::config::Config;
use crate::error::MarkdownParseError;
use crate::inline::map_inline;
use crate::runs::normalize;
use crate::syntax::{self, SyntaxNode};

/// Parse markdown text into a list of blocks
pub fn parse(markdown: &str, config: &Config) -> Result<Vec<Block>, MarkdownParseError> {
    if markdown.trim().is_empty() {
        return Ok(Vec::new());
    }

    let tree = syntax::parse(markdown)?;
    let blocks = Mapper { config }.convert_all(&tree);
    debug!(nodes = tree.len(), blocks = blocks.len(), "Converted markdown");
    Ok(blocks)
}

/// Maps syntax nodes to output blocks.
pub struct Mapper<'c> {
    config: &'c Config,
}

impl<'c> Mapper<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    pub fn convert_all<'n>(&self, nodes: impl IntoIterator<Item = &'n SyntaxNode>) -> Vec<Block> {
        let mut blocks = Vec::new();
        for node in nodes {
            self.convert(node, &mut blocks);
        }
        blocks
    }

    fn convert(&self, node: &SyntaxNode, out: &mut Vec<Block>) {
        match node {
            SyntaxNode::Heading { level, children } => out.push(Block::Heading {
                level: (*level).clamp(1, 3),
                runs: self.inline(children),
            }),
            SyntaxNode::Paragraph(children) | SyntaxNode::Inline(children) => {
                let runs = self.inline(children);
                // Blank paragraphs are dropped
                if !runs.is_empty() {
                    out.push(Block::Paragraph { runs });
                }
            }
            SyntaxNode::List { ordered, items } => {
                for item in truncated(items, "list items") {
                    match item {
                        SyntaxNode::Item { checked, children } => {
                            out.push(self.list_item(*ordered, *checked, children))
                        }
                        other => self.convert(other, out),
                    }
                }
            }
            // An item outside a list only happens in hand-built trees
            SyntaxNode::Item { checked, children } => {
                out.push(self.list_item(false, *checked, children))
            }
            SyntaxNode::CodeBlock { info, text } => {
                out.push(self.code_block(info.as_deref(), text))
            }
            SyntaxNode::BlockQuote(children) => self.quote(children, out),
            SyntaxNode::Table { rows } => out.push(self.table(rows)),
            SyntaxNode::ThematicBreak => out.push(Block::Divider),
            SyntaxNode::UnknownBlock { kind, children } => {
                if children.is_empty() {
                    debug!(kind, "Skipping empty block");
                } else {
                    out.extend(self.convert_all(children));
                }
            }
            inline => {
                let runs = self.inline(std::slice::from_ref(inline));
                if !runs.is_empty() {
                    out.push(Block::Paragraph { runs });
                }
            }
        }
    }

    fn inline(&self, children: &[SyntaxNode]) -> Vec<TextRun> {
        map_inline(children, self.config.inline.soft_break)
    }

    fn list_item(&self, ordered: bool, checked: Option<bool>, content: &[SyntaxNode]) -> Block {
        let mut content = content.iter().filter(|node| !node.is_blank());

        // The first paragraph-like child is the item's own text; everything
        // after it nests underneath.
        let (runs, children) = match content.next() {
            Some(SyntaxNode::Paragraph(title) | SyntaxNode::Inline(title)) => {
                (self.inline(title), self.convert_all(content))
            }
            Some(first) => (
                Vec::new(),
                self.convert_all(std::iter::once(first).chain(content)),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let children = truncate(children, "nested blocks");

        match checked {
            Some(checked) => Block::ChecklistItem {
                runs,
                checked,
                children,
            },
            None if ordered => Block::NumberedItem { runs, children },
            None => Block::BulletedItem { runs, children },
        }
    }

    fn code_block(&self, info: Option<&str>, text: &str) -> Block {
        let language = self.config.code.language_for(info);
        let style = StyleState::default().code();
        Block::Code {
            language,
            runs: normalize(vec![TextRun::new(trim_blank_lines(text), style)]),
        }
    }

    fn quote(&self, children: &[SyntaxNode], out: &mut Vec<Block>) {
        for child in children {
            match child {
                SyntaxNode::Paragraph(inline) | SyntaxNode::Inline(inline) => {
                    let runs = self.inline(inline);
                    if !runs.is_empty() {
                        out.push(Block::Quote { runs });
                    }
                }
                other => debug!(?other, "Dropping nested content inside block quote"),
            }
        }
    }

    fn table(&self, rows: &[syntax::TableRow]) -> Block {
        let has_header = rows.iter().any(|row| row.header);
        let mapped: Vec<TableRow> = rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| self.inline(cell)).collect())
            .collect();
        // Rows may be ragged; the widest one decides
        let width = mapped.iter().map(Vec::len).max().unwrap_or(0);
        Block::Table {
            width,
            has_header,
            rows: truncate(mapped, "table rows"),
        }
    }
}

fn truncated<'a, T>(items: &'a [T], what: &str) -> &'a [T] {
    if items.len() > CHILDREN_LIMIT {
        warn!(
            "Dropping {} of {} {}: limit is {}",
            items.len() - CHILDREN_LIMIT,
            items.len(),
            what,
            CHILDREN_LIMIT
        );
        &items[..CHILDREN_LIMIT]
    } else {
        items
    }
}

fn truncate<T>(mut items: Vec<T>, what: &str) -> Vec<T> {
    let keep = truncated(&items, what).len();
    items.truncate(keep);
    items
}

/// Remove blank lines before the first and after the last line with content.
fn trim_blank_lines(text: &str) -> &str {
    let start: usize = text
        .split_inclusive('\n')
        .take_while(|line| line.trim().is_empty())
        .map(str::len)
        .sum();
    let body = &text[start..];
    let Some(last) = body.rfind(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let end = body[last..].find('\n').map_or(body.len(), |offset| last + offset);
    body[..end].trim_end_matches('\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::TableRow as SyntaxRow;

    fn convert(markdown: &str) -> Vec<Block> {
        parse(markdown, &Config::compiled_default()).unwrap()
    }

    fn text_of(runs: &[TextRun]) -> String {
        runs.iter().map(|run| run.content.as_str()).collect()
    }

    #[test]
    fn empty_input() {
        assert!(convert("").is_empty());
        assert!(convert("   \t  ").is_empty());
        assert!(convert("\n\n\n").is_empty());
    }

    #[test]
    fn heading_levels_are_clamped() {
        let blocks = convert("# One\n\n## Two\n\n###### Six");
        let kinds: Vec<&str> = blocks.iter().map(Block::kind).collect();
        assert_eq!(kinds, vec!["heading_1", "heading_2", "heading_3"]);
        assert_eq!(blocks[2].plain_text(), "Six");
    }

    #[test]
    fn paragraphs() {
        let blocks = convert("First para.\n\nSecond *para*.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            Block::Paragraph {
                runs: vec![TextRun::plain("First para.")]
            }
        );
        assert_eq!(blocks[1].plain_text(), "Second para.");
    }

    #[test]
    fn nested_list() {
        let blocks = convert("- Item 1\n  - Sub 1.1\n- Item 2");
        assert_eq!(blocks.len(), 2);
        let Block::BulletedItem { runs, children } = &blocks[0] else {
            panic!("expected bulleted item, got {:?}", blocks[0]);
        };
        assert_eq!(text_of(runs), "Item 1");
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0], Block::BulletedItem { .. }));
        assert_eq!(children[0].plain_text(), "Sub 1.1");
        assert_eq!(blocks[1].plain_text(), "Item 2");
        assert!(blocks[1].children().is_empty());
    }

    #[test]
    fn ordered_list() {
        let blocks = convert("1. one\n2. two");
        assert!(blocks.iter().all(|b| matches!(b, Block::NumberedItem { .. })));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn loose_list_item_with_trailing_paragraph() {
        let blocks = convert("- title\n\n  more text\n\n- next");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "title");
        assert_eq!(
            blocks[0].children(),
            &[Block::Paragraph {
                runs: vec![TextRun::plain("more text")]
            }]
        );
    }

    #[test]
    fn item_starting_with_code_nests_everything() {
        let blocks = convert("- ```\n  code\n  ```\n  after");
        let Block::BulletedItem { runs, children } = &blocks[0] else {
            panic!("expected bulleted item");
        };
        assert!(runs.is_empty());
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Block::Code { .. }));
        assert_eq!(children[1].plain_text(), "after");
    }

    #[test]
    fn task_list() {
        let blocks = convert("- [x] Done task\n- [ ] Pending task");
        assert_eq!(
            blocks,
            vec![
                Block::ChecklistItem {
                    runs: vec![TextRun::plain("Done task")],
                    checked: true,
                    children: vec![],
                },
                Block::ChecklistItem {
                    runs: vec![TextRun::plain("Pending task")],
                    checked: false,
                    children: vec![],
                },
            ]
        );
    }

    #[test]
    fn list_items_are_truncated() {
        let markdown: String = (0..150).map(|i| format!("- item {i}\n")).collect();
        let blocks = convert(&markdown);
        assert_eq!(blocks.len(), CHILDREN_LIMIT);
        assert_eq!(blocks[99].plain_text(), "item 99");
    }

    #[test]
    fn nested_children_are_truncated() {
        let nested: String = (0..120).map(|i| format!("  - sub {i}\n")).collect();
        let blocks = convert(&format!("- parent\n{nested}"));
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].children().len(), CHILDREN_LIMIT);
    }

    #[test]
    fn code_block_language_and_content() {
        let blocks = convert("```py extra\n\n\nprint(1)\n  indented\n\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "python".to_string(),
                runs: vec![TextRun::new(
                    "print(1)\n  indented",
                    StyleState::default().code()
                )],
            }]
        );
    }

    #[test]
    fn code_block_defaults_to_plain_text() {
        let blocks = convert("```\nx\n```\n\n    indented code");
        let languages: Vec<&str> = blocks
            .iter()
            .map(|block| match block {
                Block::Code { language, .. } => language.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(languages, vec!["plain text", "plain text"]);
        assert_eq!(blocks[1].plain_text(), "indented code");
    }

    #[test]
    fn code_block_keeps_markdown_literal() {
        let blocks = convert("```md\n**not bold**\n```");
        assert_eq!(blocks[0].runs()[0].content, "**not bold**");
        assert!(!blocks[0].runs()[0].style.bold);
    }

    #[test]
    fn long_code_block_is_split() {
        let code = "c".repeat(4500);
        let blocks = convert(&format!("```\n{code}\n```"));
        let lens: Vec<usize> = blocks[0].runs().iter().map(TextRun::char_len).collect();
        assert_eq!(lens, vec![2000, 2000, 500]);
    }

    #[test]
    fn quote_keeps_first_level_paragraphs() {
        let blocks = convert("> quoted **text**\n>\n> - dropped item");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), "quote");
        assert_eq!(blocks[0].plain_text(), "quoted text");
    }

    #[test]
    fn rule_becomes_divider() {
        assert_eq!(convert("a\n\n---\n\nb")[1], Block::Divider);
    }

    #[test]
    fn table_from_markdown() {
        let blocks = convert(
            "| Header 1 | Header 2 |\n| --- | --- |\n| Cell 1 | Cell 2 |\n| Cell 3 | Cell 4 |",
        );
        let Block::Table {
            width,
            has_header,
            rows,
        } = &blocks[0]
        else {
            panic!("expected table");
        };
        assert_eq!(*width, 2);
        assert!(*has_header);
        assert_eq!(rows.len(), 3);
        assert_eq!(text_of(&rows[2][1]), "Cell 4");
    }

    #[test]
    fn table_width_is_widest_row() {
        let cell = |s: &str| vec![SyntaxNode::text(s)];
        let table = SyntaxNode::Table {
            rows: vec![
                SyntaxRow {
                    header: true,
                    cells: vec![cell("A"), cell("B")],
                },
                SyntaxRow {
                    header: false,
                    cells: vec![cell("1"), cell("2"), cell("3")],
                },
            ],
        };
        let config = Config::compiled_default();
        let blocks = Mapper::new(&config).convert_all([&table]);
        assert!(matches!(
            blocks[0],
            Block::Table {
                width: 3,
                has_header: true,
                ..
            }
        ));
    }

    #[test]
    fn table_cells_do_not_share_style() {
        let blocks = convert("| **a | b |\n|---|---|\n| c | d |");
        let Block::Table { rows, .. } = &blocks[0] else {
            panic!("expected table");
        };
        assert!(rows[0][1].iter().all(|run| !run.style.bold));
    }

    #[test]
    fn table_rows_are_truncated() {
        let body: String = (0..150).map(|i| format!("| {i} |\n")).collect();
        let blocks = convert(&format!("| n |\n|---|\n{body}"));
        let Block::Table { rows, .. } = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(rows.len(), CHILDREN_LIMIT);
    }

    #[test]
    fn html_block_becomes_paragraph() {
        let blocks = convert("<div>raw</div>\n\ntext");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "<div>raw</div>");
    }

    #[test]
    fn unknown_block_without_children_is_skipped() {
        let config = Config::compiled_default();
        let node = SyntaxNode::UnknownBlock {
            kind: "metadata",
            children: vec![],
        };
        assert!(Mapper::new(&config).convert_all([&node]).is_empty());
    }

    #[test]
    fn leading_rule_keeps_following_blocks() {
        let blocks = convert("---\n# Summary\n\nKey point\n\n---\n\nAction items");
        let kinds: Vec<&str> = blocks.iter().map(Block::kind).collect();
        assert_eq!(
            kinds,
            vec!["divider", "heading_1", "paragraph", "divider", "paragraph"]
        );
        assert_eq!(blocks[1].plain_text(), "Summary");
        assert_eq!(blocks[4].plain_text(), "Action items");
    }

    #[test]
    fn text_is_preserved_across_blocks() {
        let blocks = convert("Some *mixed* **styled** `code` and [a link](https://x.y) text.");
        assert_eq!(
            blocks[0].plain_text(),
            "Some mixed styled code and a link text."
        );
    }

    #[test]
    fn trim_blank_lines_keeps_indentation() {
        assert_eq!(trim_blank_lines("\n  \n  a\n b  \n\n"), "  a\n b  ");
        assert_eq!(trim_blank_lines("\n\n"), "");
        assert_eq!(trim_blank_lines("x\r\n"), "x");
    }
}
