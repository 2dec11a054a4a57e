/// Maximum characters in a single rich-text run.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Maximum children of a single container block (list items, nested content,
/// table rows).
pub const CHILDREN_LIMIT: usize = 100;

/// Inline formatting active for a run of text.
///
/// Values are never mutated in place; entering a nested context produces a
/// new state and the enclosing one is untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StyleState {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: Option<String>,
}

impl StyleState {
    pub fn bold(&self) -> Self {
        Self {
            bold: true,
            ..self.clone()
        }
    }

    pub fn italic(&self) -> Self {
        Self {
            italic: true,
            ..self.clone()
        }
    }

    pub fn strikethrough(&self) -> Self {
        Self {
            strikethrough: true,
            ..self.clone()
        }
    }

    pub fn code(&self) -> Self {
        Self {
            code: true,
            ..self.clone()
        }
    }

    pub fn linked(&self, url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..self.clone()
        }
    }

    /// Same flags, no link.
    pub fn unlinked(&self) -> Self {
        Self {
            link: None,
            ..self.clone()
        }
    }
}

/// A contiguous span of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub content: String,
    pub style: StyleState,
}

impl TextRun {
    pub fn new(content: impl Into<String>, style: StyleState) -> Self {
        Self {
            content: content.into(),
            style,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, StyleState::default())
    }

    /// Length in characters, the unit the limits are expressed in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A table row: one run sequence per cell.
pub type TableRow = Vec<Vec<TextRun>>;

/// Blocks of the target document model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        runs: Vec<TextRun>,
    },
    Paragraph {
        runs: Vec<TextRun>,
    },
    BulletedItem {
        runs: Vec<TextRun>,
        children: Vec<Block>,
    },
    NumberedItem {
        runs: Vec<TextRun>,
        children: Vec<Block>,
    },
    ChecklistItem {
        runs: Vec<TextRun>,
        checked: bool,
        children: Vec<Block>,
    },
    Code {
        language: String,
        runs: Vec<TextRun>,
    },
    Quote {
        runs: Vec<TextRun>,
    },
    Divider,
    Table {
        width: usize,
        has_header: bool,
        rows: Vec<TableRow>,
    },
}

impl Block {
    /// The block type name used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { level: 1, .. } => "heading_1",
            Block::Heading { level: 2, .. } => "heading_2",
            Block::Heading { .. } => "heading_3",
            Block::Paragraph { .. } => "paragraph",
            Block::BulletedItem { .. } => "bulleted_list_item",
            Block::NumberedItem { .. } => "numbered_list_item",
            Block::ChecklistItem { .. } => "to_do",
            Block::Code { .. } => "code",
            Block::Quote { .. } => "quote",
            Block::Divider => "divider",
            Block::Table { .. } => "table",
        }
    }

    /// Primary text runs of the block. Tables and dividers have none.
    pub fn runs(&self) -> &[TextRun] {
        match self {
            Block::Heading { runs, .. }
            | Block::Paragraph { runs }
            | Block::BulletedItem { runs, .. }
            | Block::NumberedItem { runs, .. }
            | Block::ChecklistItem { runs, .. }
            | Block::Code { runs, .. }
            | Block::Quote { runs } => runs,
            Block::Divider | Block::Table { .. } => &[],
        }
    }

    /// Nested child blocks of a list item.
    pub fn children(&self) -> &[Block] {
        match self {
            Block::BulletedItem { children, .. }
            | Block::NumberedItem { children, .. }
            | Block::ChecklistItem { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text of the primary runs, ignoring style.
    pub fn plain_text(&self) -> String {
        self.runs().iter().map(|run| run.content.as_str()).collect()
    }
}
