//! Convert Markdown notes into the block tree of a Notion-style document API.
//!
//! ```no_run
//! let blocks = notemark::convert("# Standup\n\n- [x] ship it").unwrap();
//! let body = notemark::blocks_to_json(&blocks);
//! println!("{body}");
//! ```

mod block;
pub mod cache;
pub mod config;
mod error;
mod inline;
mod json;
pub mod note;
mod parser;
mod runs;
pub mod syntax;

pub use block::{Block, CHILDREN_LIMIT, RICH_TEXT_LIMIT, StyleState, TableRow, TextRun};
pub use config::{Config, SoftBreak};
pub use error::MarkdownParseError;
pub use inline::map_inline;
pub use json::{block_to_json, blocks_to_json, runs_to_json};
pub use parser::Mapper;
pub use runs::normalize;

/// Convert markdown to blocks using the default config.
pub fn convert(markdown: &str) -> Result<Vec<Block>, MarkdownParseError> {
    convert_with_config(markdown, &Config::compiled_default())
}

/// Convert markdown to blocks with a custom config.
pub fn convert_with_config(
    markdown: &str,
    config: &Config,
) -> Result<Vec<Block>, MarkdownParseError> {
    parser::parse(markdown, config)
}

/// Convert markdown straight to the JSON block array.
pub fn markdown_to_json(
    markdown: &str,
    config: &Config,
) -> Result<serde_json::Value, MarkdownParseError> {
    let blocks = convert_with_config(markdown, config)?;
    Ok(blocks_to_json(&blocks))
}
