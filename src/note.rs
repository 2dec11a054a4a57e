//! Page layouts for voice notes.
//!
//! A note either becomes a new child page, or is appended to an existing
//! page under a divider and a timestamped heading. The document API accepts
//! at most [`CHILDREN_LIMIT`] blocks per request, so longer notes are sent as
//! one create (or append) request followed by further append requests.

use std::fmt::Write;

use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::block::{Block, CHILDREN_LIMIT, TextRun};
use crate::config::{DEFAULT_TIMESTAMP_FORMAT, NoteConfig};
use crate::json::{blocks_to_json, runs_to_json};
use crate::runs::normalize;

/// Blocks appended to an existing page for one note.
pub fn append_note(
    title: &str,
    timestamp: NaiveDateTime,
    body: Vec<Block>,
    config: &NoteConfig,
) -> Vec<Block> {
    let heading = format!(
        "{} {} ({})",
        config.heading_prefix,
        title,
        format_timestamp(timestamp, &config.timestamp_format)
    );
    let mut blocks = Vec::with_capacity(body.len() + 2);
    blocks.push(Block::Divider);
    blocks.push(Block::Heading {
        level: 3,
        runs: normalize(vec![TextRun::plain(heading.trim_start())]),
    });
    blocks.extend(body);
    blocks
}

fn format_timestamp(timestamp: NaiveDateTime, format: &str) -> String {
    let mut formatted = String::new();
    // An invalid strftime pattern surfaces as a formatting error
    if write!(formatted, "{}", timestamp.format(format)).is_err() {
        tracing::warn!("Invalid timestamp format {:?}, using default", format);
        formatted = timestamp.format(DEFAULT_TIMESTAMP_FORMAT).to_string();
    }
    formatted
}

/// Request body creating a child page, plus the append request bodies for
/// the blocks that did not fit.
pub fn create_page_request(parent_id: &str, title: &str, blocks: &[Block]) -> (Value, Vec<Value>) {
    let split = blocks.len().min(CHILDREN_LIMIT);
    let (first, rest) = blocks.split_at(split);
    let title_runs = normalize(vec![TextRun::plain(title)]);
    let page = json!({
        "parent": { "page_id": parent_id },
        "properties": {
            "title": { "title": runs_to_json(&title_runs) },
        },
        "children": blocks_to_json(first),
    });
    (page, append_requests(rest))
}

/// Append request bodies of at most [`CHILDREN_LIMIT`] blocks each.
pub fn append_requests(blocks: &[Block]) -> Vec<Value> {
    blocks
        .chunks(CHILDREN_LIMIT)
        .map(|chunk| json!({ "children": blocks_to_json(chunk) }))
        .collect()
}
