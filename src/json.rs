use serde_json::{Map, Value, json};

use crate::block::{Block, TableRow, TextRun};

/// Convert blocks to the document API's JSON block array
pub fn blocks_to_json(blocks: &[Block]) -> Value {
    Value::Array(blocks.iter().map(block_to_json).collect())
}

pub fn block_to_json(block: &Block) -> Value {
    let kind = block.kind();
    let body = match block {
        Block::Heading { runs, .. } | Block::Paragraph { runs } | Block::Quote { runs } => {
            json!({ "rich_text": runs_to_json(runs) })
        }
        Block::BulletedItem { runs, children } | Block::NumberedItem { runs, children } => {
            with_children(json!({ "rich_text": runs_to_json(runs) }), children)
        }
        Block::ChecklistItem {
            runs,
            checked,
            children,
        } => with_children(
            json!({ "rich_text": runs_to_json(runs), "checked": checked }),
            children,
        ),
        Block::Code { language, runs } => {
            json!({ "language": language, "rich_text": runs_to_json(runs) })
        }
        Block::Divider => json!({}),
        Block::Table {
            width,
            has_header,
            rows,
        } => json!({
            "table_width": width,
            "has_column_header": has_header,
            "has_row_header": false,
            "children": rows.iter().map(|row| row_to_json(row, *width)).collect::<Vec<_>>(),
        }),
    };

    let mut object = Map::new();
    object.insert("object".to_string(), json!("block"));
    object.insert("type".to_string(), json!(kind));
    object.insert(kind.to_string(), body);
    Value::Object(object)
}

/// Rich-text array for a run sequence.
pub fn runs_to_json(runs: &[TextRun]) -> Value {
    Value::Array(runs.iter().map(run_to_json).collect())
}

fn run_to_json(run: &TextRun) -> Value {
    let mut text = json!({ "content": run.content });
    if let Some(url) = &run.style.link {
        text["link"] = json!({ "url": url });
    }
    json!({
        "type": "text",
        "text": text,
        "annotations": {
            "bold": run.style.bold,
            "italic": run.style.italic,
            "strikethrough": run.style.strikethrough,
            "code": run.style.code,
        },
    })
}

fn with_children(mut body: Value, children: &[Block]) -> Value {
    if !children.is_empty() {
        body["children"] = blocks_to_json(children);
    }
    body
}

/// Table rows must all be `width` cells wide on the wire; short rows get
/// empty cells appended.
fn row_to_json(row: &TableRow, width: usize) -> Value {
    let mut cells: Vec<Value> = row.iter().map(|cell| runs_to_json(cell)).collect();
    cells.resize(width, json!([]));
    json!({
        "object": "block",
        "type": "table_row",
        "table_row": { "cells": cells },
    })
}
