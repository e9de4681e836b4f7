//! Text dump of the rows a view currently shows, with box-drawing prefixes.
//!
//! This is the smallest possible view adapter: it only uses the generic
//! [`TreeModel`] navigation plus an "is this row expanded" predicate.

use std::io::{self, Write};

use crate::model::{Column, TreeEvent, TreeModel, Value};
use crate::tree::NodeId;

/// One visible row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 0 for top-level rows.
    pub depth: usize,
    pub label: String,
    /// Whether this is the last sibling in its parent group.
    pub is_last: bool,
    /// Pre-computed box-drawing prefix string.
    pub prefix: String,
}

/// Collect the rows reachable from the top level through expanded rows, in
/// display order.
pub fn visible_rows<M, F>(model: &M, is_expanded: F) -> Vec<Row>
where
    M: TreeModel,
    F: Fn(M::Handle) -> bool,
{
    let mut rows = Vec::new();
    // ancestor_is_last[d] = whether the open ancestor at depth d + 1 was last.
    let mut ancestor_is_last = Vec::new();
    collect(model, &is_expanded, None, 0, &mut ancestor_is_last, &mut rows);
    rows
}

fn collect<M, F>(
    model: &M,
    is_expanded: &F,
    parent: Option<M::Handle>,
    depth: usize,
    ancestor_is_last: &mut Vec<bool>,
    rows: &mut Vec<Row>,
) where
    M: TreeModel,
    F: Fn(M::Handle) -> bool,
{
    let count = model.child_count(parent);
    for index in 0..count {
        let Some(node) = model.nth_child(parent, index) else {
            break;
        };
        let is_last = index + 1 == count;

        let mut prefix = String::new();
        if depth > 0 {
            for &last in &ancestor_is_last[..depth - 1] {
                prefix.push_str(if last { "    " } else { "\u{2502}   " }); // │
            }
            prefix.push_str(if is_last {
                "\u{2514}\u{2500}\u{2500} " // └──
            } else {
                "\u{251c}\u{2500}\u{2500} " // ├──
            });
        }

        let label = match model.value(node, Column::DisplayName) {
            Some(Value::Text(text)) => sanitize_terminal_text(&text),
            _ => String::from("?"),
        };
        rows.push(Row {
            depth,
            label,
            is_last,
            prefix,
        });

        if is_expanded(node) {
            if depth > 0 {
                ancestor_is_last.push(is_last);
            }
            collect(model, is_expanded, Some(node), depth + 1, ancestor_is_last, rows);
            if depth > 0 {
                ancestor_is_last.pop();
            }
        }
    }
}

/// Write rows, one per line.
pub fn render_rows<W: Write>(out: &mut W, rows: &[Row]) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{}{}", row.prefix, row.label)?;
    }
    Ok(())
}

/// One-line description of a notification, as printed in watch mode.
pub fn describe_event<M>(model: &M, event: &TreeEvent) -> String
where
    M: TreeModel<Handle = NodeId>,
{
    let label = |node: NodeId| match model.value(node, Column::DisplayName) {
        Some(Value::Text(text)) => sanitize_terminal_text(&text),
        _ => String::from("?"),
    };
    match event {
        TreeEvent::RowInserted { path, node } => format!("+ {path} {}", label(*node)),
        TreeEvent::RowDeleted { path } => format!("- {path}"),
        TreeEvent::HasChildToggled { path, .. } => format!("* {path}"),
    }
}

/// Escape control characters so directory names cannot inject terminal
/// control sequences.
fn sanitize_terminal_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02X}", code));
                } else {
                    out.push_str(&format!("\\u{{{:X}}}", code));
                }
            }
            _ => out.push(c),
        }
    }
    out
}
