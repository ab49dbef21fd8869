//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::{RegistryReport, TaskRecord};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format a list of task records as a table.
pub fn format_task_table(records: &[TaskRecord]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Task").add_attribute(Attribute::Bold),
        Cell::new("State").add_attribute(Attribute::Bold),
        Cell::new("Agent").add_attribute(Attribute::Bold),
        Cell::new("Priority").add_attribute(Attribute::Bold),
        Cell::new("Deleg.").add_attribute(Attribute::Bold),
        Cell::new("Checks").add_attribute(Attribute::Bold),
        Cell::new("Next check").add_attribute(Attribute::Bold),
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.task_id),
            Cell::new(record.state.as_str()),
            Cell::new(&record.agent),
            Cell::new(record.priority.as_str()),
            Cell::new(record.delegation_attempts),
            Cell::new(record.check_attempts),
            Cell::new(
                record
                    .next_check_at
                    .map_or_else(|| "-".to_string(), |at| at.to_rfc3339()),
            ),
        ]);
    }

    table.to_string()
}

/// Format the lifecycle audit log of a single record.
pub fn format_event_log(record: &TaskRecord) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("When").add_attribute(Attribute::Bold),
        Cell::new("Event").add_attribute(Attribute::Bold),
        Cell::new("Detail").add_attribute(Attribute::Bold),
    ]);

    for event in &record.messages {
        table.add_row(vec![
            Cell::new(event.timestamp.to_rfc3339()),
            Cell::new(event.kind.as_str()),
            Cell::new(truncate(event.detail.as_deref().unwrap_or("-"), 70)),
        ]);
    }

    table.to_string()
}

/// Format the aggregate registry report.
pub fn format_report(report: &RegistryReport) -> String {
    let mut lines = vec![
        format!("Session: {}", report.session_id),
        format!("Last updated: {}", report.last_updated.to_rfc3339()),
        format!("Total tasks: {}", report.total_tasks),
    ];

    if !report.state_counts.is_empty() {
        let mut table = base_table();
        table.set_header(vec![
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);
        for (state, count) in &report.state_counts {
            table.add_row(vec![Cell::new(state), Cell::new(count)]);
        }
        lines.push(table.to_string());
    }

    if !report.escalated_tasks.is_empty() {
        lines.push(format!("\nEscalations ({}):", report.escalated_tasks.len()));
        for escalation in &report.escalated_tasks {
            lines.push(format!(
                "  {} {}: {}",
                escalation.timestamp.to_rfc3339(),
                escalation.task_id,
                escalation.reason
            ));
        }
    }

    if !report.protocol_violations.is_empty() {
        lines.push(format!(
            "\nProtocol violations ({}):",
            report.protocol_violations.len()
        ));
        for violation in &report.protocol_violations {
            lines.push(format!(
                "  {} {}: {}",
                violation.timestamp.to_rfc3339(),
                violation.operation,
                violation.error
            ));
        }
    }

    lines.join("\n")
}

/// Truncate a string to at most `max_len` bytes, appending "..." if
/// truncated. The cut always lands on a char boundary.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len.saturating_sub(3);
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &s[..cut])
}
