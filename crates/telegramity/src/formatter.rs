//! Renders an [`ErrorReport`] into a Telegram HTML message.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::Result;
use crate::config::ClientConfig;
use crate::report::ErrorReport;

/// Maximum number of stack trace lines kept in a message.
pub const STACK_TRACE_MAX_LINES: usize = 20;

const FILE_MARKER: &str = "\u{1f4cd}"; // 📍
const CALL_MARKER: &str = "\u{1f517}"; // 🔗
const ELLIPSIS: &str = "...";
const TRUNCATED_SUFFIX: &str = "\n\n[truncated]";

const CRATE_FRAME_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

const STACK_OPEN: &str = "\n\u{1f50d} <b>Stack Trace:</b>\n<pre><code>";
const STACK_CLOSE: &str = "</code></pre>";

const ERROR_LABEL: &str = "\u{274c} <b>Error:</b> ";
const CONTEXT_LABEL: &str = "\u{1f4cb} <b>Context:</b> ";
const CUT_MARKER: char = '\u{2026}';

/// Render a report as HTML text.
///
/// Sections appear in a fixed order; optional ones are skipped when empty or
/// disabled in `config`. The result never exceeds `config.max_message_length`
/// characters and every tag and entity in it is complete.
pub fn format_report(report: &ErrorReport, config: &ClientConfig) -> Result<String> {
    let limit = config.max_message_length;

    let mut before_error = vec![String::from("\u{1f6a8} <b>Error Report</b>\n\n")];
    if config.include_timestamp {
        before_error.push(format!(
            "\u{23f0} <b>Time:</b> {}\n",
            report.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    before_error.push(format!(
        "\u{1f3f7}\u{fe0f} <b>Category:</b> {}\n",
        escape_html(&report.category)
    ));

    let mut after_error = vec![format!(
        "\u{26a0}\u{fe0f} <b>Severity:</b> {}\n",
        report.severity
    )];
    if let Some(user_id) = non_empty(&report.user_id) {
        after_error.push(format!("\u{1f464} <b>User:</b> {}\n", escape_html(user_id)));
    }
    if let Some(environment) = non_empty(&report.environment) {
        after_error.push(format!(
            "\u{1f30d} <b>Environment:</b> {}\n",
            escape_html(environment)
        ));
    }
    if let Some(app_name) = non_empty(&report.app_name) {
        after_error.push(format!("\u{1f4f1} <b>App:</b> {}\n", escape_html(app_name)));
    }

    // The error message and the context dump are the unbounded fields. They
    // are cut on the raw text, before escaping, so no entity is split.
    let error_text = report.error.to_string();
    let context_text = render_context(&report.context);

    let fixed = before_error
        .iter()
        .chain(&after_error)
        .map(|section| char_len(section))
        .sum::<usize>()
        + char_len(ERROR_LABEL)
        + 1
        + context_text
            .as_ref()
            .map_or(0, |_| char_len(CONTEXT_LABEL) + 1);
    let mut remaining = limit.saturating_sub(fixed);

    let error_html = escape_html_within(&error_text, remaining);
    remaining = remaining.saturating_sub(char_len(&error_html));

    let mut sections = before_error;
    sections.push(format!("{ERROR_LABEL}{error_html}\n"));
    sections.extend(after_error);
    if let Some(context_text) = context_text {
        let context_html = escape_html_within(&context_text, remaining);
        if !context_html.is_empty() {
            sections.push(format!("{CONTEXT_LABEL}{context_html}\n"));
        }
    }

    let (mut message, complete) = join_sections(&sections, limit);

    if complete && config.include_stack_trace && !report.stack_trace.trim().is_empty() {
        let lines = format_stack_trace_lines(&report.stack_trace);
        let fixed = char_len(&message) + char_len(STACK_OPEN) + char_len(STACK_CLOSE);
        if let Some(body) = fit_lines(&lines, limit.saturating_sub(fixed)) {
            message.push_str(STACK_OPEN);
            message.push_str(&body);
            message.push_str(STACK_CLOSE);
        }
    }

    Ok(message)
}

/// Format a raw stack trace for display.
///
/// Blank lines are dropped, file references and frames of this crate or the
/// entry point get a marker, and at most [`STACK_TRACE_MAX_LINES`] lines are
/// kept, followed by `...` when lines were dropped.
pub fn format_stack_trace(stack_trace: &str) -> String {
    format_stack_trace_lines(stack_trace).join("\n")
}

fn format_stack_trace_lines(stack_trace: &str) -> Vec<String> {
    let mut lines: Vec<String> = stack_trace
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let escaped = escape_html(line);
            if is_file_reference(line) {
                format!("{FILE_MARKER} {escaped}")
            } else if is_call_frame(line) {
                format!("{CALL_MARKER} {escaped}")
            } else {
                escaped
            }
        })
        .collect();

    if lines.len() > STACK_TRACE_MAX_LINES {
        lines.truncate(STACK_TRACE_MAX_LINES);
        lines.push(ELLIPSIS.to_string());
    }
    lines
}

/// Join as many whole lines as fit in `budget` characters.
///
/// Returns `None` when not even the first line fits.
fn fit_lines(lines: &[String], budget: usize) -> Option<String> {
    let full = lines.join("\n");
    if char_len(&full) <= budget {
        return Some(full);
    }

    let ellipsis_cost = 1 + ELLIPSIS.len();
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in lines {
        let cost = char_len(line) + usize::from(!kept.is_empty());
        if used + cost + ellipsis_cost > budget {
            break;
        }
        used += cost;
        kept.push(line);
    }

    if kept.is_empty() {
        return None;
    }
    kept.push(ELLIPSIS);
    Some(kept.join("\n"))
}

fn is_file_reference(line: &str) -> bool {
    line.contains(".rs:")
}

fn is_call_frame(line: &str) -> bool {
    line.contains(CRATE_FRAME_PREFIX) || line.ends_with("::main") || line == "main"
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_context(context: &BTreeMap<String, Value>) -> Option<String> {
    if context.is_empty() {
        return None;
    }
    let entries = context
        .iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect::<Vec<_>>()
        .join(", ");
    Some(entries)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match escaped_char(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    escaped
}

fn escaped_char(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

/// Escape `text`, cutting it so the escaped result fits in `budget`
/// characters. A cut is marked with an ellipsis.
fn escape_html_within(text: &str, budget: usize) -> String {
    let escaped = escape_html(text);
    if char_len(&escaped) <= budget {
        return escaped;
    }

    let mut cut = String::new();
    if budget == 0 {
        return cut;
    }
    let mut used = 0;
    for c in text.chars() {
        let cost = escaped_char(c).map_or(1, str::len);
        if used + cost + 1 > budget {
            break;
        }
        match escaped_char(c) {
            Some(entity) => cut.push_str(entity),
            None => cut.push(c),
        }
        used += cost;
    }
    cut.push(CUT_MARKER);
    cut
}

/// Concatenate sections, dropping whole trailing sections when the text
/// would exceed `limit`. Returns the text and whether every section was kept.
fn join_sections(sections: &[String], limit: usize) -> (String, bool) {
    let total: usize = sections.iter().map(|section| char_len(section)).sum();
    if total <= limit {
        return (sections.concat(), true);
    }

    let budget = limit.saturating_sub(char_len(TRUNCATED_SUFFIX));
    let mut message = String::new();
    let mut used = 0;
    for section in sections {
        let len = char_len(section);
        if used + len > budget {
            break;
        }
        used += len;
        message.push_str(section);
    }

    let kept = message.trim_end().len();
    message.truncate(kept);
    if message.is_empty() {
        let suffix = TRUNCATED_SUFFIX.trim_start().chars().take(limit).collect();
        return (suffix, false);
    }
    message.push_str(TRUNCATED_SUFFIX);
    (message, false)
}
