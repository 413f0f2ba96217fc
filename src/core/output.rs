//! Compact output rendering helpers for CLI surfaces.
//!
//! Styling is a pure function of message and style tag; nothing here keeps
//! terminal state between calls.

use colored::Colorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Plain,
    Heading,
    Success,
    Warning,
    Error,
    Info,
    Muted,
}

/// Render `message` with the colors associated with `style`.
pub fn styled(message: &str, style: Style) -> String {
    match style {
        Style::Plain => message.to_string(),
        Style::Heading => message.bright_blue().bold().to_string(),
        Style::Success => message.bright_green().to_string(),
        Style::Warning => message.bright_yellow().to_string(),
        Style::Error => message.bright_red().to_string(),
        Style::Info => message.cyan().to_string(),
        Style::Muted => message.bright_black().to_string(),
    }
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Render up to `max_items` messages with compact formatting.
pub fn preview_messages(messages: &[String], max_items: usize, max_chars: usize) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let shown = messages
        .iter()
        .take(max_items)
        .map(|m| compact_line(m, max_chars))
        .collect::<Vec<_>>()
        .join(" | ");
    if messages.len() > max_items {
        format!("{} (+{} more)", shown, messages.len() - max_items)
    } else {
        shown
    }
}

/// Truncate to `max_chars` characters without collapsing whitespace.
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    input.chars().take(max_chars).collect()
}

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn trace_enabled() -> bool {
    std::env::var("DEPLOYCHECK_TRACE").ok().as_deref() == Some("1")
}

pub fn trace_check(name: &str) {
    if trace_enabled() {
        eprintln!("deploycheck: trace {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_line_collapses_and_bounds() {
        assert_eq!(compact_line("a\n  b\tc", 10), "a b c");
        assert_eq!(compact_line("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn preview_messages_reports_remainder() {
        let msgs = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        assert_eq!(preview_messages(&msgs, 2, 20), "one | two (+1 more)");
        assert_eq!(preview_messages(&[], 2, 20), "");
    }

    #[test]
    fn styled_keeps_message_text() {
        colored::control::set_override(false);
        assert_eq!(styled("ready", Style::Success), "ready");
        assert_eq!(styled("ready", Style::Plain), "ready");
        colored::control::unset_override();
    }

    #[test]
    fn truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("àéîõü", 3), "àéî");
    }
}
