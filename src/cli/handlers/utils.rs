use crate::backend::BoardBackend;
use crate::board::Board;
use crate::model::{Priority, Severity, Stage};
use colored::{ColoredString, Colorize};

/// Print queued notifications to stderr. Successes are left to the caller's
/// own output.
pub fn print_notifications<B: BoardBackend>(board: &mut Board<B>) {
    for notification in board.take_notifications() {
        let label = match notification.severity {
            Severity::Success => continue,
            Severity::Info => "info".blue().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Error => "error".red().bold(),
        };
        eprintln!("{}: {}: {}", label, notification.title, notification.message);
    }
}

pub fn format_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::Low => "low".dimmed(),
        Priority::Medium => "medium".white(),
        Priority::High => "high".yellow(),
        Priority::Critical => "critical".red().bold(),
    }
}

pub fn format_stage(stage: Stage) -> ColoredString {
    paint(stage.label(), stage.color())
}

/// Color `text` with a `#rrggbb` color, or leave it plain.
pub fn paint(text: &str, hex: &str) -> ColoredString {
    match parse_hex(hex) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#ff8000"), Some((255, 128, 0)));
        assert_eq!(parse_hex("ff8000"), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }
}
