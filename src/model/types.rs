use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
            Priority::Critical => write!(f, "Critical"),
        }
    }
}

impl FromStr for Priority {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(BoardError::Parse(format!("Invalid priority: {}", s))),
        }
    }
}

/// The role the board is being viewed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Persona {
    #[default]
    Client,
    Consultant,
    Developer,
    #[serde(rename = "QA")]
    Qa,
}

impl Persona {
    pub const ALL: [Persona; 4] = [
        Persona::Client,
        Persona::Consultant,
        Persona::Developer,
        Persona::Qa,
    ];
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persona::Client => write!(f, "Client"),
            Persona::Consultant => write!(f, "Consultant"),
            Persona::Developer => write!(f, "Developer"),
            Persona::Qa => write!(f, "QA"),
        }
    }
}

impl FromStr for Persona {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Persona::Client),
            "consultant" => Ok(Persona::Consultant),
            "developer" | "dev" => Ok(Persona::Developer),
            "qa" => Ok(Persona::Qa),
            _ => Err(BoardError::Parse(format!("Invalid persona: {}", s))),
        }
    }
}

/// Named slice of a persona's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardView {
    #[default]
    All,
    Predev,
    Indev,
    Deployed,
}

impl BoardView {
    pub const ALL: [BoardView; 4] = [
        BoardView::All,
        BoardView::Predev,
        BoardView::Indev,
        BoardView::Deployed,
    ];
}

impl fmt::Display for BoardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardView::All => write!(f, "all"),
            BoardView::Predev => write!(f, "predev"),
            BoardView::Indev => write!(f, "indev"),
            BoardView::Deployed => write!(f, "deployed"),
        }
    }
}

impl FromStr for BoardView {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "overall" => Ok(BoardView::All),
            "predev" | "pre-dev" => Ok(BoardView::Predev),
            "indev" | "in-dev" => Ok(BoardView::Indev),
            "deployed" => Ok(BoardView::Deployed),
            _ => Err(BoardError::Parse(format!("Invalid board view: {}", s))),
        }
    }
}

/// Intention facet filter applied after stage membership.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IntentionFilter {
    #[default]
    All,
    Only(String),
}

impl IntentionFilter {
    pub fn matches(&self, intention: Option<&str>) -> bool {
        match self {
            IntentionFilter::All => true,
            IntentionFilter::Only(wanted) => intention
                .map(|value| value.trim().eq_ignore_ascii_case(wanted.trim()))
                .unwrap_or(false),
        }
    }
}

impl FromStr for IntentionFilter {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(IntentionFilter::All)
        } else {
            Ok(IntentionFilter::Only(trimmed.to_string()))
        }
    }
}

/// Known intention values and their badge colors.
pub const INTENTION_COLORS: [(&str, &str); 2] = [("Will Do", "#2196F3"), ("Sizing Only", "#FFD54F")];

pub fn intention_color(intention: &str) -> Option<&'static str> {
    INTENTION_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(intention.trim()))
        .map(|(_, color)| *color)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShowMode {
    #[default]
    Overall,
    /// Hide columns with no tickets.
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A user-facing outcome queued on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Success)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Info)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Warning)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_parse() {
        assert_eq!("qa".parse::<Persona>().unwrap(), Persona::Qa);
        assert_eq!("Developer".parse::<Persona>().unwrap(), Persona::Developer);
        assert!("manager".parse::<Persona>().is_err());
    }

    #[test]
    fn test_persona_serde_name() {
        assert_eq!(serde_json::to_string(&Persona::Qa).unwrap(), "\"QA\"");
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
    }

    #[test]
    fn test_board_view_parse() {
        assert_eq!("predev".parse::<BoardView>().unwrap(), BoardView::Predev);
        assert_eq!("overall".parse::<BoardView>().unwrap(), BoardView::All);
        assert!("later".parse::<BoardView>().is_err());
    }

    #[test]
    fn test_intention_filter() {
        let filter: IntentionFilter = " will do ".parse().unwrap();
        assert!(filter.matches(Some("Will Do")));
        assert!(filter.matches(Some("  WILL DO")));
        assert!(!filter.matches(Some("Sizing Only")));
        assert!(!filter.matches(None));
        assert!(IntentionFilter::All.matches(None));
        assert_eq!("all".parse::<IntentionFilter>().unwrap(), IntentionFilter::All);
    }

    #[test]
    fn test_intention_colors() {
        assert_eq!(intention_color("sizing only"), Some("#FFD54F"));
        assert_eq!(intention_color("Maybe"), None);
    }
}
