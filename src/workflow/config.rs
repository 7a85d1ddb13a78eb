use super::tables;
use crate::error::{BoardError, Result};
use crate::model::{BoardView, Persona, Stage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStyle {
    pub background: String,
    pub foreground: String,
}

impl ColumnStyle {
    pub fn new(background: impl Into<String>, foreground: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            foreground: foreground.into(),
        }
    }

    /// Fallback for columns without a configured style.
    pub fn neutral() -> Self {
        Self::new("#ffffff", "#11182c")
    }

    pub fn css(&self) -> String {
        format!("background:{};color:{};", self.background, self.foreground)
    }
}

/// Persona specific decoration for one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOverride {
    pub target: Stage,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub autofocus: bool,
}

/// Column layout for one persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaLayout {
    /// Column key to its ordered member stages.
    pub columns: BTreeMap<String, Vec<Stage>>,
    /// Columns hidden unless extended columns are shown.
    #[serde(default)]
    pub extended: BTreeMap<String, bool>,
    pub views: BTreeMap<BoardView, Vec<String>>,
}

impl PersonaLayout {
    pub fn is_extended(&self, key: &str) -> bool {
        self.extended.get(key).copied().unwrap_or(false)
    }
}

/// Everything the engine needs to know about the workflow, passed in whole.
///
/// Sections missing from an overrides file keep their built-in values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub advance: BTreeMap<Stage, Vec<Stage>>,
    pub backtrack: BTreeMap<Stage, Vec<Stage>>,
    /// persona -> current stage -> decorated targets
    pub advance_overrides: BTreeMap<Persona, BTreeMap<Stage, Vec<TransitionOverride>>>,
    /// persona -> current stage -> replacement backtrack targets
    pub backtrack_overrides: BTreeMap<Persona, BTreeMap<Stage, Vec<TransitionOverride>>>,
    pub layouts: BTreeMap<Persona, PersonaLayout>,
    pub column_styles: BTreeMap<String, ColumnStyle>,
    pub display_names: BTreeMap<String, String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        tables::default_config()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    UnknownViewColumn {
        persona: Persona,
        view: BoardView,
        column: String,
    },
    EmptyColumn {
        persona: Persona,
        column: String,
    },
    UnknownExtendedColumn {
        persona: Persona,
        column: String,
    },
    UnmappedStage {
        persona: Persona,
        stage: Stage,
    },
    MissingLayout {
        persona: Persona,
    },
}

impl ConfigIssue {
    /// Errors make a board unusable; the rest only hide tickets or do nothing.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ConfigIssue::UnknownViewColumn { .. } | ConfigIssue::EmptyColumn { .. }
        )
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::UnknownViewColumn {
                persona,
                view,
                column,
            } => write!(
                f,
                "{} view '{}' references unknown column '{}'",
                persona, view, column
            ),
            ConfigIssue::EmptyColumn { persona, column } => {
                write!(f, "{} column '{}' has no member stages", persona, column)
            }
            ConfigIssue::UnknownExtendedColumn { persona, column } => write!(
                f,
                "{} marks unknown column '{}' as extended",
                persona, column
            ),
            ConfigIssue::UnmappedStage { persona, stage } => {
                write!(f, "{} has no column for stage '{}'", persona, stage)
            }
            ConfigIssue::MissingLayout { persona } => {
                write!(f, "no column layout for {}", persona)
            }
        }
    }
}

impl WorkflowConfig {
    /// Load overrides from a `.toml`, `.yml` or `.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        let config = match extension.as_deref() {
            Some("toml") => toml::from_str(&content)?,
            Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
            _ => {
                return Err(BoardError::Config(format!(
                    "Unsupported workflow file type: {}",
                    path.display()
                )));
            }
        };
        Ok(config)
    }

    pub fn layout(&self, persona: Persona) -> Option<&PersonaLayout> {
        self.layouts.get(&persona)
    }

    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.display_names
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }

    pub fn column_style(&self, key: &str) -> ColumnStyle {
        self.column_styles
            .get(key)
            .cloned()
            .unwrap_or_else(ColumnStyle::neutral)
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for persona in Persona::ALL {
            let Some(layout) = self.layouts.get(&persona) else {
                issues.push(ConfigIssue::MissingLayout { persona });
                continue;
            };

            for (column, stages) in &layout.columns {
                if stages.is_empty() {
                    issues.push(ConfigIssue::EmptyColumn {
                        persona,
                        column: column.clone(),
                    });
                }
            }

            for (view, keys) in &layout.views {
                for key in keys {
                    if !layout.columns.contains_key(key) {
                        issues.push(ConfigIssue::UnknownViewColumn {
                            persona,
                            view: *view,
                            column: key.clone(),
                        });
                    }
                }
            }

            for key in layout.extended.keys() {
                if !layout.columns.contains_key(key) {
                    issues.push(ConfigIssue::UnknownExtendedColumn {
                        persona,
                        column: key.clone(),
                    });
                }
            }

            for stage in Stage::ALL {
                if !layout.columns.values().any(|stages| stages.contains(&stage)) {
                    issues.push(ConfigIssue::UnmappedStage { persona, stage });
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_has_no_errors() {
        let issues = WorkflowConfig::default().validate();
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_validate_flags_unknown_view_columns_and_empty_columns() {
        let mut config = WorkflowConfig::default();
        let layout = config.layouts.get_mut(&Persona::Client).unwrap();
        layout
            .views
            .get_mut(&BoardView::Predev)
            .unwrap()
            .push("Nowhere".to_string());
        layout.columns.insert("Hollow".to_string(), Vec::new());

        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::UnknownViewColumn {
            persona: Persona::Client,
            view: BoardView::Predev,
            column: "Nowhere".to_string(),
        }));
        assert!(issues.contains(&ConfigIssue::EmptyColumn {
            persona: Persona::Client,
            column: "Hollow".to_string(),
        }));
    }

    #[test]
    fn test_validate_reports_missing_layout_and_unmapped_stage() {
        let mut config = WorkflowConfig::default();
        config.layouts.remove(&Persona::Qa);
        config
            .layouts
            .get_mut(&Persona::Developer)
            .unwrap()
            .columns
            .remove("Blocked");

        let issues = config.validate();
        assert!(issues.contains(&ConfigIssue::MissingLayout { persona: Persona::Qa }));
        assert!(issues.contains(&ConfigIssue::UnmappedStage {
            persona: Persona::Developer,
            stage: Stage::DevBlocked,
        }));
    }

    #[test]
    fn test_load_yaml_keeps_missing_sections() {
        let mut file = NamedTempFile::with_suffix(".yml").unwrap();
        writeln!(
            file,
            "display_names:\n  Backlog: Inbox\nadvance:\n  Done:\n    - Backlog\n"
        )
        .unwrap();

        let config = WorkflowConfig::load(file.path()).unwrap();
        assert_eq!(config.display_name("Backlog"), "Inbox");
        assert_eq!(config.advance.len(), 1);
        assert_eq!(config.advance[&Stage::Done], vec![Stage::Backlog]);
        assert_eq!(config.layouts, WorkflowConfig::default().layouts);
    }

    #[test]
    fn test_load_toml() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[display_names]\n\"Dev Work\" = \"Hands On\"").unwrap();

        let config = WorkflowConfig::load(file.path()).unwrap();
        assert_eq!(config.display_name("Dev Work"), "Hands On");
        assert_eq!(config.display_name("Dev Queue"), "Dev Queue");
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = NamedTempFile::with_suffix(".ini").unwrap();
        assert!(matches!(
            WorkflowConfig::load(file.path()),
            Err(BoardError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_stage() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "advance:\n  Limbo:\n    - Backlog\n").unwrap();
        assert!(WorkflowConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_style_fallback() {
        let config = WorkflowConfig::default();
        assert_eq!(config.column_style("Mystery"), ColumnStyle::neutral());
        assert_eq!(
            config.column_style("Deployed").css(),
            "background:rgba(209, 250, 229, 0.5);color:#059669;"
        );
    }
}
