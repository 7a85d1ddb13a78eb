use crate::error::{BoardError, Result};
use crate::model::{BoardView, FieldSpec, Persona, Stage};
use crate::validation;
use crate::workflow::WorkflowConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".delivery-hub.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardSettings,

    /// Fields a ticket must carry before it may enter a stage.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub required_fields: BTreeMap<Stage, Vec<FieldSpec>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSettings {
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_field_prefix")]
    pub field_prefix: String,

    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    #[serde(default = "default_id_length")]
    pub id_length: usize,

    #[serde(default)]
    pub persona: Persona,

    #[serde(default)]
    pub view: BoardView,

    #[serde(default = "default_dev_count")]
    pub dev_count: u32,

    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    #[serde(default)]
    pub block_completion_while_blocked: bool,

    #[serde(default = "default_estimation_enabled")]
    pub estimation_enabled: bool,

    /// Optional YAML or TOML file overriding the built-in workflow tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
}

fn default_path() -> String {
    ".delivery-hub".to_string()
}

fn default_field_prefix() -> String {
    "delivery__".to_string()
}

fn default_name_prefix() -> String {
    "T-".to_string()
}

fn default_id_length() -> usize {
    12
}

fn default_dev_count() -> u32 {
    2
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_estimation_enabled() -> bool {
    true
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            path: default_path(),
            field_prefix: default_field_prefix(),
            name_prefix: default_name_prefix(),
            id_length: default_id_length(),
            persona: Persona::default(),
            view: BoardView::default(),
            dev_count: default_dev_count(),
            ai_timeout_secs: default_ai_timeout_secs(),
            block_completion_while_blocked: false,
            estimation_enabled: default_estimation_enabled(),
            workflow: None,
        }
    }
}

impl BoardConfig {
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        let config = Self::load_file(&config_path)?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| BoardError::Config("Config file has no parent directory".to_string()))?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        validation::validate_dev_count(config.board.dev_count)
            .map_err(|e| BoardError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(BoardError::NotInitialized);
            }
        }
    }

    pub fn data_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.board.path)
    }

    /// Built-in workflow tables, or the configured override file.
    pub fn workflow(&self, project_root: &Path) -> Result<WorkflowConfig> {
        match &self.board.workflow {
            Some(file) => WorkflowConfig::load(&project_root.join(file)),
            None => Ok(WorkflowConfig::default()),
        }
    }

    pub fn required_fields(&self, stage: Stage) -> Vec<FieldSpec> {
        self.required_fields.get(&stage).cloned().unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: BoardConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.board.path, ".delivery-hub");
        assert_eq!(config.board.field_prefix, "delivery__");
        assert_eq!(config.board.dev_count, 2);
        assert_eq!(config.board.ai_timeout_secs, 30);
        assert!(!config.board.block_completion_while_blocked);
        assert!(config.board.estimation_enabled);
        assert!(config.required_fields.is_empty());
    }

    #[test]
    fn test_required_fields_by_stage_label() {
        let yaml = r#"
board:
  persona: QA
  view: indev
required_fields:
  "Ready for Development":
    - name: Budget__c
      label: Budget
"#;
        let config: BoardConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.board.persona, Persona::Qa);
        assert_eq!(config.board.view, BoardView::Indev);
        assert_eq!(
            config.required_fields(Stage::ReadyForDevelopment),
            vec![FieldSpec::new("Budget__c", "Budget")]
        );
        assert!(config.required_fields(Stage::Backlog).is_empty());
    }

    #[test]
    fn test_unknown_stage_key_is_rejected() {
        let yaml = "required_fields:\n  Limbo: []\n";
        assert!(serde_yaml::from_str::<BoardConfig>(yaml).is_err());
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = TempDir::new().unwrap();
        BoardConfig::default()
            .save(&dir.path().join(CONFIG_FILE))
            .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, root) = BoardConfig::load(&nested).unwrap();
        assert_eq!(root, dir.path());
        assert_eq!(config.data_path(&root), dir.path().join(".delivery-hub"));
    }

    #[test]
    fn test_out_of_range_dev_count_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "board:\n  dev_count: 4000000000\n").unwrap();
        let err = BoardConfig::load_file(&path).unwrap_err();
        assert!(matches!(err, BoardError::Config(_)));

        std::fs::write(&path, "board:\n  dev_count: 0\n").unwrap();
        assert!(BoardConfig::load_file(&path).is_err());
    }

    #[test]
    fn test_missing_config_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let err = BoardConfig::find_config_file(dir.path()).unwrap_err();
        assert!(matches!(err, BoardError::NotInitialized));
    }
}
