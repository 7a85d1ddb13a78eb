use super::config::{TransitionOverride, WorkflowConfig};
use crate::model::{Persona, Stage};
use serde::Serialize;
use std::collections::BTreeMap;

const ADVANCE_ICON: &str = "➡️";
const CANCEL_ICON: &str = "🛑";
const BACKTRACK_ICON: &str = "⬅️";
const CUSTOM_BACKTRACK_ICON: &str = "🔙";
const NEUTRAL_OPTION_STYLE: &str = "background:#e0e0e0;color:#222;";

/// A move offered to the user for the selected ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOption {
    pub target: Stage,
    pub label: String,
    pub icon: String,
    pub style: String,
    pub autofocus: bool,
}

/// Legal stage transitions with per-persona decoration.
#[derive(Debug, Clone)]
pub struct StageGraph {
    advance: BTreeMap<Stage, Vec<Stage>>,
    backtrack: BTreeMap<Stage, Vec<Stage>>,
    advance_overrides: BTreeMap<Persona, BTreeMap<Stage, Vec<TransitionOverride>>>,
    backtrack_overrides: BTreeMap<Persona, BTreeMap<Stage, Vec<TransitionOverride>>>,
    option_styles: BTreeMap<String, String>,
}

impl StageGraph {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            advance: config.advance.clone(),
            backtrack: config.backtrack.clone(),
            advance_overrides: config.advance_overrides.clone(),
            backtrack_overrides: config.backtrack_overrides.clone(),
            option_styles: config
                .column_styles
                .iter()
                .map(|(key, style)| (key.clone(), style.css()))
                .collect(),
        }
    }

    fn style_for(&self, target: Stage) -> String {
        self.option_styles
            .get(target.label())
            .cloned()
            .unwrap_or_else(|| NEUTRAL_OPTION_STYLE.to_string())
    }

    pub fn advance_targets(&self, current: Stage) -> &[Stage] {
        self.advance.get(&current).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn backtrack_targets(&self, current: Stage) -> &[Stage] {
        self.backtrack.get(&current).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn advance_options(&self, current: Stage, persona: Persona) -> Vec<TransitionOption> {
        let overrides = self
            .advance_overrides
            .get(&persona)
            .and_then(|by_stage| by_stage.get(&current));

        self.advance_targets(current)
            .iter()
            .filter(|target| **target != current)
            .map(|target| {
                let decoration = overrides
                    .and_then(|list| list.iter().find(|o| o.target == *target));
                let icon = if *target == Stage::Cancelled {
                    CANCEL_ICON.to_string()
                } else {
                    decoration
                        .and_then(|o| o.icon.clone())
                        .unwrap_or_else(|| ADVANCE_ICON.to_string())
                };
                TransitionOption {
                    target: *target,
                    label: decoration
                        .and_then(|o| o.label.clone())
                        .unwrap_or_else(|| target.label().to_string()),
                    icon,
                    style: self.style_for(*target),
                    autofocus: decoration.map(|o| o.autofocus).unwrap_or(false),
                }
            })
            .collect()
    }

    /// Persona overrides replace the backtrack list wholesale when present.
    pub fn backtrack_options(&self, current: Stage, persona: Persona) -> Vec<TransitionOption> {
        if let Some(custom) = self
            .backtrack_overrides
            .get(&persona)
            .and_then(|by_stage| by_stage.get(&current))
        {
            return custom
                .iter()
                .map(|o| TransitionOption {
                    target: o.target,
                    label: o
                        .label
                        .clone()
                        .unwrap_or_else(|| o.target.label().to_string()),
                    icon: o
                        .icon
                        .clone()
                        .unwrap_or_else(|| CUSTOM_BACKTRACK_ICON.to_string()),
                    style: self.style_for(o.target),
                    autofocus: o.autofocus,
                })
                .collect();
        }

        self.backtrack_targets(current)
            .iter()
            .map(|target| TransitionOption {
                target: *target,
                label: target.label().to_string(),
                icon: BACKTRACK_ICON.to_string(),
                style: self.style_for(*target),
                autofocus: false,
            })
            .collect()
    }

    pub fn can_advance(&self, from: Stage, to: Stage) -> bool {
        from != to && self.advance_targets(from).contains(&to)
    }

    pub fn can_backtrack(&self, from: Stage, to: Stage) -> bool {
        self.backtrack_targets(from).contains(&to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> StageGraph {
        StageGraph::new(&WorkflowConfig::default())
    }

    #[test]
    fn test_advance_options_never_include_current() {
        let graph = graph();
        for persona in Persona::ALL {
            for stage in Stage::ALL {
                assert!(
                    graph
                        .advance_options(stage, persona)
                        .iter()
                        .all(|o| o.target != stage),
                    "{stage} offered to itself"
                );
            }
        }
    }

    #[test]
    fn test_self_edge_in_table_is_filtered() {
        let mut config = WorkflowConfig::default();
        config
            .advance
            .insert(Stage::Merging, vec![Stage::Merging, Stage::ReadyForDeployment]);
        let graph = StageGraph::new(&config);
        let targets: Vec<Stage> = graph
            .advance_options(Stage::Merging, Persona::Client)
            .into_iter()
            .map(|o| o.target)
            .collect();
        assert_eq!(targets, vec![Stage::ReadyForDeployment]);
        assert!(!graph.can_advance(Stage::Merging, Stage::Merging));
    }

    #[test]
    fn test_done_has_no_advance_but_can_backtrack() {
        let graph = graph();
        assert!(graph.advance_options(Stage::Done, Persona::Consultant).is_empty());
        let back: Vec<Stage> = graph
            .backtrack_options(Stage::Done, Persona::Consultant)
            .into_iter()
            .map(|o| o.target)
            .collect();
        assert_eq!(back, vec![Stage::DeployedToProd, Stage::Cancelled]);
    }

    #[test]
    fn test_cancelled_revives() {
        let graph = graph();
        assert!(graph.can_advance(Stage::Cancelled, Stage::Backlog));
        assert!(graph.can_advance(Stage::Cancelled, Stage::ReadyForSizing));
    }

    #[test]
    fn test_default_icons_and_styles() {
        let graph = graph();
        let options = graph.advance_options(Stage::Backlog, Persona::Client);
        assert_eq!(options[0].target, Stage::ScopingInProgress);
        assert_eq!(options[0].icon, "➡️");
        assert_eq!(
            options[0].style,
            "background:rgba(254, 243, 199, 0.5);color:#D97706;"
        );
        assert!(!options[0].autofocus);

        let back = graph.backtrack_options(Stage::Backlog, Persona::Client);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].target, Stage::Cancelled);
        assert_eq!(back[0].icon, "⬅️");
    }

    #[test]
    fn test_cancel_icon_on_advance() {
        let mut config = WorkflowConfig::default();
        config.advance.insert(Stage::Backlog, vec![Stage::Cancelled]);
        let graph = StageGraph::new(&config);
        let options = graph.advance_options(Stage::Backlog, Persona::Qa);
        assert_eq!(options[0].icon, "🛑");
    }

    #[test]
    fn test_missing_style_uses_neutral() {
        let mut config = WorkflowConfig::default();
        config.column_styles.clear();
        let graph = StageGraph::new(&config);
        let options = graph.advance_options(Stage::ReadyForDevelopment, Persona::Developer);
        assert_eq!(options[0].style, "background:#e0e0e0;color:#222;");
    }

    #[test]
    fn test_persona_overrides() {
        let mut config = WorkflowConfig::default();
        config.advance_overrides.insert(
            Persona::Developer,
            BTreeMap::from([(
                Stage::ReadyForDevelopment,
                vec![TransitionOverride {
                    target: Stage::InDevelopment,
                    label: Some("Start work".into()),
                    icon: Some("🚀".into()),
                    autofocus: true,
                }],
            )]),
        );
        config.backtrack_overrides.insert(
            Persona::Developer,
            BTreeMap::from([(
                Stage::InDevelopment,
                vec![TransitionOverride {
                    target: Stage::DevBlocked,
                    label: None,
                    icon: None,
                    autofocus: false,
                }],
            )]),
        );
        let graph = StageGraph::new(&config);

        let dev = graph.advance_options(Stage::ReadyForDevelopment, Persona::Developer);
        assert_eq!(dev[0].label, "Start work");
        assert_eq!(dev[0].icon, "🚀");
        assert!(dev[0].autofocus);

        let client = graph.advance_options(Stage::ReadyForDevelopment, Persona::Client);
        assert_eq!(client[0].label, "In Development");
        assert_eq!(client[0].icon, "➡️");

        let back = graph.backtrack_options(Stage::InDevelopment, Persona::Developer);
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].target, Stage::DevBlocked);
        assert_eq!(back[0].icon, "🔙");
    }

    #[test]
    fn test_missing_stage_rows_yield_empty_lists() {
        let mut config = WorkflowConfig::default();
        config.advance.clear();
        config.backtrack.clear();
        let graph = StageGraph::new(&config);
        assert!(graph.advance_options(Stage::Backlog, Persona::Client).is_empty());
        assert!(graph.backtrack_options(Stage::Backlog, Persona::Client).is_empty());
    }
}
