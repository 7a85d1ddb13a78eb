use super::config::{ColumnStyle, PersonaLayout, WorkflowConfig};
use crate::enrich::EnrichedTicket;
use crate::error::{BoardError, Result};
use crate::model::{BoardView, DEFAULT_OWNER_COLOR, IntentionFilter, Persona, Stage, StageOwner};
use serde::Serialize;
use std::collections::BTreeMap;

/// A persona scoped board column. Derived on every call, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub key: String,
    pub display_name: String,
    pub member_stages: Vec<Stage>,
    pub style: ColumnStyle,
    /// Owner of the first member stage.
    pub owner: Option<StageOwner>,
    pub tickets: Vec<EnrichedTicket>,
}

impl Column {
    pub fn owner_label(&self) -> String {
        self.owner
            .map(|owner| owner.to_string())
            .unwrap_or_else(|| "Default".to_string())
    }

    pub fn owner_color(&self) -> &'static str {
        self.owner
            .map(|owner| owner.color())
            .unwrap_or(DEFAULT_OWNER_COLOR)
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

/// Projects the stage set onto persona columns and named views.
#[derive(Debug, Clone)]
pub struct PersonaViewProjector {
    layouts: BTreeMap<Persona, PersonaLayout>,
    column_styles: BTreeMap<String, ColumnStyle>,
    display_names: BTreeMap<String, String>,
}

impl PersonaViewProjector {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            layouts: config.layouts.clone(),
            column_styles: config.column_styles.clone(),
            display_names: config.display_names.clone(),
        }
    }

    /// Column keys visible for a persona and view, in display order.
    pub fn column_keys(&self, persona: Persona, view: BoardView, show_extended: bool) -> Vec<&str> {
        let Some(layout) = self.layouts.get(&persona) else {
            return Vec::new();
        };
        layout
            .views
            .get(&view)
            .map(|keys| {
                keys.iter()
                    .filter(|key| show_extended || !layout.is_extended(key))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn build_columns(
        &self,
        persona: Persona,
        view: BoardView,
        show_extended: bool,
        intention: &IntentionFilter,
        tickets: &[EnrichedTicket],
    ) -> Vec<Column> {
        let keys = self.column_keys(persona, view, show_extended);
        tracing::debug!(%persona, %view, show_extended, columns = keys.len(), "Projecting board");

        keys.into_iter()
            .map(|key| {
                let member_stages = self.member_stages(persona, key).to_vec();
                let mut column_tickets: Vec<EnrichedTicket> = tickets
                    .iter()
                    .filter(|t| member_stages.contains(&t.ticket.stage))
                    .filter(|t| intention.matches(t.ticket.intention.as_deref()))
                    .cloned()
                    .collect();
                column_tickets.sort_by(|a, b| a.ticket.sort_order.total_cmp(&b.ticket.sort_order));

                Column {
                    key: key.to_string(),
                    display_name: self
                        .display_names
                        .get(key)
                        .cloned()
                        .unwrap_or_else(|| key.to_string()),
                    style: self
                        .column_styles
                        .get(key)
                        .cloned()
                        .unwrap_or_else(ColumnStyle::neutral),
                    owner: member_stages.first().map(Stage::owner),
                    member_stages,
                    tickets: column_tickets,
                }
            })
            .collect()
    }

    pub fn member_stages(&self, persona: Persona, column: &str) -> &[Stage] {
        self.layouts
            .get(&persona)
            .and_then(|layout| layout.columns.get(column))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The column of `view` that shows `stage`, ignoring visibility toggles.
    pub fn column_for_stage(&self, persona: Persona, view: BoardView, stage: Stage) -> Option<&str> {
        let layout = self.layouts.get(&persona)?;
        layout.views.get(&view)?.iter().find_map(|key| {
            layout
                .columns
                .get(key)
                .filter(|stages| stages.contains(&stage))
                .map(|_| key.as_str())
        })
    }

    /// Stage a ticket lands in when dropped on `column`: its first member.
    pub fn target_stage(&self, persona: Persona, column: &str) -> Result<Stage> {
        let stages = self
            .layouts
            .get(&persona)
            .and_then(|layout| layout.columns.get(column))
            .ok_or_else(|| BoardError::UnknownColumn {
                persona: persona.to_string(),
                column: column.to_string(),
            })?;
        stages
            .first()
            .copied()
            .ok_or_else(|| BoardError::EmptyColumn(column.to_string()))
    }

    pub fn column_owner(&self, persona: Persona, column: &str) -> Option<StageOwner> {
        self.member_stages(persona, column).first().map(Stage::owner)
    }
}
