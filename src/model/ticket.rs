use super::{Priority, Stage};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One side of a dependency edge as seen from a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLink {
    pub dependency_id: String,
    pub ticket_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_name: Option<String>,
}

/// Directed "blocks" edge between two tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub blocking_ticket_id: String,
    pub blocked_ticket_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub name: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub stage: Stage,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<String>,

    #[serde(default)]
    pub sort_order: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_days_size: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    /// Raw comma separated tag string as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_uat_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_eta: Option<NaiveDate>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<DependencyLink>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocking: Vec<DependencyLink>,
}

fn default_active() -> bool {
    true
}

impl Ticket {
    pub fn new(id: String, name: String, title: String) -> Self {
        Self {
            id,
            name,
            title,
            description: String::new(),
            stage: Stage::default(),
            priority: Priority::default(),
            intention: None,
            sort_order: 0.0,
            developer_days_size: None,
            actual_hours: None,
            estimated_hours: None,
            tags: None,
            created_date: Some(Utc::now()),
            projected_uat_date: None,
            stored_eta: None,
            is_active: true,
            blocked_by: Vec::new(),
            blocking: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_sort_order(mut self, sort_order: f64) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_intention(mut self, intention: impl Into<String>) -> Self {
        self.intention = Some(intention.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_size(mut self, days: f64) -> Self {
        self.developer_days_size = Some(days);
        self
    }

    pub fn with_stored_eta(mut self, eta: NaiveDate) -> Self {
        self.stored_eta = Some(eta);
        self
    }

    pub fn with_created_date(mut self, created: DateTime<Utc>) -> Self {
        self.created_date = Some(created);
        self
    }

    /// Ids of every ticket linked to this one in either direction.
    pub fn linked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for link in self.blocked_by.iter().chain(self.blocking.iter()) {
            if !ids.contains(&link.ticket_id) {
                ids.push(link.ticket_id.clone());
            }
        }
        ids
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }
}

/// Intake payload for a new ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub intention: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub developer_days_size: Option<f64>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

impl NewTicket {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Live completion estimate for one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaProjection {
    pub ticket_id: String,
    pub calculated_eta: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtaResponse {
    pub tickets: Vec<EtaProjection>,
    #[serde(default)]
    pub pushed_back: Vec<String>,
}

impl EtaResponse {
    pub fn eta_for(&self, ticket_id: &str) -> Option<NaiveDate> {
        self.tickets
            .iter()
            .find(|projection| projection.ticket_id == ticket_id)
            .and_then(|projection| projection.calculated_eta)
    }
}

/// A field a stage requires before a ticket may enter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// A ticket that may be linked as a blocker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockerCandidate {
    pub id: String,
    pub name: String,
    pub title: String,
    pub stage: Stage,
}

impl From<&Ticket> for BlockerCandidate {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            name: ticket.name.clone(),
            title: ticket.title.clone(),
            stage: ticket.stage,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestions {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_days: Option<f64>,
}

impl AiSuggestions {
    pub fn is_empty(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or("").is_empty();
        blank(&self.title) && blank(&self.description) && self.estimated_days.is_none()
    }
}
