//! In-memory backend for tests and demos.
//!
//! Applies the same rules as the file backend, records every call it
//! receives, and can be told to fail or stall specific operations.

use super::eta::EtaScheduler;
use crate::backend::BoardBackend;
use crate::error::{BoardError, Result};
use crate::model::{
    AiSuggestions, BlockerCandidate, Dependency, EtaResponse, FieldSpec, NewTicket, Stage, Ticket,
};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One call received by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    FetchTickets,
    FetchEtas {
        dev_count: u32,
        prioritized: Option<Vec<String>>,
    },
    RequiredFields {
        stage: Stage,
    },
    SearchBlockers {
        term: String,
        current_id: String,
    },
    UpdateStage {
        ticket_id: String,
        stage: Stage,
        sort_order: Option<f64>,
    },
    UpdateSortOrder {
        ticket_id: String,
        sort_order: f64,
    },
    SaveTransitionFields {
        ticket_id: String,
        stage: Stage,
    },
    CreateDependency {
        blocked_id: String,
        blocking_id: String,
    },
    RemoveDependency {
        dependency_id: String,
    },
    PostComment {
        ticket_id: String,
    },
    CreateTicket {
        title: String,
    },
    AiEnhance,
}

impl BackendCall {
    /// Writes against existing tickets or edges. Intake is not counted.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            BackendCall::UpdateStage { .. }
                | BackendCall::UpdateSortOrder { .. }
                | BackendCall::SaveTransitionFields { .. }
                | BackendCall::CreateDependency { .. }
                | BackendCall::RemoveDependency { .. }
                | BackendCall::PostComment { .. }
        )
    }

    fn method(&self) -> &'static str {
        match self {
            BackendCall::FetchTickets => "fetch_tickets",
            BackendCall::FetchEtas { .. } => "fetch_etas",
            BackendCall::RequiredFields { .. } => "required_fields_for_stage",
            BackendCall::SearchBlockers { .. } => "search_potential_blockers",
            BackendCall::UpdateStage { .. } => "update_ticket_stage",
            BackendCall::UpdateSortOrder { .. } => "update_ticket_sort_order",
            BackendCall::SaveTransitionFields { .. } => "save_transition_fields",
            BackendCall::CreateDependency { .. } => "create_dependency",
            BackendCall::RemoveDependency { .. } => "remove_dependency",
            BackendCall::PostComment { .. } => "post_status_comment",
            BackendCall::CreateTicket { .. } => "create_ticket",
            BackendCall::AiEnhance => "ai_enhance",
        }
    }
}

#[derive(Default)]
struct InMemoryInner {
    tickets: Vec<Ticket>,
    dependencies: Vec<Dependency>,
    required_fields: BTreeMap<Stage, Vec<FieldSpec>>,
    comments: Vec<(String, String)>,
    calls: Vec<BackendCall>,
    failing: HashSet<String>,
    etas: Option<EtaResponse>,
    today: Option<NaiveDate>,
    ai_suggestions: AiSuggestions,
    ai_delay: Option<Duration>,
    ticket_counter: u64,
    dependency_counter: u64,
}

impl InMemoryInner {
    /// Record the call, then fail it if asked to.
    fn enter(&mut self, call: BackendCall) -> Result<()> {
        let method = call.method();
        self.calls.push(call);
        if self.failing.contains(method) {
            return Err(BoardError::Backend(format!("{} failed", method)));
        }
        Ok(())
    }

    fn linked(&self) -> Vec<Ticket> {
        let mut tickets = self.tickets.clone();
        super::link_tickets(&mut tickets, &self.dependencies);
        tickets
    }

    fn ticket_mut(&mut self, id: &str) -> Result<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_string()))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<InMemoryInner>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing tickets. Their links are recomputed from edges.
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let inner = InMemoryInner {
            ticket_counter: tickets.len() as u64,
            tickets,
            ..InMemoryInner::default()
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn ticket(&self, id: &str) -> Option<Ticket> {
        let inner = self.inner.lock().await;
        inner.linked().into_iter().find(|t| t.id == id)
    }

    pub async fn tickets(&self) -> Vec<Ticket> {
        self.inner.lock().await.linked()
    }

    pub async fn require_fields(&self, stage: Stage, fields: Vec<FieldSpec>) {
        self.inner.lock().await.required_fields.insert(stage, fields);
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.inner.lock().await.calls.clear();
    }

    pub async fn comments(&self) -> Vec<(String, String)> {
        self.inner.lock().await.comments.clone()
    }

    /// Make every later call to `method` fail with a backend error.
    pub async fn fail_on(&self, method: &str) {
        self.inner.lock().await.failing.insert(method.to_string());
    }

    pub async fn recover(&self, method: &str) {
        self.inner.lock().await.failing.remove(method);
    }

    /// Serve a fixed projection instead of scheduling.
    pub async fn set_etas(&self, etas: EtaResponse) {
        self.inner.lock().await.etas = Some(etas);
    }

    pub async fn set_today(&self, today: NaiveDate) {
        self.inner.lock().await.today = Some(today);
    }

    pub async fn set_ai_suggestions(&self, suggestions: AiSuggestions) {
        self.inner.lock().await.ai_suggestions = suggestions;
    }

    pub async fn set_ai_delay(&self, delay: Duration) {
        self.inner.lock().await.ai_delay = Some(delay);
    }
}

#[async_trait]
impl BoardBackend for InMemoryBackend {
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::FetchTickets)?;
        Ok(inner.linked())
    }

    async fn fetch_etas(
        &self,
        dev_count: u32,
        prioritized: Option<&[String]>,
    ) -> Result<EtaResponse> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::FetchEtas {
            dev_count,
            prioritized: prioritized.map(<[String]>::to_vec),
        })?;
        if let Some(etas) = &inner.etas {
            return Ok(etas.clone());
        }
        let today = inner.today.unwrap_or_else(|| Local::now().date_naive());
        Ok(EtaScheduler::new(dev_count, today).schedule(&inner.tickets, prioritized))
    }

    async fn required_fields_for_stage(&self, stage: Stage) -> Result<Vec<FieldSpec>> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::RequiredFields { stage })?;
        Ok(inner.required_fields.get(&stage).cloned().unwrap_or_default())
    }

    async fn search_potential_blockers(
        &self,
        term: &str,
        current_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<BlockerCandidate>> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::SearchBlockers {
            term: term.to_string(),
            current_id: current_id.to_string(),
        })?;
        super::find_blockers(&inner.tickets, term, current_id, exclude_ids)
    }

    async fn update_ticket_stage(
        &self,
        ticket_id: &str,
        stage: Stage,
        sort_order: Option<f64>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::UpdateStage {
            ticket_id: ticket_id.to_string(),
            stage,
            sort_order,
        })?;
        let ticket = inner.ticket_mut(ticket_id)?;
        ticket.stage = stage;
        if let Some(sort_order) = sort_order {
            ticket.sort_order = sort_order;
        }
        Ok(())
    }

    async fn update_ticket_sort_order(&self, ticket_id: &str, sort_order: f64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::UpdateSortOrder {
            ticket_id: ticket_id.to_string(),
            sort_order,
        })?;
        inner.ticket_mut(ticket_id)?.sort_order = sort_order;
        Ok(())
    }

    async fn save_transition_fields(
        &self,
        ticket_id: &str,
        stage: Stage,
        _values: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::SaveTransitionFields {
            ticket_id: ticket_id.to_string(),
            stage,
        })?;
        inner.ticket_mut(ticket_id)?.stage = stage;
        Ok(())
    }

    async fn create_dependency(&self, blocked_id: &str, blocking_id: &str) -> Result<Dependency> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::CreateDependency {
            blocked_id: blocked_id.to_string(),
            blocking_id: blocking_id.to_string(),
        })?;
        super::check_edge(&inner.tickets, &inner.dependencies, blocked_id, blocking_id)?;
        inner.dependency_counter += 1;
        let dependency = Dependency {
            id: format!("dep-{}", inner.dependency_counter),
            blocking_ticket_id: blocking_id.to_string(),
            blocked_ticket_id: blocked_id.to_string(),
        };
        inner.dependencies.push(dependency.clone());
        Ok(dependency)
    }

    async fn remove_dependency(&self, dependency_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::RemoveDependency {
            dependency_id: dependency_id.to_string(),
        })?;
        let before = inner.dependencies.len();
        inner.dependencies.retain(|d| d.id != dependency_id);
        if inner.dependencies.len() == before {
            return Err(BoardError::DependencyNotFound(dependency_id.to_string()));
        }
        Ok(())
    }

    async fn post_status_comment(&self, ticket_id: &str, body: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::PostComment {
            ticket_id: ticket_id.to_string(),
        })?;
        inner.ticket_mut(ticket_id)?;
        inner.comments.push((ticket_id.to_string(), body.to_string()));
        Ok(())
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let mut inner = self.inner.lock().await;
        inner.enter(BackendCall::CreateTicket {
            title: ticket.title.clone(),
        })?;
        let sort_order = super::next_sort_order(&inner.tickets);
        let number = inner.ticket_counter + 1;
        let created = super::build_ticket(
            format!("mem-{}", number),
            super::format_name("T-", number),
            ticket,
            sort_order,
        )?;
        inner.ticket_counter = number;
        inner.tickets.push(created.clone());
        Ok(created)
    }

    async fn ai_enhance(&self, _title: &str, _description: &str) -> Result<AiSuggestions> {
        let (suggestions, delay) = {
            let mut inner = self.inner.lock().await;
            inner.enter(BackendCall::AiEnhance)?;
            (inner.ai_suggestions.clone(), inner.ai_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_are_recorded_even_when_failing() {
        let backend = InMemoryBackend::new();
        backend.fail_on("fetch_tickets").await;
        assert!(backend.fetch_tickets().await.is_err());
        backend.recover("fetch_tickets").await;
        assert!(backend.fetch_tickets().await.unwrap().is_empty());
        assert_eq!(
            backend.calls().await,
            vec![BackendCall::FetchTickets, BackendCall::FetchTickets]
        );
    }

    #[tokio::test]
    async fn test_intake_is_not_a_mutation() {
        let backend = InMemoryBackend::new();
        let ticket = backend.create_ticket(NewTicket::new("Intake")).await.unwrap();
        assert_eq!(ticket.name, "T-0001");
        assert!(backend.calls().await.iter().all(|c| !c.is_mutation()));

        backend
            .update_ticket_sort_order(&ticket.id, 4.0)
            .await
            .unwrap();
        assert!(backend.calls().await.iter().any(BackendCall::is_mutation));
    }

    #[tokio::test]
    async fn test_seeded_tickets_continue_numbering() {
        let seeded = Ticket::new("s1".into(), "T-0001".into(), "Seeded".into()).with_sort_order(5.0);
        let backend = InMemoryBackend::with_tickets(vec![seeded]);
        let next = backend.create_ticket(NewTicket::new("Next")).await.unwrap();
        assert_eq!(next.name, "T-0002");
        assert_eq!(next.sort_order, 6.0);
    }

    #[tokio::test]
    async fn test_fixed_etas_are_served() {
        let backend = InMemoryBackend::new();
        let fixed = EtaResponse {
            tickets: Vec::new(),
            pushed_back: vec!["x".into()],
        };
        backend.set_etas(fixed.clone()).await;
        assert_eq!(backend.fetch_etas(3, None).await.unwrap(), fixed);
        assert_eq!(
            backend.calls().await,
            vec![BackendCall::FetchEtas {
                dev_count: 3,
                prioritized: None
            }]
        );
    }
}
