//! The boundary between the workflow engine and whatever stores tickets.
//!
//! The engine only ever talks to a [`BoardBackend`]. `storage::FileBackend`
//! is the bundled implementation; tests use in-memory mocks.

use crate::error::Result;
use crate::model::{
    AiSuggestions, BlockerCandidate, Dependency, EtaResponse, FieldSpec, NewTicket, Stage, Ticket,
};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait BoardBackend: Send + Sync {
    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// All tickets, with their dependency links filled in.
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>>;

    /// Completion estimates for `dev_count` developers. Tickets listed in
    /// `prioritized` are scheduled first.
    async fn fetch_etas(&self, dev_count: u32, prioritized: Option<&[String]>)
    -> Result<EtaResponse>;

    /// Fields that must be filled before a ticket may enter `stage`.
    async fn required_fields_for_stage(&self, stage: Stage) -> Result<Vec<FieldSpec>>;

    async fn search_potential_blockers(
        &self,
        term: &str,
        current_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<BlockerCandidate>>;

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    async fn update_ticket_stage(
        &self,
        ticket_id: &str,
        stage: Stage,
        sort_order: Option<f64>,
    ) -> Result<()>;

    async fn update_ticket_sort_order(&self, ticket_id: &str, sort_order: f64) -> Result<()>;

    /// Commit a guided transition: stage and field values in one write.
    async fn save_transition_fields(
        &self,
        ticket_id: &str,
        stage: Stage,
        values: &BTreeMap<String, String>,
    ) -> Result<()>;

    async fn create_dependency(&self, blocked_id: &str, blocking_id: &str) -> Result<Dependency>;

    async fn remove_dependency(&self, dependency_id: &str) -> Result<()>;

    async fn post_status_comment(&self, ticket_id: &str, body: &str) -> Result<()>;

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket>;

    /// Suggest a better title, description and size. Best effort.
    async fn ai_enhance(&self, title: &str, description: &str) -> Result<AiSuggestions>;
}
