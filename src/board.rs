//! The board: current selection, fetched data and every user action.
//!
//! Each successful mutation is followed by a full refetch of tickets and
//! ETAs. Every outcome, good or bad, is queued as a [`Notification`].

use crate::backend::BoardBackend;
use crate::config::BoardSettings;
use crate::dependency::DependencyGraph;
use crate::enrich::{EnrichedTicket, TicketEnricher};
use crate::error::{BoardError, ErrorClass, Result};
use crate::gate::{CommentStatus, GateOutcome, PendingTransition, TransitionGate, TransitionRequest};
use crate::model::{
    AiSuggestions, BlockerCandidate, BoardView, Dependency, EtaResponse, IntentionFilter,
    NewTicket, Notification, Persona, ShowMode, Stage, Ticket,
};
use crate::reorder::{self, DragState, DropKind, DropPlan, SortSlot};
use crate::workflow::{Column, PersonaViewProjector, StageGraph, TransitionOption, WorkflowConfig};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardOptions {
    pub persona: Persona,
    pub view: BoardView,
    pub show_extended: bool,
    pub intention: IntentionFilter,
    pub show_mode: ShowMode,
    pub dev_count: u32,
    pub prioritized: Option<Vec<String>>,
    pub ai_timeout: Duration,
    pub block_completion_while_blocked: bool,
    pub estimation_enabled: bool,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self::from_settings(&BoardSettings::default())
    }
}

impl BoardOptions {
    pub fn from_settings(settings: &BoardSettings) -> Self {
        Self {
            persona: settings.persona,
            view: settings.view,
            show_extended: false,
            intention: IntentionFilter::All,
            show_mode: ShowMode::Overall,
            dev_count: settings.dev_count,
            prioritized: None,
            ai_timeout: Duration::from_secs(settings.ai_timeout_secs),
            block_completion_while_blocked: settings.block_completion_while_blocked,
            estimation_enabled: settings.estimation_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DropOutcome {
    Reordered { sort_order: f64 },
    Moved { target: Stage, sort_order: f64 },
    Pending(PendingTransition),
}

/// Clears the in-flight flag however the request ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Board<B: BoardBackend> {
    backend: B,
    graph: StageGraph,
    projector: PersonaViewProjector,
    enricher: TicketEnricher,
    options: BoardOptions,
    tickets: Vec<Ticket>,
    etas: EtaResponse,
    drag: DragState,
    pending: Option<PendingTransition>,
    notifications: Vec<Notification>,
    ai_in_flight: Arc<AtomicBool>,
}

impl<B: BoardBackend> Board<B> {
    pub fn new(backend: B, workflow: &WorkflowConfig, options: BoardOptions) -> Self {
        Self {
            backend,
            graph: StageGraph::new(workflow),
            projector: PersonaViewProjector::new(workflow),
            enricher: TicketEnricher::for_today(),
            options,
            tickets: Vec::new(),
            etas: EtaResponse::default(),
            drag: DragState::default(),
            pending: None,
            notifications: Vec::new(),
            ai_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pin "today" for relative dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.enricher = TicketEnricher::new(today);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &BoardOptions {
        &self.options
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.options.persona = persona;
        self.drag.clear();
    }

    pub fn set_view(&mut self, view: BoardView) {
        self.options.view = view;
        self.drag.clear();
    }

    pub fn set_show_extended(&mut self, show_extended: bool) {
        self.options.show_extended = show_extended;
    }

    pub fn set_intention(&mut self, intention: IntentionFilter) {
        self.options.intention = intention;
    }

    pub fn set_show_mode(&mut self, show_mode: ShowMode) {
        self.options.show_mode = show_mode;
    }

    /// Changing capacity or priorities only takes effect on the next refresh.
    pub fn set_dev_count(&mut self, dev_count: u32) {
        self.options.dev_count = dev_count;
    }

    pub fn set_prioritized(&mut self, prioritized: Option<Vec<String>>) {
        self.options.prioritized = prioritized;
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Refetch tickets and ETAs. Read failures leave the board empty.
    pub async fn refresh(&mut self) {
        match self.backend.fetch_tickets().await {
            Ok(tickets) => self.tickets = tickets,
            Err(e) => {
                self.tickets.clear();
                self.report(ErrorClass::Read, "Could not load tickets", &e);
            }
        }

        let prioritized = self.options.prioritized.as_deref();
        match self
            .backend
            .fetch_etas(self.options.dev_count, prioritized)
            .await
        {
            Ok(etas) => self.etas = etas,
            Err(e) => {
                self.etas = EtaResponse::default();
                self.report(ErrorClass::Read, "Could not load ETAs", &e);
            }
        }
        tracing::debug!(tickets = self.tickets.len(), "Refreshed board");
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn etas(&self) -> &EtaResponse {
        &self.etas
    }

    /// Look up by id or ticket number.
    pub fn ticket(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id || t.name == id)
    }

    fn require_ticket(&self, id: &str) -> Result<Ticket> {
        self.ticket(id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(id.to_string()))
    }

    pub fn enriched(&self) -> Vec<EnrichedTicket> {
        self.enricher.enrich_all(&self.tickets, &self.etas)
    }

    pub fn enriched_ticket(&self, id: &str) -> Option<EnrichedTicket> {
        self.ticket(id).map(|t| self.enricher.enrich(t, &self.etas))
    }

    pub fn columns(&self) -> Vec<Column> {
        let columns = self.projector.build_columns(
            self.options.persona,
            self.options.view,
            self.options.show_extended,
            &self.options.intention,
            &self.enriched(),
        );
        match self.options.show_mode {
            ShowMode::Overall => columns,
            ShowMode::Active => columns.into_iter().filter(|c| !c.is_empty()).collect(),
        }
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn projector(&self) -> &PersonaViewProjector {
        &self.projector
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn report(&mut self, class: ErrorClass, title: &str, error: &BoardError) {
        match class {
            ErrorClass::Secondary => tracing::warn!(error = %error, "{}", title),
            _ => tracing::error!(error = %error, class = ?class, "{}", title),
        }
        let notification = match class {
            ErrorClass::Secondary => Notification::warning(title, error.to_string()),
            _ => Notification::error(title, error.to_string()),
        };
        self.notify(notification);
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn advance_options(&self, ticket_id: &str) -> Result<Vec<TransitionOption>> {
        let ticket = self.require_ticket(ticket_id)?;
        Ok(self.graph.advance_options(ticket.stage, self.options.persona))
    }

    pub fn backtrack_options(&self, ticket_id: &str) -> Result<Vec<TransitionOption>> {
        let ticket = self.require_ticket(ticket_id)?;
        Ok(self.graph.backtrack_options(ticket.stage, self.options.persona))
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    pub fn cancel_pending(&mut self) -> Option<PendingTransition> {
        self.pending.take()
    }

    fn check_completion(&self, ticket: &Ticket, target: Stage) -> Result<()> {
        if self.options.block_completion_while_blocked && target == Stage::Done && ticket.is_blocked()
        {
            return Err(BoardError::StillBlocked(ticket.name.clone()));
        }
        Ok(())
    }

    /// Move a ticket through the gate. A stage that needs more fields leaves
    /// a pending transition on the board for [`Board::complete_transition`].
    pub async fn request_transition(
        &mut self,
        ticket_id: &str,
        target: Stage,
        comment: Option<String>,
    ) -> Result<GateOutcome> {
        let result = self.run_transition(ticket_id, target, None, comment).await;
        if let Err(e) = &result {
            self.report(class_of(e), "Could not move ticket", e);
        }
        result
    }

    async fn run_transition(
        &mut self,
        ticket_id: &str,
        target: Stage,
        placement: Option<(f64, Vec<SortSlot>)>,
        comment: Option<String>,
    ) -> Result<GateOutcome> {
        let ticket = self.require_ticket(ticket_id)?;
        self.check_completion(&ticket, target)?;

        let mut request = TransitionRequest::new(&ticket.id, target).with_comment(comment);
        if let Some((sort_order, rebalance)) = placement {
            request = request.with_sort_order(sort_order).with_rebalance(rebalance);
        }
        let outcome = TransitionGate::new(&self.backend).request(request).await?;

        match &outcome {
            GateOutcome::Committed { comment } => {
                self.notify(Notification::success(
                    "Ticket moved",
                    format!("{} moved to {}", ticket.name, target),
                ));
                self.note_comment(comment);
                self.refresh().await;
            }
            GateOutcome::Pending(pending) => {
                let labels: Vec<&str> = pending
                    .required_fields
                    .iter()
                    .map(|f| f.display_label())
                    .collect();
                self.notify(Notification::info(
                    "More information needed",
                    format!("{} requires: {}", target, labels.join(", ")),
                ));
                self.pending = Some(pending.clone());
            }
        }
        Ok(outcome)
    }

    fn note_comment(&mut self, comment: &CommentStatus) {
        if let CommentStatus::Failed(reason) = comment {
            self.notify(Notification::warning(
                "Comment not saved",
                format!("The move was saved but the comment was not: {}", reason),
            ));
        }
    }

    /// Finish the pending guided transition. Missing fields keep it pending.
    pub async fn complete_transition(
        &mut self,
        values: &BTreeMap<String, String>,
        comment: Option<&str>,
    ) -> Result<CommentStatus> {
        let Some(pending) = self.pending.clone() else {
            let e = BoardError::Validation("No transition is waiting for fields".to_string());
            self.report(ErrorClass::Mutation, "Nothing to complete", &e);
            return Err(e);
        };

        match TransitionGate::new(&self.backend)
            .complete(&pending, values, comment)
            .await
        {
            Ok(status) => {
                self.pending = None;
                let name = self
                    .ticket(&pending.ticket_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| pending.ticket_id.clone());
                self.notify(Notification::success(
                    "Ticket moved",
                    format!("{} moved to {}", name, pending.target),
                ));
                self.note_comment(&status);
                self.refresh().await;
                Ok(status)
            }
            Err(e) => {
                if !pending.rebalance.is_empty() {
                    self.refresh().await;
                }
                self.report(class_of(&e), "Could not complete transition", &e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn begin_drag(&mut self, ticket_id: &str) -> Result<()> {
        let ticket = self.require_ticket(ticket_id)?;
        let column = self
            .projector
            .column_for_stage(self.options.persona, self.options.view, ticket.stage)
            .ok_or_else(|| BoardError::UnknownColumn {
                persona: self.options.persona.to_string(),
                column: ticket.stage.to_string(),
            })?
            .to_string();
        self.drag.begin(&ticket.id, &column);
        Ok(())
    }

    pub fn hover(&mut self, column: &str, index: Option<usize>) {
        if self.drag.is_active() {
            self.drag.hover(column, index);
        }
    }

    pub fn end_drag(&mut self) {
        self.drag.clear();
    }

    /// Drop the dragged ticket on `column` at `index` (end when `None`).
    /// The drag state is cleared whatever happens.
    pub async fn drop_on(&mut self, column: &str, index: Option<usize>) -> Result<DropOutcome> {
        let result = self.handle_drop(column, index).await;
        self.drag.clear();
        if let Err(e) = &result {
            self.report(class_of(e), "Could not drop ticket", e);
        }
        result
    }

    /// Plan a drop without touching anything.
    pub fn plan_drop(&self, ticket_id: &str, column: &str, index: Option<usize>) -> Result<DropPlan> {
        let ticket = self.require_ticket(ticket_id)?;
        let siblings = self.siblings(column)?;
        let source = self
            .projector
            .column_for_stage(self.options.persona, self.options.view, ticket.stage);

        if source == Some(column) {
            return Ok(reorder::plan_reorder(&ticket.id, &siblings, index));
        }
        let target = self.projector.target_stage(self.options.persona, column)?;
        Ok(reorder::plan_move(&ticket.id, target, &siblings, index))
    }

    fn siblings(&self, column: &str) -> Result<Vec<SortSlot>> {
        let column = self
            .columns()
            .into_iter()
            .find(|c| c.key == column)
            .ok_or_else(|| BoardError::UnknownColumn {
                persona: self.options.persona.to_string(),
                column: column.to_string(),
            })?;
        Ok(column
            .tickets
            .iter()
            .map(|t| SortSlot::new(t.id(), t.ticket.sort_order))
            .collect())
    }

    async fn handle_drop(&mut self, column: &str, index: Option<usize>) -> Result<DropOutcome> {
        let ticket_id = self
            .drag
            .ticket_id
            .clone()
            .ok_or_else(|| BoardError::Validation("No ticket is being dragged".to_string()))?;
        let plan = self.plan_drop(&ticket_id, column, index)?;
        let rebalanced = !plan.rebalance.is_empty();

        match plan.kind {
            DropKind::Reorder => {
                // The new key assumes the rebalanced neighbours.
                for slot in &plan.rebalance {
                    if let Err(e) = self
                        .backend
                        .update_ticket_sort_order(&slot.ticket_id, slot.sort_order)
                        .await
                    {
                        self.refresh().await;
                        return Err(e);
                    }
                }
                if let Err(e) = self
                    .backend
                    .update_ticket_sort_order(&plan.ticket_id, plan.sort_order)
                    .await
                {
                    if rebalanced {
                        self.refresh().await;
                    }
                    return Err(e);
                }
                tracing::info!(ticket_id = %plan.ticket_id, sort_order = plan.sort_order, "Reordered ticket");
                self.refresh().await;
                Ok(DropOutcome::Reordered {
                    sort_order: plan.sort_order,
                })
            }
            DropKind::Move { target } => {
                // The gate owns the rebalance writes and applies them only
                // once it clears.
                let placement = Some((plan.sort_order, plan.rebalance));
                match self
                    .run_transition(&plan.ticket_id, target, placement, None)
                    .await
                {
                    Ok(GateOutcome::Committed { .. }) => Ok(DropOutcome::Moved {
                        target,
                        sort_order: plan.sort_order,
                    }),
                    Ok(GateOutcome::Pending(pending)) => Ok(DropOutcome::Pending(pending)),
                    Err(e) => {
                        if rebalanced {
                            self.refresh().await;
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    pub async fn search_blockers(&mut self, ticket_id: &str, term: &str) -> Result<Vec<BlockerCandidate>> {
        let ticket = self.require_ticket(ticket_id)?;
        let result = DependencyGraph::new(&self.backend).search(term, &ticket).await;
        if let Err(e) = &result {
            self.report(ErrorClass::Read, "Blocker search failed", e);
        }
        result
    }

    /// Record that `blocking_id` blocks `blocked_id`.
    pub async fn add_blocker(&mut self, blocked_id: &str, blocking_id: &str) -> Result<Dependency> {
        let result = async {
            let blocked = self.require_ticket(blocked_id)?;
            let blocking = self.require_ticket(blocking_id)?;
            let dependency = DependencyGraph::new(&self.backend)
                .create_edge(&blocked.id, &blocking.id)
                .await?;
            Ok::<_, BoardError>((dependency, blocked.name, blocking.name))
        }
        .await;

        match result {
            Ok((dependency, blocked, blocking)) => {
                self.notify(Notification::success(
                    "Dependency added",
                    format!("{} now blocks {}", blocking, blocked),
                ));
                self.refresh().await;
                Ok(dependency)
            }
            Err(e) => {
                self.report(ErrorClass::Mutation, "Could not add dependency", &e);
                Err(e)
            }
        }
    }

    pub async fn remove_blocker(&mut self, dependency_id: &str) -> Result<()> {
        match DependencyGraph::new(&self.backend).remove_edge(dependency_id).await {
            Ok(()) => {
                self.notify(Notification::success("Dependency removed", dependency_id));
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.report(ErrorClass::Mutation, "Could not remove dependency", &e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Intake
    // ------------------------------------------------------------------

    pub async fn create_ticket(&mut self, new: NewTicket) -> Result<Ticket> {
        match self.backend.create_ticket(new).await {
            Ok(ticket) => {
                self.notify(Notification::success(
                    "Ticket created",
                    format!("{} {}", ticket.name, ticket.title),
                ));
                self.refresh().await;
                Ok(ticket)
            }
            Err(e) => {
                self.report(ErrorClass::Mutation, "Could not create ticket", &e);
                Err(e)
            }
        }
    }

    pub fn is_enhancing(&self) -> bool {
        self.ai_in_flight.load(Ordering::SeqCst)
    }

    /// Ask the backend for better intake details, bounded by the AI timeout.
    pub async fn enhance_details(&mut self, title: &str, description: &str) -> Result<AiSuggestions> {
        if title.trim().is_empty() && description.trim().is_empty() {
            let e = BoardError::Validation("Enter a title or description first".to_string());
            self.notify(Notification::warning("Nothing to enhance", e.to_string()));
            return Err(e);
        }
        if self.ai_in_flight.swap(true, Ordering::SeqCst) {
            let e = BoardError::Validation("An enhancement is already running".to_string());
            self.notify(Notification::info("Please wait", e.to_string()));
            return Err(e);
        }
        let _in_flight = InFlight(Arc::clone(&self.ai_in_flight));

        let timeout = self.options.ai_timeout;
        let result = match tokio::time::timeout(timeout, self.backend.ai_enhance(title, description)).await {
            Ok(result) => result,
            Err(_) => Err(BoardError::Timeout(timeout.as_secs())),
        };

        match result {
            Ok(mut suggestions) if !suggestions.is_empty() => {
                if !self.options.estimation_enabled {
                    suggestions.estimated_days = None;
                }
                self.notify(Notification::success(
                    "Details enhanced",
                    "Review the suggestions before saving",
                ));
                Ok(suggestions)
            }
            Ok(_) => {
                let e = BoardError::Backend("No suggestions were returned".to_string());
                self.report(ErrorClass::Secondary, "Enhancement came back empty", &e);
                Err(e)
            }
            Err(e) => {
                self.report(ErrorClass::Secondary, "Enhancement failed", &e);
                Err(e)
            }
        }
    }
}

fn class_of(error: &BoardError) -> ErrorClass {
    match error {
        BoardError::Gate { .. } => ErrorClass::Gate,
        _ => ErrorClass::Mutation,
    }
}
