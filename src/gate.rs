//! Required-field checks in front of every committed stage change.

use crate::backend::BoardBackend;
use crate::error::{BoardError, Result};
use crate::model::{FieldSpec, Stage};
use crate::reorder::SortSlot;
use serde::Serialize;
use std::collections::BTreeMap;

/// What happened to the optional status comment after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommentStatus {
    NotRequested,
    Saved,
    Failed(String),
}

/// A transition held back until its required fields are supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTransition {
    pub ticket_id: String,
    pub target: Stage,
    pub required_fields: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<f64>,
    /// Sibling keys to rewrite once the fields are in.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rebalance: Vec<SortSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GateOutcome {
    Committed { comment: CommentStatus },
    Pending(PendingTransition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub ticket_id: String,
    pub target: Stage,
    pub sort_order: Option<f64>,
    pub comment: Option<String>,
    pub rebalance: Vec<SortSlot>,
}

impl TransitionRequest {
    pub fn new(ticket_id: impl Into<String>, target: Stage) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            target,
            sort_order: None,
            comment: None,
            rebalance: Vec::new(),
        }
    }

    pub fn with_sort_order(mut self, sort_order: f64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    /// Destination keys that must be rewritten before the ticket lands.
    pub fn with_rebalance(mut self, rebalance: Vec<SortSlot>) -> Self {
        self.rebalance = rebalance;
        self
    }
}

pub struct TransitionGate<'a, B: BoardBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: BoardBackend + ?Sized> TransitionGate<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    pub async fn required_fields(&self, target: Stage) -> Result<Vec<FieldSpec>> {
        self.backend
            .required_fields_for_stage(target)
            .await
            .map_err(|e| BoardError::Gate {
                stage: target,
                reason: e.to_string(),
            })
    }

    /// Commit the move when `target` needs nothing, otherwise hand back a
    /// pending transition and leave the ticket untouched. Nothing is written
    /// unless the requirements lookup succeeds and comes back empty.
    pub async fn request(&self, request: TransitionRequest) -> Result<GateOutcome> {
        let required_fields = self.required_fields(request.target).await?;
        if !required_fields.is_empty() {
            tracing::info!(
                ticket_id = %request.ticket_id,
                stage = %request.target,
                fields = required_fields.len(),
                "Transition needs more information"
            );
            return Ok(GateOutcome::Pending(PendingTransition {
                ticket_id: request.ticket_id,
                target: request.target,
                required_fields,
                sort_order: request.sort_order,
                rebalance: request.rebalance,
            }));
        }

        self.rebalance(&request.ticket_id, &request.rebalance).await?;
        self.backend
            .update_ticket_stage(&request.ticket_id, request.target, request.sort_order)
            .await?;
        tracing::info!(ticket_id = %request.ticket_id, stage = %request.target, "Moved ticket");

        let comment = self
            .post_comment(&request.ticket_id, request.comment.as_deref())
            .await;
        Ok(GateOutcome::Committed { comment })
    }

    /// Finish a guided transition with the collected field values.
    pub async fn complete(
        &self,
        pending: &PendingTransition,
        values: &BTreeMap<String, String>,
        comment: Option<&str>,
    ) -> Result<CommentStatus> {
        let missing: Vec<String> = pending
            .required_fields
            .iter()
            .filter(|field| {
                values
                    .get(&field.name)
                    .map(|value| value.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|field| field.display_label().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BoardError::MissingFields {
                stage: pending.target,
                fields: missing,
            });
        }

        self.rebalance(&pending.ticket_id, &pending.rebalance).await?;
        self.backend
            .save_transition_fields(&pending.ticket_id, pending.target, values)
            .await?;
        tracing::info!(
            ticket_id = %pending.ticket_id,
            stage = %pending.target,
            "Saved guided transition"
        );

        if let Some(sort_order) = pending.sort_order {
            if let Err(e) = self
                .backend
                .update_ticket_sort_order(&pending.ticket_id, sort_order)
                .await
            {
                tracing::warn!(
                    ticket_id = %pending.ticket_id,
                    error = %e,
                    "Failed to place ticket after transition"
                );
            }
        }

        Ok(self.post_comment(&pending.ticket_id, comment).await)
    }

    /// Rewrite sibling keys. The first failure aborts; keys already written
    /// stay, so callers refetch.
    async fn rebalance(&self, ticket_id: &str, slots: &[SortSlot]) -> Result<()> {
        for slot in slots {
            self.backend
                .update_ticket_sort_order(&slot.ticket_id, slot.sort_order)
                .await?;
        }
        if !slots.is_empty() {
            tracing::info!(ticket_id, rebalanced = slots.len(), "Rebalanced destination column");
        }
        Ok(())
    }

    async fn post_comment(&self, ticket_id: &str, comment: Option<&str>) -> CommentStatus {
        let Some(body) = comment.map(str::trim).filter(|body| !body.is_empty()) else {
            return CommentStatus::NotRequested;
        };
        match self.backend.post_status_comment(ticket_id, body).await {
            Ok(()) => CommentStatus::Saved,
            Err(e) => {
                tracing::warn!(ticket_id, error = %e, "Failed to post status comment");
                CommentStatus::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTicket;
    use crate::storage::{BackendCall, InMemoryBackend};

    async fn backend_with_ticket() -> (InMemoryBackend, String) {
        let backend = InMemoryBackend::new();
        let ticket = backend.create_ticket(NewTicket::new("Checkout")).await.unwrap();
        (backend, ticket.id)
    }

    #[tokio::test]
    async fn test_no_requirements_commits() {
        let (backend, id) = backend_with_ticket().await;
        let gate = TransitionGate::new(&backend);
        let outcome = gate
            .request(TransitionRequest::new(&id, Stage::ReadyForSizing))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GateOutcome::Committed {
                comment: CommentStatus::NotRequested
            }
        );
        assert_eq!(backend.ticket(&id).await.unwrap().stage, Stage::ReadyForSizing);
    }

    #[tokio::test]
    async fn test_requirements_hold_the_move() {
        let (backend, id) = backend_with_ticket().await;
        let fields = vec![FieldSpec::new("Budget__c", "Budget")];
        backend.require_fields(Stage::ReadyForDevelopment, fields.clone()).await;
        let gate = TransitionGate::new(&backend);

        let outcome = gate
            .request(TransitionRequest::new(&id, Stage::ReadyForDevelopment))
            .await
            .unwrap();
        let GateOutcome::Pending(pending) = outcome else {
            panic!("expected a pending transition");
        };
        assert_eq!(pending.required_fields, fields);
        assert_eq!(backend.ticket(&id).await.unwrap().stage, Stage::Backlog);
        assert!(!backend.calls().await.iter().any(|c| c.is_mutation()));

        let err = gate.complete(&pending, &BTreeMap::new(), None).await.unwrap_err();
        assert!(matches!(err, BoardError::MissingFields { .. }));

        let values = BTreeMap::from([("Budget__c".to_string(), "1200".to_string())]);
        let status = gate.complete(&pending, &values, Some("approved")).await.unwrap();
        assert_eq!(status, CommentStatus::Saved);
        let ticket = backend.ticket(&id).await.unwrap();
        assert_eq!(ticket.stage, Stage::ReadyForDevelopment);
        assert!(backend.calls().await.contains(&BackendCall::SaveTransitionFields {
            ticket_id: id.clone(),
            stage: Stage::ReadyForDevelopment,
        }));
    }

    #[tokio::test]
    async fn test_blank_value_counts_as_missing() {
        let (backend, id) = backend_with_ticket().await;
        let pending = PendingTransition {
            ticket_id: id,
            target: Stage::ReadyForQa,
            required_fields: vec![FieldSpec::new("Notes__c", "")],
            sort_order: None,
            rebalance: Vec::new(),
        };
        let values = BTreeMap::from([("Notes__c".to_string(), "   ".to_string())]);
        let err = TransitionGate::new(&backend)
            .complete(&pending, &values, None)
            .await
            .unwrap_err();
        match err {
            BoardError::MissingFields { fields, .. } => assert_eq!(fields, vec!["Notes__c"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_gate_failure_aborts_without_mutation() {
        let (backend, id) = backend_with_ticket().await;
        backend.fail_on("required_fields_for_stage").await;
        let err = TransitionGate::new(&backend)
            .request(TransitionRequest::new(&id, Stage::ReadyForSizing))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Gate { .. }));
        assert_eq!(backend.ticket(&id).await.unwrap().stage, Stage::Backlog);
    }

    #[tokio::test]
    async fn test_gate_failure_skips_rebalance() {
        let (backend, id) = backend_with_ticket().await;
        let other = backend.create_ticket(NewTicket::new("Invoices")).await.unwrap();
        backend.fail_on("required_fields_for_stage").await;
        backend.clear_calls().await;

        let err = TransitionGate::new(&backend)
            .request(
                TransitionRequest::new(&id, Stage::ReadyForSizing)
                    .with_sort_order(1.5)
                    .with_rebalance(vec![SortSlot::new(&other.id, 2.0)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Gate { .. }));
        assert!(!backend.calls().await.iter().any(|c| c.is_mutation()));
    }

    #[tokio::test]
    async fn test_pending_rebalance_applies_on_complete() {
        let (backend, id) = backend_with_ticket().await;
        let other = backend.create_ticket(NewTicket::new("Invoices")).await.unwrap();
        backend
            .require_fields(Stage::ReadyForSizing, vec![FieldSpec::new("Budget__c", "Budget")])
            .await;
        let gate = TransitionGate::new(&backend);

        let outcome = gate
            .request(
                TransitionRequest::new(&id, Stage::ReadyForSizing)
                    .with_sort_order(1.5)
                    .with_rebalance(vec![SortSlot::new(&other.id, 7.0)]),
            )
            .await
            .unwrap();
        let GateOutcome::Pending(pending) = outcome else {
            panic!("expected a pending transition");
        };
        assert_eq!(pending.rebalance, vec![SortSlot::new(&other.id, 7.0)]);
        assert_eq!(backend.ticket(&other.id).await.unwrap().sort_order, 2.0);

        let values = BTreeMap::from([("Budget__c".to_string(), "1200".to_string())]);
        gate.complete(&pending, &values, None).await.unwrap();
        assert_eq!(backend.ticket(&other.id).await.unwrap().sort_order, 7.0);
        assert_eq!(backend.ticket(&id).await.unwrap().sort_order, 1.5);
    }

    #[tokio::test]
    async fn test_comment_failure_keeps_the_move() {
        let (backend, id) = backend_with_ticket().await;
        backend.fail_on("post_status_comment").await;
        let outcome = TransitionGate::new(&backend)
            .request(
                TransitionRequest::new(&id, Stage::ScopingInProgress)
                    .with_comment(Some("kicking off".into())),
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            GateOutcome::Committed {
                comment: CommentStatus::Failed(_)
            }
        ));
        assert_eq!(
            backend.ticket(&id).await.unwrap().stage,
            Stage::ScopingInProgress
        );
    }
}
