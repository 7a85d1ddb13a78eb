//! Blocking edges between tickets.
//!
//! Cycles are not checked; only self edges are refused here. The backend
//! decides what else it rejects.

use crate::backend::BoardBackend;
use crate::error::{BoardError, Result};
use crate::model::{BlockerCandidate, Dependency, Ticket};

/// Search terms shorter than this never reach the backend.
pub const MIN_SEARCH_LEN: usize = 3;

pub struct DependencyGraph<'a, B: BoardBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: BoardBackend + ?Sized> DependencyGraph<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Tickets that could block `ticket`, excluding itself and anything
    /// already linked to it.
    pub async fn search(&self, term: &str, ticket: &Ticket) -> Result<Vec<BlockerCandidate>> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let exclude = ticket.linked_ids();
        self.backend
            .search_potential_blockers(term, &ticket.id, &exclude)
            .await
    }

    pub async fn create_edge(&self, blocked_id: &str, blocking_id: &str) -> Result<Dependency> {
        validate_edge(blocked_id, blocking_id)?;
        let dependency = self.backend.create_dependency(blocked_id, blocking_id).await?;
        tracing::info!(
            dependency_id = %dependency.id,
            blocked = blocked_id,
            blocking = blocking_id,
            "Created dependency"
        );
        Ok(dependency)
    }

    pub async fn remove_edge(&self, dependency_id: &str) -> Result<()> {
        self.backend.remove_dependency(dependency_id).await?;
        tracing::info!(dependency_id, "Removed dependency");
        Ok(())
    }
}

pub fn validate_edge(blocked_id: &str, blocking_id: &str) -> Result<()> {
    if blocked_id.trim().is_empty() || blocking_id.trim().is_empty() {
        return Err(BoardError::InvalidDependency(
            "Both tickets must be given".to_string(),
        ));
    }
    if blocked_id == blocking_id {
        return Err(BoardError::InvalidDependency(format!(
            "Ticket {} cannot block itself",
            blocked_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTicket;
    use crate::storage::{BackendCall, InMemoryBackend};

    #[tokio::test]
    async fn test_short_terms_skip_the_backend() {
        let backend = InMemoryBackend::new();
        let ticket = backend.create_ticket(NewTicket::new("Payments")).await.unwrap();
        let graph = DependencyGraph::new(&backend);
        assert!(graph.search("pa", &ticket).await.unwrap().is_empty());
        assert!(graph.search("  p ", &ticket).await.unwrap().is_empty());
        assert!(
            !backend
                .calls()
                .await
                .iter()
                .any(|c| matches!(c, BackendCall::SearchBlockers { .. }))
        );
    }

    #[tokio::test]
    async fn test_search_excludes_self_and_linked() {
        let backend = InMemoryBackend::new();
        let a = backend.create_ticket(NewTicket::new("Payment form")).await.unwrap();
        let b = backend.create_ticket(NewTicket::new("Payment API")).await.unwrap();
        let c = backend.create_ticket(NewTicket::new("Payment audit")).await.unwrap();
        let graph = DependencyGraph::new(&backend);
        graph.create_edge(&a.id, &b.id).await.unwrap();

        let a = backend.ticket(&a.id).await.unwrap();
        let found = graph.search("payment", &a).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str()]);
    }

    #[tokio::test]
    async fn test_self_edge_rejected_locally() {
        let backend = InMemoryBackend::new();
        let a = backend.create_ticket(NewTicket::new("Solo")).await.unwrap();
        let err = DependencyGraph::new(&backend)
            .create_edge(&a.id, &a.id)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidDependency(_)));
        assert!(backend.calls().await.iter().all(|c| !c.is_mutation()));
    }

    #[tokio::test]
    async fn test_remove_edge() {
        let backend = InMemoryBackend::new();
        let a = backend.create_ticket(NewTicket::new("One")).await.unwrap();
        let b = backend.create_ticket(NewTicket::new("Two")).await.unwrap();
        let graph = DependencyGraph::new(&backend);
        let edge = graph.create_edge(&a.id, &b.id).await.unwrap();
        graph.remove_edge(&edge.id).await.unwrap();
        assert!(!backend.ticket(&a.id).await.unwrap().is_blocked());
        assert!(graph.remove_edge(&edge.id).await.unwrap_err().is_not_found());
    }
}
