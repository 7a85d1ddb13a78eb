//! Ticket stores behind the [`BoardBackend`](crate::backend::BoardBackend)
//! boundary.
//!
//! ## Data directory
//!
//! ```text
//! .delivery-hub/
//!   tickets.json        raw CRM records, prefixed or bare field names
//!   dependencies.json   [{id, blocking_ticket_id, blocked_ticket_id}]
//!   comments.json       status comments, append only
//!   .id                 counter behind ticket numbers (T-0001, ...)
//! ```
//!
//! ## Components
//!
//! - [`FileBackend`]: the data directory above
//! - [`InMemoryBackend`]: the same rules kept in memory, with call recording
//! - [`FieldMap`]: canonical field names over raw records
//! - [`EtaScheduler`]: completion estimates from developer capacity

pub mod eta;
pub mod fields;
mod memory;
mod repository;

pub use eta::EtaScheduler;
pub use fields::{FieldMap, RawRecord};
pub use memory::{BackendCall, InMemoryBackend};
pub use repository::FileBackend;

use crate::error::{BoardError, Result};
use crate::model::{
    BlockerCandidate, Dependency, DependencyLink, NewTicket, Priority, Stage, Ticket,
};
use crate::search::SearchQuery;
use crate::validation;
use std::collections::HashMap;

/// Upper bound on blocker search results.
pub const MAX_BLOCKER_RESULTS: usize = 20;

/// Fill `blocked_by` and `blocking` from the edge list. Edges pointing at
/// unknown tickets are ignored.
pub(crate) fn link_tickets(tickets: &mut [Ticket], dependencies: &[Dependency]) {
    let names: HashMap<String, String> = tickets
        .iter()
        .map(|t| (t.id.clone(), t.name.clone()))
        .collect();
    let index: HashMap<String, usize> = tickets
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.clone(), i))
        .collect();

    for ticket in tickets.iter_mut() {
        ticket.blocked_by.clear();
        ticket.blocking.clear();
    }

    for dep in dependencies {
        let (Some(&blocked), Some(&blocking)) = (
            index.get(&dep.blocked_ticket_id),
            index.get(&dep.blocking_ticket_id),
        ) else {
            tracing::warn!(dependency_id = %dep.id, "Skipping dependency with unknown ticket");
            continue;
        };
        tickets[blocked].blocked_by.push(DependencyLink {
            dependency_id: dep.id.clone(),
            ticket_id: dep.blocking_ticket_id.clone(),
            ticket_name: names.get(&dep.blocking_ticket_id).cloned(),
        });
        tickets[blocking].blocking.push(DependencyLink {
            dependency_id: dep.id.clone(),
            ticket_id: dep.blocked_ticket_id.clone(),
            ticket_name: names.get(&dep.blocked_ticket_id).cloned(),
        });
    }
}

pub(crate) fn find_blockers(
    tickets: &[Ticket],
    term: &str,
    current_id: &str,
    exclude_ids: &[String],
) -> Result<Vec<BlockerCandidate>> {
    let query = SearchQuery::parse(term)?;
    Ok(tickets
        .iter()
        .filter(|t| t.is_active && t.id != current_id)
        .filter(|t| !exclude_ids.contains(&t.id))
        .filter(|t| query.matches(t))
        .take(MAX_BLOCKER_RESULTS)
        .map(BlockerCandidate::from)
        .collect())
}

/// Both ends must exist, differ, and not already be linked.
pub(crate) fn check_edge(
    tickets: &[Ticket],
    dependencies: &[Dependency],
    blocked_id: &str,
    blocking_id: &str,
) -> Result<()> {
    if blocked_id == blocking_id {
        return Err(BoardError::InvalidDependency(format!(
            "Ticket {} cannot block itself",
            blocked_id
        )));
    }
    for id in [blocked_id, blocking_id] {
        if !tickets.iter().any(|t| t.id == id) {
            return Err(BoardError::NotFound(id.to_string()));
        }
    }
    if dependencies
        .iter()
        .any(|d| d.blocked_ticket_id == blocked_id && d.blocking_ticket_id == blocking_id)
    {
        return Err(BoardError::InvalidDependency(format!(
            "{} already blocks {}",
            blocking_id, blocked_id
        )));
    }
    Ok(())
}

pub(crate) fn next_sort_order(tickets: &[Ticket]) -> f64 {
    tickets
        .iter()
        .map(|t| t.sort_order)
        .filter(|s| s.is_finite())
        .reduce(f64::max)
        .map(|max| max + 1.0)
        .unwrap_or(1.0)
}

/// Validate an intake payload and shape it into a Backlog ticket.
pub(crate) fn build_ticket(
    id: String,
    name: String,
    new: NewTicket,
    sort_order: f64,
) -> Result<Ticket> {
    validation::validate_title(&new.title)?;
    validation::validate_description(&new.description)?;
    if let Some(tags) = &new.tags {
        validation::validate_tags(tags)?;
    }
    if let Some(days) = new.developer_days_size {
        validation::validate_size(days)?;
    }
    if let Some(hours) = new.estimated_hours {
        validation::validate_amount("Estimated hours", hours)?;
    }

    let mut ticket = Ticket::new(id, name, new.title.trim().to_string())
        .with_stage(Stage::Backlog)
        .with_priority(new.priority.unwrap_or(Priority::Medium))
        .with_sort_order(sort_order)
        .with_description(new.description);
    ticket.intention = new.intention.filter(|i| !i.trim().is_empty());
    ticket.tags = new.tags.filter(|t| !t.trim().is_empty());
    ticket.developer_days_size = new.developer_days_size;
    ticket.estimated_hours = new.estimated_hours;
    Ok(ticket)
}

pub(crate) fn format_name(prefix: &str, number: u64) -> String {
    format!("{}{:0>4}", prefix, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: &str, name: &str) -> Ticket {
        Ticket::new(id.into(), name.into(), format!("Ticket {}", name))
    }

    fn dep(id: &str, blocked: &str, blocking: &str) -> Dependency {
        Dependency {
            id: id.into(),
            blocked_ticket_id: blocked.into(),
            blocking_ticket_id: blocking.into(),
        }
    }

    #[test]
    fn test_link_tickets_fills_both_sides() {
        let mut tickets = vec![ticket("a", "T-1"), ticket("b", "T-2")];
        link_tickets(&mut tickets, &[dep("d1", "b", "a"), dep("d2", "b", "ghost")]);

        assert!(tickets[1].is_blocked());
        assert_eq!(tickets[1].blocked_by[0].ticket_id, "a");
        assert_eq!(tickets[1].blocked_by[0].ticket_name.as_deref(), Some("T-1"));
        assert_eq!(tickets[0].blocking[0].ticket_id, "b");
        assert_eq!(tickets[0].blocking[0].dependency_id, "d1");
        assert_eq!(tickets[1].blocked_by.len(), 1);
    }

    #[test]
    fn test_check_edge() {
        let tickets = vec![ticket("a", "T-1"), ticket("b", "T-2")];
        let deps = vec![dep("d1", "b", "a")];
        assert!(check_edge(&tickets, &deps, "a", "b").is_ok());
        assert!(matches!(
            check_edge(&tickets, &deps, "b", "a"),
            Err(BoardError::InvalidDependency(_))
        ));
        assert!(matches!(
            check_edge(&tickets, &deps, "a", "a"),
            Err(BoardError::InvalidDependency(_))
        ));
        assert!(check_edge(&tickets, &deps, "a", "zzz").unwrap_err().is_not_found());
    }

    #[test]
    fn test_next_sort_order() {
        assert_eq!(next_sort_order(&[]), 1.0);
        let tickets = vec![
            ticket("a", "1").with_sort_order(4.5),
            ticket("b", "2").with_sort_order(-2.0),
        ];
        assert_eq!(next_sort_order(&tickets), 5.5);
    }

    #[test]
    fn test_build_ticket_defaults() {
        let new = NewTicket {
            title: "  Export  ".into(),
            intention: Some(" ".into()),
            ..NewTicket::default()
        };
        let built = build_ticket("x".into(), format_name("T-", 7), new, 3.0).unwrap();
        assert_eq!(built.name, "T-0007");
        assert_eq!(built.title, "Export");
        assert_eq!(built.stage, Stage::Backlog);
        assert_eq!(built.priority, Priority::Medium);
        assert_eq!(built.sort_order, 3.0);
        assert!(built.is_active);
        assert_eq!(built.intention, None);

        assert!(build_ticket("y".into(), "T-1".into(), NewTicket::new(""), 1.0).is_err());
    }

    #[test]
    fn test_find_blockers_filters() {
        let mut inactive = ticket("c", "T-3");
        inactive.is_active = false;
        let tickets = vec![ticket("a", "T-1"), ticket("b", "T-2"), inactive];
        let found = find_blockers(&tickets, "ticket", "a", &[]).unwrap();
        let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        let found = find_blockers(&tickets, "ticket", "a", &["b".to_string()]).unwrap();
        assert!(found.is_empty());
    }
}
