//! Drag and drop ordering with fractional sort keys.
//!
//! A drop is turned into a [`DropPlan`]: the key for the dragged ticket plus
//! any rebalance writes that must land first.

use crate::model::Stage;
use serde::Serialize;

/// Smallest neighbour gap a midpoint may be taken from.
pub const MIN_SORT_GAP: f64 = 1e-9;

/// Transient drag state owned by the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub ticket_id: Option<String>,
    pub source_column: Option<String>,
    pub highlighted_column: Option<String>,
    pub placeholder_index: Option<usize>,
}

impl DragState {
    pub fn begin(&mut self, ticket_id: &str, source_column: &str) {
        self.ticket_id = Some(ticket_id.to_string());
        self.source_column = Some(source_column.to_string());
        self.highlighted_column = Some(source_column.to_string());
        self.placeholder_index = None;
    }

    pub fn hover(&mut self, column: &str, index: Option<usize>) {
        self.highlighted_column = Some(column.to_string());
        self.placeholder_index = index;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.ticket_id.is_some()
    }
}

/// A ticket's position within a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortSlot {
    pub ticket_id: String,
    pub sort_order: f64,
}

impl SortSlot {
    pub fn new(ticket_id: impl Into<String>, sort_order: f64) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            sort_order,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropKind {
    /// Same column, only the key changes.
    Reorder,
    /// Different column, the ticket enters `target`.
    Move { target: Stage },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropPlan {
    pub ticket_id: String,
    pub kind: DropKind,
    pub sort_order: f64,
    /// Writes to apply before the dragged ticket's own write.
    pub rebalance: Vec<SortSlot>,
}

/// Key between `prev` and `next`. A missing `prev` counts as 0; a missing
/// `next` puts the ticket one past `prev`.
pub fn midpoint(prev: Option<f64>, next: Option<f64>) -> f64 {
    let before = prev.unwrap_or(0.0);
    match next {
        Some(after) => (before + after) / 2.0,
        None => before + 1.0,
    }
}

fn needs_rebalance(prev: Option<f64>, next: Option<f64>) -> bool {
    let before = prev.unwrap_or(0.0);
    match next {
        Some(after) => {
            let mid = midpoint(prev, next);
            after - before < MIN_SORT_GAP || !(before < mid && mid < after)
        }
        None => !(midpoint(prev, None) > before),
    }
}

fn neighbours(siblings: &[SortSlot], index: usize) -> (Option<f64>, Option<f64>) {
    let prev = index.checked_sub(1).and_then(|i| siblings.get(i)).map(|s| s.sort_order);
    let next = siblings.get(index).map(|s| s.sort_order);
    (prev, next)
}

/// Compute the key for inserting `ticket_id` at `index` among `siblings`.
///
/// `siblings` is the destination column in display order; the dragged ticket
/// is ignored if present. `None` for `index` means the end of the column.
fn place(ticket_id: &str, siblings: &[SortSlot], index: Option<usize>) -> (f64, Vec<SortSlot>) {
    let mut others: Vec<SortSlot> = siblings
        .iter()
        .filter(|slot| slot.ticket_id != ticket_id)
        .cloned()
        .collect();
    let index = index.unwrap_or(others.len()).min(others.len());

    let (prev, next) = neighbours(&others, index);
    if !needs_rebalance(prev, next) {
        return (midpoint(prev, next), Vec::new());
    }

    let mut writes = Vec::new();
    for (position, slot) in others.iter_mut().enumerate() {
        let bucket = (position + 1) as f64;
        if slot.sort_order != bucket {
            slot.sort_order = bucket;
            writes.push(slot.clone());
        }
    }
    tracing::debug!(ticket_id, rebalanced = writes.len(), "Rebalanced column sort keys");

    let (prev, next) = neighbours(&others, index);
    (midpoint(prev, next), writes)
}

pub fn plan_reorder(ticket_id: &str, siblings: &[SortSlot], index: Option<usize>) -> DropPlan {
    let (sort_order, rebalance) = place(ticket_id, siblings, index);
    DropPlan {
        ticket_id: ticket_id.to_string(),
        kind: DropKind::Reorder,
        sort_order,
        rebalance,
    }
}

pub fn plan_move(
    ticket_id: &str,
    target: Stage,
    siblings: &[SortSlot],
    index: Option<usize>,
) -> DropPlan {
    let (sort_order, rebalance) = place(ticket_id, siblings, index);
    DropPlan {
        ticket_id: ticket_id.to_string(),
        kind: DropKind::Move { target },
        sort_order,
        rebalance,
    }
}
