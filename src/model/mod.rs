//! Data models for the delivery board.
//!
//! - [`Stage`]: the closed lifecycle enum, with owners and colors
//! - [`Ticket`]: a delivery ticket with its dependency links
//! - [`Persona`], [`BoardView`], [`IntentionFilter`]: board selections
//! - [`Notification`]: user-facing outcome of an action

mod stage;
mod ticket;
mod types;

pub use stage::{DEFAULT_OWNER_COLOR, Stage, StageOwner};
pub use ticket::{
    AiSuggestions, BlockerCandidate, Dependency, DependencyLink, EtaProjection, EtaResponse,
    FieldSpec, NewTicket, Ticket,
};
pub use types::{
    BoardView, IntentionFilter, Notification, Persona, Priority, Severity, ShowMode,
    intention_color,
};
