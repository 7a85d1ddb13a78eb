//! The workflow engine's static half: which moves are legal and how stages
//! are grouped into persona columns.
//!
//! Everything here is built from one immutable [`WorkflowConfig`].

mod config;
mod graph;
mod projector;
pub mod tables;

pub use config::{ColumnStyle, ConfigIssue, PersonaLayout, TransitionOverride, WorkflowConfig};
pub use graph::{StageGraph, TransitionOption};
pub use projector::{Column, PersonaViewProjector};
