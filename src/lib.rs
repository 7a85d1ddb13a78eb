//! # Delivery Hub - a multi-persona delivery board
//!
//! Delivery Hub presents tickets from a CRM-style record store as a kanban
//! board. Every ticket sits in exactly one of forty-odd workflow stages, and
//! each persona (Client, Consultant, Developer, QA) sees those stages grouped
//! into its own columns.
//!
//! ## Features
//!
//! - **Stage workflow engine**: forward and backtrack options per stage and persona
//! - **Gated transitions**: stages can demand field values before a move commits
//! - **Drag and drop**: reorder within a column or move across columns
//! - **Dependencies**: "blocked by" and "is blocking" links between tickets
//! - **ETA projection**: greedy schedule across a configurable team size
//!
//! ## Quick Start
//!
//! ```bash
//! # Initialize a board
//! delivery-hub init
//!
//! # Create a ticket
//! delivery-hub create "Quote PDF export" -p high
//!
//! # Look at the board as a developer
//! delivery-hub board --persona developer
//!
//! # Move a ticket
//! delivery-hub move T-0001 "Ready for Sizing"
//! ```
//!
//! ## Modules
//!
//! - [`board`]: The board controller tying everything together
//! - [`workflow`]: Stage tables, persona layouts and the transition graph
//! - [`backend`]: The record store abstraction
//! - [`storage`]: File and in-memory record stores
//! - [`gate`]: Required-field gating of transitions

/// The record store abstraction the board talks to.
pub mod backend;

/// Board controller: refresh, transitions, drag and drop, dependencies.
pub mod board;

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `.delivery-hub.yml` files and project discovery.
pub mod config;

pub mod dependency;

/// Display-ready projection of tickets.
pub mod enrich;

/// Error types and result aliases.
///
/// Defines `BoardError` and `Result<T>`.
pub mod error;

pub mod gate;
pub mod logging;

/// Ticket, stage and persona models.
pub mod model;

pub mod reorder;
pub mod search;

/// Record stores.
///
/// A JSON-file store for the CLI and an in-memory store for tests.
pub mod storage;

/// Input validation utilities.
pub mod validation;

/// Stage tables, persona layouts and the transition graph.
pub mod workflow;
