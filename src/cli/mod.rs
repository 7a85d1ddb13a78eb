mod commands;
pub mod handlers;

pub use commands::{Cli, Commands, PersonaArg, PriorityArg, Selection, ViewArg};
