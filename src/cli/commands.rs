use crate::config::BoardSettings;
use crate::model::{BoardView, Persona, Priority, Stage};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "delivery-hub")]
#[command(
    author,
    version,
    about = "Multi-persona delivery board with a stage workflow engine"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (searches upward for .delivery-hub.yml by default)
    #[arg(long, global = true, env = "DELIVERY_HUB_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write JSON logs to this file (rotated daily)
    #[arg(long, global = true)]
    pub log_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new board in the current directory
    Init {
        /// Data directory, relative to the project root
        #[arg(long, default_value_t = BoardSettings::default().path)]
        path: String,

        /// Prefix for human ticket numbers
        #[arg(long, default_value_t = BoardSettings::default().name_prefix)]
        name_prefix: String,

        /// Namespace prefix of CRM field names
        #[arg(long, default_value_t = BoardSettings::default().field_prefix)]
        field_prefix: String,

        /// Default persona
        #[arg(long, value_enum, default_value = "client")]
        persona: PersonaArg,

        /// Developers available for ETA projection
        #[arg(long, default_value_t = BoardSettings::default().dev_count)]
        dev_count: u32,
    },

    /// Create a ticket in Backlog
    #[command(visible_alias = "new")]
    Create {
        /// Short title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, value_enum)]
        priority: Option<PriorityArg>,

        /// Client intention, e.g. "Will Do"
        #[arg(long)]
        intention: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Size in developer days
        #[arg(long)]
        size: Option<f64>,

        /// Estimated hours
        #[arg(long)]
        hours: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the board for a persona and view
    #[command(visible_alias = "ls")]
    Board {
        #[command(flatten)]
        selection: Selection,

        /// Include extended columns
        #[arg(short, long)]
        all_columns: bool,

        /// Only tickets with this intention
        #[arg(short, long)]
        intention: Option<String>,

        /// Hide empty columns
        #[arg(long)]
        active_only: bool,

        /// Developers available for ETA projection
        #[arg(long)]
        dev_count: Option<u32>,

        /// Schedule these tickets first when projecting ETAs
        #[arg(long)]
        prioritize: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one ticket
    Show {
        /// Ticket id or number
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the stages a ticket can move to
    Options {
        /// Ticket id or number
        id: String,

        #[arg(long, value_enum)]
        persona: Option<PersonaArg>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move a ticket to a stage
    Move {
        /// Ticket id or number
        id: String,

        /// Target stage label, e.g. "Ready for Sizing"
        #[arg(value_parser = parse_stage)]
        stage: Stage,

        /// Status comment to post after the move
        #[arg(short, long)]
        comment: Option<String>,

        /// Required field value, as FIELD=VALUE
        #[arg(long = "set", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop a ticket on a column, as if dragged on the board
    Drop {
        /// Ticket id or number
        id: String,

        /// Column key
        column: String,

        /// Position in the column, 0 is the top (default: end)
        #[arg(long)]
        position: Option<usize>,

        #[command(flatten)]
        selection: Selection,

        /// Required field value, as FIELD=VALUE
        #[arg(long = "set", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record that one ticket blocks another
    Block {
        /// The ticket being blocked
        blocked: String,

        /// The ticket doing the blocking
        blocking: String,
    },

    /// Remove a dependency by id
    Unblock {
        dependency_id: String,
    },

    /// Search for tickets that could block a ticket
    Blockers {
        /// Ticket id or number
        id: String,

        /// Search text; supports field: and regex: prefixes
        term: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project completion dates
    Eta {
        #[arg(long)]
        dev_count: Option<u32>,

        /// Schedule these tickets first
        #[arg(long)]
        prioritize: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the workflow configuration
    Validate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Persona and view selection shared by board commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Selection {
    #[arg(long, value_enum)]
    pub persona: Option<PersonaArg>,

    #[arg(long, value_enum)]
    pub view: Option<ViewArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PersonaArg {
    Client,
    Consultant,
    Developer,
    Qa,
}

impl From<PersonaArg> for Persona {
    fn from(arg: PersonaArg) -> Self {
        match arg {
            PersonaArg::Client => Persona::Client,
            PersonaArg::Consultant => Persona::Consultant,
            PersonaArg::Developer => Persona::Developer,
            PersonaArg::Qa => Persona::Qa,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    All,
    Predev,
    Indev,
    Deployed,
}

impl From<ViewArg> for BoardView {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::All => BoardView::All,
            ViewArg::Predev => BoardView::Predev,
            ViewArg::Indev => BoardView::Indev,
            ViewArg::Deployed => BoardView::Deployed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Critical,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Critical => Priority::Critical,
        }
    }
}

fn parse_stage(s: &str) -> Result<Stage, String> {
    s.parse().map_err(|e: crate::error::BoardError| e.to_string())
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("Budget__c=1200").unwrap(),
            ("Budget__c".to_string(), "1200".to_string())
        );
        assert_eq!(parse_field("Notes__c=a=b").unwrap().1, "a=b");
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_move_parses_stage_labels() {
        let cli = Cli::try_parse_from(["delivery-hub", "move", "T-0001", "ready for sizing"]).unwrap();
        match cli.command {
            Commands::Move { stage, .. } => assert_eq!(stage, Stage::ReadyForSizing),
            _ => panic!("expected move"),
        }
        assert!(Cli::try_parse_from(["delivery-hub", "move", "T-0001", "Limbo"]).is_err());
    }
}
