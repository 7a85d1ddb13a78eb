use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use delivery_hub::cli::handlers::{self, BoardArgs, CommandContext};
use delivery_hub::cli::{Cli, Commands, Selection};
use delivery_hub::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.map(PathBuf::from));

    let config = cli.config;
    let ctx = || CommandContext::load(config.as_deref());

    match cli.command {
        Commands::Init {
            path,
            name_prefix,
            field_prefix,
            persona,
            dev_count,
        } => handlers::handle_init(path, name_prefix, field_prefix, persona.into(), dev_count),
        Commands::Create {
            title,
            description,
            priority,
            intention,
            tags,
            size,
            hours,
            json,
        } => {
            handlers::handle_create(
                &ctx()?,
                title,
                description,
                priority.map(Into::into),
                intention,
                tags,
                size,
                hours,
                json,
            )
            .await
        }
        Commands::Board {
            selection,
            all_columns,
            intention,
            active_only,
            dev_count,
            prioritize,
            json,
        } => {
            let args = BoardArgs {
                selection,
                all_columns,
                intention,
                active_only,
                dev_count,
                prioritize,
                json,
            };
            handlers::handle_board(&ctx()?, args).await
        }
        Commands::Show { id, json } => handlers::handle_show(&ctx()?, id, json).await,
        Commands::Options { id, persona, json } => {
            let selection = Selection {
                persona,
                view: None,
            };
            handlers::handle_options(&ctx()?, id, selection, json).await
        }
        Commands::Move {
            id,
            stage,
            comment,
            fields,
            json,
        } => handlers::handle_move(&ctx()?, id, stage, comment, fields, json).await,
        Commands::Drop {
            id,
            column,
            position,
            selection,
            fields,
            json,
        } => handlers::handle_drop(&ctx()?, id, column, position, selection, fields, json).await,
        Commands::Block { blocked, blocking } => handlers::handle_block(&ctx()?, blocked, blocking).await,
        Commands::Unblock { dependency_id } => handlers::handle_unblock(&ctx()?, dependency_id).await,
        Commands::Blockers { id, term, json } => handlers::handle_blockers(&ctx()?, id, term, json).await,
        Commands::Eta {
            dev_count,
            prioritize,
            json,
        } => handlers::handle_eta(&ctx()?, dev_count, prioritize, json).await,
        Commands::Validate { json } => handlers::handle_validate(&ctx()?, json),
    }
}
