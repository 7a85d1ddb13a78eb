use super::utils::{format_stage, print_notifications};
use super::{CommandContext, resolve_ticket};
use crate::board::{Board, DropOutcome};
use crate::cli::Selection;
use crate::error::BoardError;
use crate::gate::{CommentStatus, GateOutcome, PendingTransition};
use crate::model::Stage;
use crate::storage::FileBackend;
use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use std::collections::BTreeMap;

pub async fn handle_move(
    ctx: &CommandContext,
    id: String,
    stage: Stage,
    comment: Option<String>,
    fields: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let mut board = ctx.board(ctx.options(&Selection::default())).await;
    let ticket_id = resolve_ticket(&board, &id)?;

    let outcome = board
        .request_transition(&ticket_id, stage, comment.clone())
        .await?;
    let status = match outcome {
        GateOutcome::Committed { comment } => comment,
        GateOutcome::Pending(pending) => {
            finish_guided(&mut board, &pending, fields, comment.as_deref()).await?
        }
    };
    print_notifications(&mut board);
    report_moved(&board, &ticket_id, stage, &status, json)
}

pub async fn handle_drop(
    ctx: &CommandContext,
    id: String,
    column: String,
    position: Option<usize>,
    selection: Selection,
    fields: Vec<(String, String)>,
    json: bool,
) -> Result<()> {
    let mut board = ctx.board(ctx.options(&selection)).await;
    let ticket_id = resolve_ticket(&board, &id)?;

    board.begin_drag(&ticket_id)?;
    board.hover(&column, position);
    let outcome = board.drop_on(&column, position).await?;

    match outcome {
        DropOutcome::Reordered { sort_order } => {
            print_notifications(&mut board);
            if json {
                println!("{}", json!({ "ticket_id": ticket_id, "sort_order": sort_order }));
            } else {
                println!("{} {} in {}", "Reordered".green(), display_name(&board, &ticket_id).cyan(), column);
            }
            Ok(())
        }
        DropOutcome::Moved { target, .. } => {
            print_notifications(&mut board);
            report_moved(&board, &ticket_id, target, &CommentStatus::NotRequested, json)
        }
        DropOutcome::Pending(pending) => {
            let status = finish_guided(&mut board, &pending, fields, None).await?;
            print_notifications(&mut board);
            report_moved(&board, &ticket_id, pending.target, &status, json)
        }
    }
}

/// Complete a held transition from `--set` values, or explain what is missing.
async fn finish_guided(
    board: &mut Board<FileBackend>,
    pending: &PendingTransition,
    fields: Vec<(String, String)>,
    comment: Option<&str>,
) -> Result<CommentStatus> {
    if fields.is_empty() {
        let labels: Vec<String> = pending
            .required_fields
            .iter()
            .map(|f| format!("{} (--set {}=...)", f.display_label(), f.name))
            .collect();
        board.cancel_pending();
        return Err(BoardError::MissingFields {
            stage: pending.target,
            fields: labels,
        }
        .into());
    }
    let values: BTreeMap<String, String> = fields.into_iter().collect();
    Ok(board.complete_transition(&values, comment).await?)
}

fn display_name(board: &Board<FileBackend>, ticket_id: &str) -> String {
    board
        .ticket(ticket_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| ticket_id.to_string())
}

fn report_moved(
    board: &Board<FileBackend>,
    ticket_id: &str,
    stage: Stage,
    comment: &CommentStatus,
    json: bool,
) -> Result<()> {
    if json {
        let value = json!({
            "ticket_id": ticket_id,
            "stage": stage,
            "comment": comment,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!(
        "{} {} to {}",
        "Moved".green(),
        display_name(board, ticket_id).cyan(),
        format_stage(stage)
    );
    if *comment == CommentStatus::Saved {
        println!("  {}", "Comment posted".dimmed());
    }
    Ok(())
}
