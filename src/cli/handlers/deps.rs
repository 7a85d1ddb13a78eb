use super::utils::{format_stage, print_notifications};
use super::{CommandContext, resolve_ticket};
use crate::cli::Selection;
use crate::dependency::MIN_SEARCH_LEN;
use anyhow::Result;
use colored::Colorize;

pub async fn handle_block(ctx: &CommandContext, blocked: String, blocking: String) -> Result<()> {
    let mut board = ctx.board(ctx.options(&Selection::default())).await;
    let blocked_id = resolve_ticket(&board, &blocked)?;
    let blocking_id = resolve_ticket(&board, &blocking)?;

    let dependency = board.add_blocker(&blocked_id, &blocking_id).await?;
    print_notifications(&mut board);
    println!(
        "{} {} blocks {} {}",
        "Linked".green(),
        blocking.cyan(),
        blocked.cyan(),
        format!("[{}]", dependency.id).dimmed()
    );
    Ok(())
}

pub async fn handle_unblock(ctx: &CommandContext, dependency_id: String) -> Result<()> {
    let mut board = ctx.board(ctx.options(&Selection::default())).await;
    board.remove_blocker(&dependency_id).await?;
    print_notifications(&mut board);
    println!("{} {}", "Removed".green(), dependency_id);
    Ok(())
}

pub async fn handle_blockers(ctx: &CommandContext, id: String, term: String, json: bool) -> Result<()> {
    let mut board = ctx.board(ctx.options(&Selection::default())).await;
    let ticket_id = resolve_ticket(&board, &id)?;
    let candidates = board.search_blockers(&ticket_id, &term).await?;
    print_notifications(&mut board);

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }
    if term.trim().chars().count() < MIN_SEARCH_LEN {
        println!(
            "{}",
            format!("Search needs at least {} characters", MIN_SEARCH_LEN).dimmed()
        );
        return Ok(());
    }
    if candidates.is_empty() {
        println!("{}", "No matching tickets".dimmed());
    }
    for candidate in candidates {
        println!(
            "{:<8} {}  {}",
            candidate.name.cyan(),
            candidate.title,
            format_stage(candidate.stage)
        );
    }
    Ok(())
}
