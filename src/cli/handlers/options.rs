use super::CommandContext;
use super::utils::{format_stage, print_notifications};
use crate::cli::Selection;
use crate::workflow::TransitionOption;
use anyhow::Result;
use colored::Colorize;

pub async fn handle_options(ctx: &CommandContext, id: String, selection: Selection, json: bool) -> Result<()> {
    let mut board = ctx.board(ctx.options(&selection)).await;
    print_notifications(&mut board);
    let advance = board.advance_options(&id)?;
    let backtrack = board.backtrack_options(&id)?;

    if json {
        let value = serde_json::json!({
            "advance": advance,
            "backtrack": backtrack,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some(ticket) = board.ticket(&id) {
        println!("{} is in {}", ticket.name.cyan(), format_stage(ticket.stage));
    }
    print_group("Advance", &advance);
    print_group("Backtrack", &backtrack);
    Ok(())
}

fn print_group(title: &str, options: &[TransitionOption]) {
    println!("{}", title.bold());
    if options.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for option in options {
        let focus = if option.autofocus { " *" } else { "" };
        println!("  {} {}{}", option.icon, format_stage(option.target), focus);
        if option.label != option.target.label() {
            println!("      {}", option.label.dimmed());
        }
    }
}
