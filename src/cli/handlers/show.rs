use super::CommandContext;
use super::utils::{format_priority, format_stage, print_notifications};
use crate::enrich::EnrichedTicket;
use crate::error::BoardError;
use anyhow::Result;
use colored::Colorize;

pub async fn handle_show(ctx: &CommandContext, id: String, json: bool) -> Result<()> {
    let mut board = ctx.board(ctx.options(&Default::default())).await;
    print_notifications(&mut board);
    let card = board
        .enriched_ticket(&id)
        .ok_or_else(|| BoardError::NotFound(id.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        print_card(&card);
    }
    Ok(())
}

fn print_card(card: &EnrichedTicket) {
    let ticket = &card.ticket;
    println!("{} {}", ticket.name.cyan().bold(), ticket.title.bold());
    println!("Stage:    {} ({})", format_stage(ticket.stage), card.owner);
    println!("Priority: {}", format_priority(ticket.priority));
    if let Some(intention) = &ticket.intention {
        println!("Intent:   {}", intention);
    }
    println!("{}: {}", card.date_label.as_str(), card.display_date);
    if let Some(uat) = &card.uat_display {
        println!("UAT:      {}", uat);
    }
    println!("Size:     {}", card.size_display);
    println!("Hours:    {}", card.hours_display);
    if !card.tags.is_empty() {
        println!("Tags:     {}", card.tags.join(", ").blue());
    }

    if !card.is_blocked_by.is_empty() {
        println!("{}", "Blocked by:".red());
        for link in &card.is_blocked_by {
            println!("  {} {}", link.name.cyan(), format!("[{}]", link.dependency_id).dimmed());
        }
    }
    if !card.is_blocking.is_empty() {
        println!("Blocking:");
        for link in &card.is_blocking {
            println!("  {} {}", link.name.cyan(), format!("[{}]", link.dependency_id).dimmed());
        }
    }

    if !ticket.description.is_empty() {
        println!();
        println!("{}", ticket.description);
    }
}
