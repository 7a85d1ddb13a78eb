use super::CommandContext;
use super::utils::print_notifications;
use crate::cli::Selection;
use crate::validation::validate_dev_count;
use anyhow::Result;
use colored::Colorize;

pub async fn handle_eta(
    ctx: &CommandContext,
    dev_count: Option<u32>,
    prioritize: Vec<String>,
    json: bool,
) -> Result<()> {
    let mut options = ctx.options(&Selection::default());
    if let Some(dev_count) = dev_count {
        validate_dev_count(dev_count)?;
        options.dev_count = dev_count;
    }
    if !prioritize.is_empty() {
        options.prioritized = Some(prioritize);
    }

    let mut board = ctx.board(options).await;
    print_notifications(&mut board);

    if json {
        println!("{}", serde_json::to_string_pretty(board.etas())?);
        return Ok(());
    }

    println!(
        "{} for {} developer(s)",
        "Projection".bold(),
        board.options().dev_count
    );
    let mut cards: Vec<_> = board
        .enriched()
        .into_iter()
        .filter(|card| board.etas().eta_for(card.id()).is_some())
        .collect();
    cards.sort_by_key(|card| board.etas().eta_for(card.id()));
    for card in cards {
        let flag = if card.is_pushed_back {
            "pushed back".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<8} {:<40} {} {}",
            card.ticket.name.cyan(),
            card.ticket.title,
            card.display_date,
            flag
        );
    }
    Ok(())
}
