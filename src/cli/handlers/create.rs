use super::CommandContext;
use super::utils::print_notifications;
use crate::model::{NewTicket, Priority};
use anyhow::Result;
use colored::Colorize;

#[allow(clippy::too_many_arguments)]
pub async fn handle_create(
    ctx: &CommandContext,
    title: String,
    description: String,
    priority: Option<Priority>,
    intention: Option<String>,
    tags: Option<String>,
    size: Option<f64>,
    hours: Option<f64>,
    json: bool,
) -> Result<()> {
    let new = NewTicket {
        title,
        description,
        priority,
        intention,
        tags,
        developer_days_size: size,
        estimated_hours: hours,
    };

    let mut board = ctx.board(ctx.options(&Default::default())).await;
    let ticket = board.create_ticket(new).await?;
    print_notifications(&mut board);

    if json {
        println!("{}", serde_json::to_string_pretty(&ticket)?);
    } else {
        println!(
            "{} {} {}",
            "Created".green(),
            ticket.name.cyan(),
            ticket.title
        );
    }
    Ok(())
}
