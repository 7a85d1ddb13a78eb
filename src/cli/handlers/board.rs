use super::CommandContext;
use super::utils::{format_priority, paint, print_notifications};
use crate::cli::Selection;
use crate::model::{IntentionFilter, ShowMode};
use crate::validation::validate_dev_count;
use crate::workflow::Column;
use anyhow::Result;
use colored::Colorize;

pub struct BoardArgs {
    pub selection: Selection,
    pub all_columns: bool,
    pub intention: Option<String>,
    pub active_only: bool,
    pub dev_count: Option<u32>,
    pub prioritize: Vec<String>,
    pub json: bool,
}

pub async fn handle_board(ctx: &CommandContext, args: BoardArgs) -> Result<()> {
    let mut options = ctx.options(&args.selection);
    options.show_extended = args.all_columns;
    if let Some(intention) = &args.intention {
        options.intention = intention.parse()?;
    }
    if args.active_only {
        options.show_mode = ShowMode::Active;
    }
    if let Some(dev_count) = args.dev_count {
        validate_dev_count(dev_count)?;
        options.dev_count = dev_count;
    }
    if !args.prioritize.is_empty() {
        options.prioritized = Some(args.prioritize.clone());
    }

    let mut board = ctx.board(options).await;
    print_notifications(&mut board);
    let columns = board.columns();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }

    let opts = board.options();
    let filter = match &opts.intention {
        IntentionFilter::All => String::new(),
        IntentionFilter::Only(value) => format!(", intention: {}", value),
    };
    println!(
        "{} {} / {}{}",
        "Board".bold(),
        opts.persona.to_string().cyan(),
        opts.view,
        filter.dimmed()
    );
    for column in &columns {
        print_column(column);
    }
    Ok(())
}

fn print_column(column: &Column) {
    println!();
    println!(
        "{} {} {}",
        paint(&column.display_name, column.owner_color()).bold(),
        format!("({})", column.tickets.len()).dimmed(),
        column.owner_label().dimmed()
    );
    for card in &column.tickets {
        let mut markers = Vec::new();
        if card.is_currently_blocked {
            markers.push("blocked".red().to_string());
        }
        if card.is_pushed_back {
            markers.push("pushed back".yellow().to_string());
        }
        if card.ticket.stage.label() != column.display_name {
            markers.push(card.ticket.stage.label().dimmed().to_string());
        }
        println!(
            "  {:<8} {}  {}  {} {}",
            card.ticket.name.cyan(),
            card.ticket.title,
            format_priority(card.ticket.priority),
            card.display_date.dimmed(),
            markers.join(" ")
        );
    }
}
