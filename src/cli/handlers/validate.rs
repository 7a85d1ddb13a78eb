use super::CommandContext;
use crate::workflow::ConfigIssue;
use anyhow::{Result, bail};
use colored::Colorize;

pub fn handle_validate(ctx: &CommandContext, json: bool) -> Result<()> {
    let issues = ctx.workflow.validate();
    let errors = issues.iter().filter(|i| i.is_error()).count();

    if json {
        let value = serde_json::json!({
            "errors": errors,
            "issues": issues.iter().map(|issue| serde_json::json!({
                "severity": severity(issue),
                "message": issue.to_string(),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if issues.is_empty() {
        println!("{} workflow configuration", "Valid".green());
    } else {
        for issue in &issues {
            let label = if issue.is_error() {
                "error".red().bold()
            } else {
                "warning".yellow().bold()
            };
            println!("{}: {}", label, issue);
        }
    }

    if errors > 0 {
        bail!("Workflow configuration has {} error(s)", errors);
    }
    Ok(())
}

fn severity(issue: &ConfigIssue) -> &'static str {
    if issue.is_error() { "error" } else { "warning" }
}
