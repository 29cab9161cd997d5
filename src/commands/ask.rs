use crate::commands::{Command, CommandError, CommandResult};
use crate::net::console::Console;
use async_trait::async_trait;

/// Asks the operator to confirm before acknowledging. Shows how a command
/// can keep reading from the console while it runs.
pub struct AskCommand;

#[async_trait]
impl Command for AskCommand {
    fn name(&self) -> &str {
        "ask"
    }

    fn description(&self) -> &str {
        "ask for confirmation before doing nothing"
    }

    async fn execute(&self, console: &mut Console, args: &[String]) -> CommandResult {
        let what = if args.is_empty() { "continue".to_string() } else { args.join(" ") };

        console.write(format!("Really {what}? [y/n] ")).await?;
        let Some(answer) = console.read_line().await? else {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        };

        match answer.trim() {
            "y" | "yes" => {
                console.line(format!("Okay, {what}.")).await?;
                Ok(())
            }
            "n" | "no" => Err(CommandError::Custom("Cancelled.".to_string())),
            other => Err(CommandError::invalid_args(format!("Expected y or n, got '{other}'."))),
        }
    }
}
