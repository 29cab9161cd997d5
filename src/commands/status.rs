use crate::commands::{Command, CommandResult};
use crate::net::console::Console;
use async_trait::async_trait;

/// Liveness check.
pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "show status"
    }

    async fn execute(&self, console: &mut Console, _args: &[String]) -> CommandResult {
        console.line("OK").await?;
        Ok(())
    }
}
