use crate::commands::{Command, CommandError, CommandResult};
use crate::net::console::Console;
use async_trait::async_trait;

pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "repeat the given arguments"
    }

    async fn execute(&self, console: &mut Console, args: &[String]) -> CommandResult {
        if args.is_empty() {
            return Err(CommandError::invalid_args("Usage: echo <text>..."));
        }

        console.line(args.join(" ")).await?;
        Ok(())
    }
}
