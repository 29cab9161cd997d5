use crate::net::console::Console;
use async_trait::async_trait;
use thiserror::Error;

mod ask;
mod echo;
mod sessions;
mod status;

pub use ask::AskCommand;
pub use echo::EchoCommand;
pub use sessions::SessionsCommand;
pub use status::StatusCommand;

pub type CommandResult = Result<(), CommandError>;

/// A named unit of work an operator can run from a session.
///
/// `execute` gets the session console for both output and further input, so
/// a command may run a dialog of its own. The session blocks until it returns.
#[async_trait]
pub trait Command: Send + Sync {
    /// Token the command is registered and invoked under.
    fn name(&self) -> &str;

    /// One line shown next to the name in `help`.
    fn description(&self) -> &str;

    async fn execute(&self, console: &mut Console, args: &[String]) -> CommandResult;
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// Arguments did not validate; the message is shown to the operator as is.
    #[error("{0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Custom(String),

    /// The connection failed while the command was using the console.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CommandError {
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        CommandError::InvalidArgs(msg.into())
    }
}
