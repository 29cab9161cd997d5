use crate::Service;
use crate::commands::CommandError;
use crate::input::parser::{Request, Reserved, parse_request};
use crate::net::console::{Console, InputLine};
use crate::state::registry::Lookup;
use crate::state::session::{SessionId, StopSignal};
use std::io;
use std::sync::Arc;

pub const NO_SUCH_COMMAND: &str = "No such command.";
pub const INVALID_COMMAND: &str = "Invalid command supplied";
pub const REQUEST_COMPLETED: &str = "Request completed!";
pub const TERMINATING: &str = "Terminating...";
pub const SEPARATOR: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, banner not sent yet
    Connected,
    /// Prompt written, waiting for a line
    Prompting,
    /// Line received, being handled
    Dispatching(InputLine),
    Terminated,
}

/// One interactive dialog on one connection.
pub struct Session {
    id: SessionId,
    state: SessionState,
    console: Console,
    service: Arc<Service>,
    stop: StopSignal,
}

impl Session {
    pub fn new(id: SessionId, console: Console, service: Arc<Service>, stop: StopSignal) -> Self {
        Self {
            id,
            state: SessionState::Connected,
            console,
            service,
            stop,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Drive the session until it terminates. The session is removed from the
    /// service and its connection is closed on every way out.
    pub async fn run(mut self) -> io::Result<()> {
        let result = self.drive().await;
        self.state = SessionState::Terminated;

        self.service.remove_session(self.id);
        if let Err(e) = self.console.shutdown().await {
            tracing::debug!(error = %e, "error closing connection");
        }

        tracing::info!("Done");
        result
    }

    async fn drive(&mut self) -> io::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, SessionState::Terminated) {
                SessionState::Connected => self.greet().await?,
                SessionState::Prompting => self.prompt().await?,
                SessionState::Dispatching(input) => self.dispatch(input).await?,
                SessionState::Terminated => return Ok(()),
            };
        }
    }

    async fn greet(&mut self) -> io::Result<SessionState> {
        let banner = self.service.welcome_banner();
        self.console.line(banner).await?;
        Ok(SessionState::Prompting)
    }

    async fn prompt(&mut self) -> io::Result<SessionState> {
        if self.stop.is_stopped() {
            return self.terminate().await;
        }

        let prompt = format!("{} ", self.service.ready_message());
        self.console.write(prompt).await?;

        tokio::select! {
            input = self.console.read_input() => match input? {
                InputLine::Closed => {
                    tracing::info!("client closed the connection");
                    Ok(SessionState::Terminated)
                }
                input => Ok(SessionState::Dispatching(input)),
            },
            _ = self.stop.stopped() => {
                // Start the acknowledgement on its own line
                self.console.line("").await?;
                self.terminate().await
            }
        }
    }

    async fn dispatch(&mut self, input: InputLine) -> io::Result<SessionState> {
        let line = match input {
            InputLine::Line(line) => line,
            InputLine::TooLong => {
                tracing::debug!("received an over-long input line");
                self.console.line(INVALID_COMMAND).await?;
                return self.separator().await;
            }
            InputLine::Malformed => {
                tracing::debug!("received input that is not valid UTF-8");
                self.console.line(INVALID_COMMAND).await?;
                return self.separator().await;
            }
            InputLine::Closed => return Ok(SessionState::Terminated),
        };

        tracing::debug!(command = %line, "received command");

        let request = match parse_request(&line) {
            Ok(Some(request)) => request,
            Ok(None) => {
                // An empty command token names no command
                self.console.line(NO_SUCH_COMMAND).await?;
                return self.separator().await;
            }
            Err(e) => {
                // A user error, nothing to alarm anyone about
                tracing::debug!(error = %e, "unable to parse command");
                self.console.line(INVALID_COMMAND).await?;
                return self.separator().await;
            }
        };

        match request.reserved() {
            Some(Reserved::Exit) => return self.terminate().await,
            Some(Reserved::Help) => {
                let help = self.service.available_commands();
                self.console.line(help.trim_end()).await?;
            }
            None => self.execute(&request).await?,
        }

        self.separator().await
    }

    async fn execute(&mut self, request: &Request) -> io::Result<()> {
        let cmd = match self.service.get_request(&request.command) {
            Lookup::Found(cmd) => cmd,
            Lookup::NotFound => {
                tracing::debug!(command = %request.command, "no such command");
                return self.console.line(NO_SUCH_COMMAND).await;
            }
        };

        match cmd.execute(&mut self.console, &request.args).await {
            Ok(()) => self.console.line(REQUEST_COMPLETED).await,
            Err(CommandError::Io(e)) => Err(e),
            Err(e) => {
                tracing::debug!(command = %request.command, error = %e, "unable to complete request");
                self.console.line(e.to_string()).await
            }
        }
    }

    async fn separator(&mut self) -> io::Result<SessionState> {
        self.console.line(SEPARATOR).await?;
        Ok(SessionState::Prompting)
    }

    async fn terminate(&mut self) -> io::Result<SessionState> {
        self.console.line(TERMINATING).await?;
        Ok(SessionState::Terminated)
    }
}
