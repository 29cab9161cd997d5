use crate::commands::{Command, CommandError, CommandResult};
use crate::net::console::Console;
use crate::service::Service;
use async_trait::async_trait;
use std::sync::{Arc, Weak};

/// Lists the sessions currently connected to the service.
pub struct SessionsCommand {
    // Weak: the service owns this command through its registry
    service: Weak<Service>,
}

impl SessionsCommand {
    pub fn new(service: &Arc<Service>) -> Self {
        Self {
            service: Arc::downgrade(service),
        }
    }
}

#[async_trait]
impl Command for SessionsCommand {
    fn name(&self) -> &str {
        "sessions"
    }

    fn description(&self) -> &str {
        "list connected sessions"
    }

    async fn execute(&self, console: &mut Console, _args: &[String]) -> CommandResult {
        let Some(service) = self.service.upgrade() else {
            return Err(CommandError::Custom("Service is shutting down.".to_string()));
        };

        let sessions = service.active_sessions();
        console.line(format!("{} active session(s)", sessions.len())).await?;
        for s in sessions {
            console
                .line(format!(
                    "{:<12} {:<22} since {}",
                    s.id.to_string(),
                    s.peer,
                    s.connected_at.format("%Y-%m-%d %H:%M:%S")
                ))
                .await?;
        }
        Ok(())
    }
}
