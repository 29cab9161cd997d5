//! The monitor service: owns the command registry, accepts connections and
//! keeps track of the sessions running on them.
//!
//! ```no_run
//! use std::sync::Arc;
//! use telmon::{Config, Service, commands::StatusCommand};
//!
//! # async fn run() -> telmon::error::AppResult<()> {
//! let service = Arc::new(Service::new(Config::from_env()));
//! service.register_command(StatusCommand);
//! service.clone().run().await
//! # }
//! ```

use crate::banner::{Banner, PlainBanner};
use crate::commands::Command;
use crate::config::Config;
use crate::error::{AppResult, ServiceError};
use crate::net::telnet;
use crate::state::registry::{CommandRegistry, Lookup};
use crate::state::session::{SessionHandle, SessionId, SessionInfo, StopSignal};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::net::TcpListener;

pub struct Service {
    config: Config,
    banner: Box<dyn Banner>,
    commands: RwLock<CommandRegistry>,
    sessions: DashMap<SessionId, SessionHandle>,
    running: AtomicBool,
    last_id: AtomicU64,
}

impl Service {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            banner: Box::new(PlainBanner),
            commands: RwLock::new(CommandRegistry::new()),
            sessions: DashMap::new(),
            running: AtomicBool::new(true),
            last_id: AtomicU64::new(0),
        }
    }

    pub fn with_banner(mut self, banner: impl Banner + 'static) -> Self {
        self.banner = Box::new(banner);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a command under its name, silently replacing any command
    /// registered under the same name before.
    pub fn register_command(&self, cmd: impl Command + 'static) {
        self.register_shared(Arc::new(cmd));
    }

    pub fn register_shared(&self, cmd: Arc<dyn Command>) {
        let name = cmd.name().to_string();
        if self.commands.write().register(cmd).is_some() {
            tracing::debug!(command = %name, "replaced previously registered command");
        }
    }

    /// Match a command token against the registry.
    pub fn get_request(&self, token: &str) -> Lookup {
        self.commands.read().get(token)
    }

    pub fn available_commands(&self) -> String {
        self.commands.read().render_help()
    }

    pub fn welcome_banner(&self) -> String {
        self.banner.render(&self.config.welcome_message)
    }

    pub fn ready_message(&self) -> &str {
        &self.config.ready_message
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every active session to stop and stop accepting connections.
    ///
    /// Returns immediately. Sessions remove themselves once they have
    /// actually finished; the accept loop notices within one accept timeout.
    pub fn terminate(&self) {
        tracing::info!(sessions = self.sessions.len(), "terminating monitor service");
        self.running.store(false, Ordering::SeqCst);
        for entry in self.sessions.iter() {
            entry.value().signal_stop();
        }
    }

    pub fn remove_session(&self, id: SessionId) {
        if self.sessions.remove(&id).is_some() {
            tracing::debug!(session_id = %id, "removed session");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Active sessions, ordered by id.
    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        let mut out: Vec<SessionInfo> = self.sessions.iter().map(|e| e.value().info().clone()).collect();
        out.sort_by_key(|s| s.id);
        out
    }

    /// Allocate an id for a new connection and record it as active. Returns
    /// `None` when the admission limit is reached.
    pub(crate) fn admit(&self, peer: SocketAddr) -> Option<(SessionId, StopSignal)> {
        if let Some(max) = self.config.max_sessions
            && self.sessions.len() >= max
        {
            return None;
        }

        let id = SessionId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (handle, stop) = SessionHandle::new(id, peer);

        self.sessions.insert(id, handle);

        // terminate() clears the flag before walking the sessions, so checking
        // after the insert means one of the two always signals this session
        if !self.is_running()
            && let Some(entry) = self.sessions.get(&id)
        {
            entry.signal_stop();
        }

        Some((id, stop))
    }

    pub(crate) fn stop_listening(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Bind the configured address and serve until terminated.
    pub async fn run(self: Arc<Self>) -> AppResult<()> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServiceError::Bind { addr: addr.clone(), source })?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> AppResult<()> {
        telnet::serve(listener, self).await
    }
}
