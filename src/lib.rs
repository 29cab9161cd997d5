pub mod banner;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod net;
pub mod service;
pub mod state;

// Convenient re-exports (so call sites can do `telmon::Service`, etc.)
pub use commands::{Command, CommandError, CommandResult};
pub use config::Config;
pub use net::console::Console;
pub use service::Service;
pub use state::{
    registry::{CommandRegistry, Lookup},
    session::{SessionId, SessionInfo},
};
