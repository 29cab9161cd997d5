use crate::commands::Command;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Outcome of looking up a command token.
#[derive(Clone)]
pub enum Lookup {
    Found(Arc<dyn Command>),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Name to command mapping. Names match exactly: no prefixes, no case folding.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `cmd` under its name. A command already registered under the
    /// same name is replaced and handed back.
    pub fn register(&mut self, cmd: Arc<dyn Command>) -> Option<Arc<dyn Command>> {
        self.commands.insert(cmd.name().to_string(), cmd)
    }

    pub fn get(&self, name: &str) -> Lookup {
        match self.commands.get(name) {
            Some(cmd) => Lookup::Found(cmd.clone()),
            None => Lookup::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The `help` listing: every registered command followed by the
    /// commands the session handles itself.
    pub fn render_help(&self) -> String {
        let mut out = String::from("Available Commands : \n");
        for cmd in self.commands.values() {
            out.push_str(&format!("{} : {}\n", cmd.name(), cmd.description()));
        }
        out.push_str("help : Get available commands\n");
        out.push_str("exit : Exit the shell\n");
        out
    }
}
