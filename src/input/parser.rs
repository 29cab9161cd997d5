//! Request line parser.
//!
//! A request is a single line of text: the first whitespace separated token
//! names the command, every following token is an argument. There is no
//! quoting or escaping.
//!
//!   "status"              -> command="status", args=[]
//!   "echo  hello   world" -> command="echo", args=["hello", "world"]
//!   "?"                   -> Reserved::Help

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: String,
    pub args: Vec<String>,
}

/// Tokens handled by the session itself instead of the command registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reserved {
    Exit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid command token: {0:?}")]
    InvalidToken(String),
}

impl Request {
    pub fn reserved(&self) -> Option<Reserved> {
        match self.command.as_str() {
            "exit" => Some(Reserved::Exit),
            "help" | "?" => Some(Reserved::Help),
            _ => None,
        }
    }
}

/// Parse a raw input line. Blank lines yield `Ok(None)`.
pub fn parse_request(line: &str) -> Result<Option<Request>, ParseError> {
    let mut tokens = line.split_whitespace();

    let Some(command) = tokens.next() else {
        return Ok(None);
    };

    // Stray telnet negotiation or terminal escapes end up here
    if command.chars().any(char::is_control) {
        return Err(ParseError::InvalidToken(command.to_string()));
    }

    Ok(Some(Request {
        command: command.to_string(),
        args: tokens.map(str::to_string).collect(),
    }))
}
