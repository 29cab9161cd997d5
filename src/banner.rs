//! Welcome banner rendering.
//!
//! The service only knows how to hand the configured welcome text to a
//! [`Banner`]; anything fancier (figlet fonts, ANSI art) is plugged in by the
//! host through [`crate::Service::with_banner`].

pub trait Banner: Send + Sync {
    /// Turn the configured welcome message into the text sent on connect.
    fn render(&self, welcome: &str) -> String;
}

/// Frames the welcome text between two dashed rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainBanner;

impl Banner for PlainBanner {
    fn render(&self, welcome: &str) -> String {
        let width = welcome.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let rule = "-".repeat(width.max(8));

        let mut out = String::with_capacity(welcome.len() + rule.len() * 2 + 4);
        out.push_str(&rule);
        out.push('\n');
        for line in welcome.lines() {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&rule);
        out
    }
}
