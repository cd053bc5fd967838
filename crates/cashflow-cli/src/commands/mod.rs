//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `aggregate` - Run aggregate rules over an observations file
//! - `config` - Show effective aggregation defaults
//! - `functions` - List the selector's supported combinations

pub mod aggregate;
pub mod config;
pub mod functions;

// Re-export command functions for main.rs
pub use aggregate::*;
pub use config::*;
pub use functions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
