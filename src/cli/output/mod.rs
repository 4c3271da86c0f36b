//! Output formatting utilities for the CLI.

pub mod progress;
pub mod table;

pub use table::TableFormatter;

use serde::Serialize;

/// Anything a command can print, in either human or JSON form.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}
