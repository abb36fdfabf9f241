//! Console commands
//!
//! Parses one line of input into a [`Command`].
//!
//! ```text
//! set <key> <json-value> [ttl_ms] [nocompress]
//! get <key>
//! del <key>
//! clear
//! stats
//! quit
//! ```

use std::time::Duration;

use serde_json::Value;

use crate::cache::SetOptions;
use crate::error::{CacheError, Result};

/// A parsed console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set {
        key: String,
        value: Value,
        options: SetOptions,
    },
    Get {
        key: String,
    },
    Delete {
        key: String,
    },
    Clear,
    Stats,
    Quit,
}

impl Command {
    /// Parses a command line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = split_token(line);
        let command = match verb.to_ascii_lowercase().as_str() {
            "set" => {
                let (key, rest) = split_token(rest);
                let key = require_key(key)?;
                let (value, options) = parse_set_args(rest)?;
                Command::Set {
                    key,
                    value,
                    options,
                }
            }
            "get" => Command::Get {
                key: require_single_key(rest)?,
            },
            "del" | "delete" => Command::Delete {
                key: require_single_key(rest)?,
            },
            "clear" => no_args(rest, Command::Clear)?,
            "stats" => no_args(rest, Command::Stats)?,
            "quit" | "exit" => no_args(rest, Command::Quit)?,
            other => {
                return Err(CacheError::InvalidCommand(format!(
                    "Unknown command '{}'",
                    other
                )))
            }
        };

        Ok(Some(command))
    }
}

fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

fn require_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(CacheError::InvalidCommand("Missing key".to_string()));
    }
    Ok(key.to_string())
}

fn require_single_key(rest: &str) -> Result<String> {
    let (key, extra) = split_token(rest);
    if !extra.is_empty() {
        return Err(CacheError::InvalidCommand(format!(
            "Unexpected argument '{}'",
            extra
        )));
    }
    require_key(key)
}

fn no_args(rest: &str, command: Command) -> Result<Command> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(CacheError::InvalidCommand(format!(
            "Unexpected argument '{}'",
            rest
        )))
    }
}

/// Reads the JSON value, then any trailing `ttl_ms` / `nocompress` flags.
fn parse_set_args(rest: &str) -> Result<(Value, SetOptions)> {
    if rest.is_empty() {
        return Err(CacheError::InvalidCommand("Missing value".to_string()));
    }

    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    let value = match stream.next() {
        Some(value) => value?,
        None => return Err(CacheError::InvalidCommand("Missing value".to_string())),
    };
    let trailing = &rest[stream.byte_offset()..];

    let mut options = SetOptions::new();
    for flag in trailing.split_whitespace() {
        if flag.eq_ignore_ascii_case("nocompress") {
            options = options.compress(false);
        } else if let Ok(ms) = flag.parse::<u64>() {
            options = options.ttl(Duration::from_millis(ms));
        } else {
            return Err(CacheError::InvalidCommand(format!(
                "Unknown option '{}'",
                flag
            )));
        }
    }

    Ok((value, options))
}
