//! Console handlers
//!
//! Runs parsed commands against a [`CacheManager`] and renders JSON replies.

use serde_json::{json, Value};

use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::repl::Command;

/// Executes one command. `Quit` is handled by the caller and echoes back.
pub async fn execute(manager: &CacheManager, command: Command) -> Result<Value> {
    let reply = match command {
        Command::Set {
            key,
            value,
            options,
        } => {
            manager.set(&key, &value, options).await?;
            json!({ "ok": true, "key": key })
        }
        Command::Get { key } => match manager.get::<Value>(&key).await? {
            Some(value) => json!({ "key": key, "hit": true, "value": value }),
            None => json!({ "key": key, "hit": false }),
        },
        Command::Delete { key } => {
            let deleted = manager.delete(&key).await;
            json!({ "key": key, "deleted": deleted })
        }
        Command::Clear => {
            manager.clear().await;
            json!({ "cleared": true })
        }
        Command::Stats => serde_json::to_value(manager.stats().await)?,
        Command::Quit => json!({ "bye": true }),
    };
    Ok(reply)
}

/// Renders an error the way replies are rendered.
pub fn error_reply(err: &CacheError) -> Value {
    json!({ "error": err.to_string() })
}
