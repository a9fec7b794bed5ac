//! Echo Bot Example
//!
//! Reads Telegram-style updates, one JSON object per line, from stdin and
//! routes them through the standard extractors. Replies are written to the
//! log instead of being sent anywhere.
//!
//! # Usage
//!
//! ```bash
//! echo '{"update_id":1,"message":{"chat":{"id":7},"text":"helo"}}' \
//!     | cargo run --package echo-bot -- --threshold 0.75
//! ```
//!
//! Routes registered here:
//!
//! ```text
//! command     /ping, /echo, /help
//! similarity  "hello"            (fuzzy greeting)
//! all         /deploy in chat 42 (command + chat together)
//! any         #release or @ops   (hashtag or mention)
//! callback    vote[...]          (inline keyboard)
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use futures::{StreamExt, future};
use sift::prelude::*;
use sift::runtime::RuntimeBuilder;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Route JSON-lines chat updates from stdin")]
struct Args {
    /// Configuration file (defaults to ./sift.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `similarity.threshold`.
    #[arg(short, long)]
    threshold: Option<f64>,
}

// ============================================================================
// Handlers
// ============================================================================

fn ping(m: &Matched<'_>) {
    info!(chat = ?m.event.chat_id(), "Pong! 🏓");
}

fn echo(m: &Matched<'_>) {
    let text = m.event.text_or_caption().unwrap_or_default();
    let content = text.strip_prefix("/echo").unwrap_or(text).trim();
    info!(chat = ?m.event.chat_id(), reply = content, "echo");
}

fn help(m: &Matched<'_>) {
    let help_text = "/echo <text>, /ping, /help, say hello, tag #release or @ops";
    info!(chat = ?m.event.chat_id(), reply = help_text, "help");
}

fn greet(m: &Matched<'_>) {
    info!(
        text = m.text(0),
        score = m.score(),
        "Hello to you too! 👋"
    );
}

fn deploy(m: &Matched<'_>) {
    info!(kind = %m.kind, "Deploying to the ops chat");
}

fn tagged(m: &Matched<'_>) {
    info!(chat = ?m.event.chat_id(), "Someone pinged the release crew");
}

fn vote(m: &Matched<'_>) -> Result<()> {
    let choice = m
        .text(0)
        .ok_or_else(|| anyhow::anyhow!("vote without a choice: {:?}", m.values))?;
    info!(choice, "Vote recorded");
    Ok(())
}

fn register_routes(dispatcher: &Dispatcher) -> Result<(), RegistryError> {
    dispatcher
        .bind(names::COMMAND)?
        .add("/ping", ping)
        .add("/echo", echo)
        .add("/help", help)
        .bind(names::SIMILARITY)?
        .add("hello", greet)
        .bind(names::ALL)?
        .add(
            Pattern::items([
                (names::COMMAND, Pattern::from("/deploy")),
                (names::CHAT, Pattern::from(42_i64)),
            ]),
            deploy,
        )
        .bind(names::ANY)?
        .add(
            Pattern::items([
                (names::HASHTAG, Pattern::from("#release")),
                (names::MENTION, Pattern::from("@ops")),
            ]),
            tagged,
        )
        .bind(names::CALLBACK_QUERY)?
        .add("vote", vote);
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = RuntimeBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(threshold) = args.threshold {
        builder = builder.set("similarity.threshold", threshold);
    }
    let runtime = builder.build()?;

    register_routes(runtime.dispatcher())?;

    let updates = FramedRead::new(tokio::io::stdin(), LinesCodec::new()).filter_map(|line| {
        let update = match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Update::from_json(&line)
                .inspect_err(|e| warn!(error = %e, "Skipping malformed update"))
                .ok(),
            Err(e) => {
                warn!(error = %e, "Failed to read update line");
                None
            }
        };
        future::ready(update)
    });

    let stats = runtime.run_until_signal(updates).await?;
    info!(
        updates = stats.updates,
        fired = stats.handlers_fired,
        errors = stats.errors,
        "Done"
    );

    Ok(())
}
