//! Interactive chat against an AG-UI backend.
//!
//! Each line typed on stdin is sent as a user message and the agent's reply
//! is printed once the run ends. The `setTheme` capability changes the theme
//! shown in the prompt.
//!
//! Run with:
//! ```bash
//! BACKEND_URL=http://localhost:8000/api/v1 RUST_LOG=threadline_client=debug \
//!     cargo run --example chat
//! ```

use std::io::Write;
use std::sync::Arc;

use threadline::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = ClientConfig::from_env()?;
    println!("Connecting to {}", config.base_url);

    let theme = Arc::new(ThemeState::default());
    let thread = Thread::connect(config, default_registry(theme.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("[{}] > ", theme.current());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            break;
        }

        let handle = match thread.submit(line).await {
            Ok(handle) => handle,
            Err(e) => {
                eprintln!("Could not start run: {}", e);
                continue;
            }
        };

        let mut transcript = handle.transcript();
        let mut waiting = false;
        while transcript.changed().await.is_ok() {
            let busy = transcript.borrow_and_update().has_placeholder();
            if busy && !waiting {
                println!("...");
            }
            waiting = busy;
        }

        let outcome = handle.wait().await;
        // Skip the user message that started the run.
        for message in outcome.transcript.visible().skip(1) {
            print_message(message);
        }
        match outcome.error {
            Some(e) => eprintln!("Run {} {}: {}", outcome.run_id, outcome.phase, e),
            None => println!("Run {} {}", outcome.run_id, outcome.phase),
        }
    }

    Ok(())
}

fn print_message(message: &Message) {
    match message.role() {
        Role::Tool => println!(
            "  tool result [{}]: {}",
            message
                .tool_call_id()
                .map(ToolCallId::as_str)
                .unwrap_or_default(),
            message.content().unwrap_or_default()
        ),
        role => {
            if let Some(content) = message.content().filter(|c| !c.is_empty()) {
                println!("{}: {}", role, content);
            }
            for call in message.tool_calls() {
                println!("  calls {}({})", call.name, call.arguments);
            }
        }
    }
}
