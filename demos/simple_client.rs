//! Simple IRC client example
//!
//! Connects using a TOML configuration, joins a channel once registered,
//! answers greetings, and prints what happens in the channel.
//!
//! ```text
//! cargo run --example simple_client --features serde -- bot.toml '#example'
//! ```
//!
//! `bot.toml` holds any [`SessionConfig`] fields, for example:
//!
//! ```toml
//! host = "irc.libera.chat"
//! nickname = "example_bot"
//! username = "example"
//! realname = "Example Bot"
//! alt_nicknames = ["example_bot2"]
//! ```

use anyhow::Context;
use slirc_session::state::SessionConfig;
use slirc_session::{Client, Event};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = r#"
host = "irc.libera.chat"
nickname = "slirc_example"
username = "slirc"
realname = "slirc-session example"
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config_text = match args.next() {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path))?,
        None => DEFAULT_CONFIG.to_owned(),
    };
    let channel = args.next().unwrap_or_else(|| "#slirc-example".to_owned());
    let config: SessionConfig = toml::from_str(&config_text).context("parsing config")?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let client = Client::connect(config, tx)
        .await
        .context("connecting")?;
    let handle = client.handle();
    let encoding = handle.with_session(|s| s.text_encoding());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, quitting");
                handle.disconnect(Some(b"Goodbye!"));
                ctrl_c.set(tokio::signal::ctrl_c());
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    Event::ConnectionSucceeded { nickname } => {
                        info!(nick = %encoding.decode(&nickname), "registered");
                        handle.join(channel.as_bytes(), None)?;
                    }
                    Event::JoinedChannel { channel } => {
                        if let Some(chan) = handle.channel(&channel) {
                            chan.message(b"Hello from slirc-session!")?;
                        }
                    }
                    Event::ChannelMessage { channel, origin, text } => {
                        println!(
                            "[{}] <{}> {}",
                            encoding.decode(&channel),
                            encoding.decode(slirc_session::prefix::nick_from(&origin)),
                            encoding.decode(&text),
                        );
                        if text.windows(5).any(|w| w.eq_ignore_ascii_case(b"hello")) {
                            handle.message(&channel, b"Hello there!")?;
                        }
                    }
                    Event::TopicChanged { channel, topic: Some(topic), .. } => {
                        println!("[{}] topic: {}", encoding.decode(&channel), encoding.decode(&topic));
                    }
                    Event::ConnectionFailed { error } => warn!(%error, "connection failed"),
                    Event::Disconnected { reason } => {
                        info!(%reason, "disconnected");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    client.wait().await?;
    Ok(())
}
