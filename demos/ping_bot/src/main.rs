//! Ping Bot Example
//!
//! Every line typed on stdin is posted to `#general` in a pretend guild.
//! Prefix a line with `@name ` to speak as someone else, or with `dm ` to send
//! a direct message instead.
//!
//! ```text
//! !ping
//! !role add helper            -> denied, only `owner` may manage roles
//! @owner !role add helper
//! !r list
//! dm !role remove helper      -> allowed, direct messages skip the gate
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-bot
//! ```

use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use herald::prelude::*;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

const GUILD_ID: u64 = 1;
const GENERAL_ID: u64 = 10;
const DM_ID: u64 = 20;

// ============================================================================
// Console Gateway
// ============================================================================

/// A gateway backed by the terminal.
#[derive(Default)]
struct ConsoleGateway {
    reader: Mutex<Option<JoinHandle<()>>>,
}

/// Turns one typed line into the message it stands for.
fn parse_line(line: &str) -> MessageReceived {
    let (speaker, rest) = match line.strip_prefix('@').and_then(|l| l.split_once(' ')) {
        Some((name, rest)) => (name, rest),
        None => ("guest", line),
    };

    let author = User::new(speaker.bytes().map(u64::from).sum(), speaker);
    match rest.strip_prefix("dm ") {
        Some(content) => MessageReceived::direct(content, author, Channel::private(DM_ID)),
        None => MessageReceived::in_guild(
            rest,
            author,
            Channel::text(GENERAL_ID, "general"),
            Guild::new(GUILD_ID, "console"),
        ),
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn name(&self) -> &str {
        "console"
    }

    async fn start(&self, sink: EventSink) -> GatewayResult<()> {
        let task = tokio::spawn(async move {
            if sink.send(Ready::default()).await.is_err() {
                return;
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        if sink.send(parse_line(&line)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("stdin closed, press Ctrl+C to exit");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        });

        *self.reader.lock() = Some(task);
        Ok(())
    }

    async fn stop(&self) -> GatewayResult<()> {
        if let Some(task) = self.reader.lock().take() {
            task.abort();
        }
        Ok(())
    }

    async fn send_message(&self, channel: &Channel, content: &str) -> GatewayResult<()> {
        match &channel.name {
            Some(name) => println!("[#{name}] ping-bot: {content}"),
            None => println!("[dm] ping-bot: {content}"),
        }
        Ok(())
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn reply(gateway: &ConsoleGateway, ctx: &CommandContext, text: &str) -> HandlerResult {
    gateway.send_message(ctx.channel(), text).await?;
    Ok(())
}

fn ping_command(gateway: Arc<ConsoleGateway>) -> Arc<Command> {
    Command::builder("ping")
        .alias("p")
        .description("Checks that the bot is alive")
        .on_command(move |ctx: CommandContext| {
            let gateway = Arc::clone(&gateway);
            async move { reply(&gateway, &ctx, "Pong!").await }
        })
        .build()
}

/// `role`, with `add`, `remove` and `list` below it.
fn role_command(gateway: Arc<ConsoleGateway>) -> Arc<Command> {
    let roles = Arc::new(Mutex::new(BTreeSet::<String>::new()));

    let denied = {
        let gateway = Arc::clone(&gateway);
        move |ctx: CommandContext| {
            let gateway = Arc::clone(&gateway);
            async move {
                let text = format!(
                    "{} needs `{}` for that",
                    ctx.actor().name,
                    ctx.command().permission()
                );
                reply(&gateway, &ctx, &text).await
            }
        }
    };

    let add = {
        let gateway = Arc::clone(&gateway);
        let roles = Arc::clone(&roles);
        Command::builder("add")
            .permission(Permission::ManageRoles)
            .on_command(move |ctx: CommandContext| {
                let gateway = Arc::clone(&gateway);
                let roles = Arc::clone(&roles);
                async move {
                    let Some(name) = ctx.arg(0) else {
                        return reply(&gateway, &ctx, "usage: role add <name>").await;
                    };
                    let text = if roles.lock().insert(name.to_lowercase()) {
                        format!("created role {name}")
                    } else {
                        format!("role {name} already exists")
                    };
                    reply(&gateway, &ctx, &text).await
                }
            })
            .on_permission_denied(denied.clone())
            .build()
    };

    let remove = {
        let gateway = Arc::clone(&gateway);
        let roles = Arc::clone(&roles);
        Command::builder("remove")
            .alias("rm")
            .permission(Permission::ManageRoles)
            .on_command(move |ctx: CommandContext| {
                let gateway = Arc::clone(&gateway);
                let roles = Arc::clone(&roles);
                async move {
                    let Some(name) = ctx.arg(0) else {
                        return reply(&gateway, &ctx, "usage: role remove <name>").await;
                    };
                    let text = if roles.lock().remove(&name.to_lowercase()) {
                        format!("removed role {name}")
                    } else {
                        format!("no role named {name}")
                    };
                    reply(&gateway, &ctx, &text).await
                }
            })
            .on_permission_denied(denied)
            .build()
    };

    let list = {
        let gateway = Arc::clone(&gateway);
        let roles = Arc::clone(&roles);
        Command::builder("list")
            .alias("ls")
            .on_command(move |ctx: CommandContext| {
                let gateway = Arc::clone(&gateway);
                let roles = Arc::clone(&roles);
                async move {
                    let names: Vec<String> = roles.lock().iter().cloned().collect();
                    let text = if names.is_empty() {
                        "no roles yet".to_string()
                    } else {
                        names.join(", ")
                    };
                    reply(&gateway, &ctx, &text).await
                }
            })
            .build()
    };

    Command::builder("role")
        .alias("r")
        .description("Manages roles")
        .child(add)
        .child(remove)
        .child(list)
        .on_command(move |ctx: CommandContext| {
            let gateway = Arc::clone(&gateway);
            async move { reply(&gateway, &ctx, "usage: role <add|remove|list>").await }
        })
        .build()
}

/// Only `owner` holds anything beyond the default permission.
fn owner_only(_: &Guild, user: &User, permission: &Permission) -> bool {
    *permission == Permission::SendMessages || user.name == "owner"
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let gateway = Arc::new(ConsoleGateway::default());

    let bot = Bot::builder(gateway.clone())
        .gate(PermissionGate::new(owner_only))
        .build()?;

    bot.register_command(ping_command(Arc::clone(&gateway)));
    bot.register_command(role_command(Arc::clone(&gateway)));

    bot.listen(
        Listener::builder("console")
            .on(|_: EventContext<Ready>| async {
                info!("Connected. Type a message, or !ping");
                Ok(())
            })
            .on_with_priority(Priority::Low, |ev: EventContext<MessageReceived>| async move {
                let msg = ev.data();
                debug!(author = %msg.author.name, guild = msg.is_from_guild(), "{}", msg.content);
                Ok(())
            }),
    )?;

    bot.run().await?;
    Ok(())
}
