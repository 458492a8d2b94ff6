use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tether_core::{IceServerConfig, ParticipantId};
use tether_session::{
    ConnectionState, SessionConfig, SessionHandle, SessionNotification, WebrtcEngineFactory,
    WsRelayConnector,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "WebRTC session client for a relay signaling server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room and negotiate a call with a remote peer.
    Join {
        /// JSON session config; flags below override it.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        room: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// Local participant id (random if unset).
        #[arg(long)]
        id: Option<String>,

        /// Peer that outgoing offers and candidates are addressed to.
        #[arg(long)]
        remote: Option<String>,

        /// STUN server URL, repeatable.
        #[arg(long)]
        stun: Vec<String>,

        #[arg(long)]
        heartbeat_ms: Option<u64>,

        /// Send an offer as soon as the room is joined.
        #[arg(long)]
        call: bool,

        /// Offer local audio and video tracks.
        #[arg(long)]
        local_media: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Join {
            config,
            url,
            room,
            name,
            id,
            remote,
            stun,
            heartbeat_ms,
            call,
            local_media,
        } => {
            let mut config = match config {
                Some(path) => SessionConfig::from_json_file(&path)?,
                None => SessionConfig::default(),
            };
            if let Some(url) = url {
                config.signaling_url = url;
            }
            if let Some(room) = room {
                config.room = room;
            }
            if name.is_some() {
                config.display_name = name;
            }
            if let Some(id) = id {
                config.local_id = ParticipantId::new(id);
            }
            if let Some(remote) = remote {
                config.remote_id = Some(ParticipantId::new(remote));
            }
            if !stun.is_empty() {
                config.ice_servers = stun.into_iter().map(IceServerConfig::stun).collect();
            }
            if let Some(ms) = heartbeat_ms {
                config.heartbeat_interval_ms = ms;
            }
            config.attach_local_media |= local_media;
            config.validate().context("Invalid session options")?;

            run_join(config, call).await
        }
    }
}

async fn run_join(config: SessionConfig, call: bool) -> Result<()> {
    println!(
        "{} {} as {}",
        "📡 Joining".green().bold(),
        config.room.cyan(),
        config.local_id.to_string().yellow()
    );

    let (tx, mut notifications) = mpsc::unbounded_channel();
    let handle = SessionHandle::spawn(
        config,
        Arc::new(WsRelayConnector),
        Arc::new(WebrtcEngineFactory),
        Arc::new(tx),
    );
    handle.start().context("Failed to start session")?;

    let mut call_pending = call;
    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    break;
                };
                if matches!(notification, SessionNotification::Closed) {
                    print_notification(&notification);
                    break;
                }
                if call_pending
                    && matches!(
                        notification,
                        SessionNotification::StateChanged(ConnectionState::SignalingConnected)
                    )
                {
                    call_pending = false;
                    handle.call().context("Failed to place call")?;
                }
                print_notification(&notification);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing session");
                handle.stop();
            }
        }
    }

    Ok(())
}

fn print_notification(notification: &SessionNotification) {
    match notification {
        SessionNotification::Status(status) => println!("   {}", status.dimmed()),
        SessionNotification::StateChanged(state) => {
            let label = state.to_string();
            let label = match state {
                ConnectionState::Connected => label.green().bold(),
                ConnectionState::Failed => label.red().bold(),
                ConnectionState::Disconnected | ConnectionState::Closed => label.yellow(),
                _ => label.cyan(),
            };
            println!("🔄 {label}");
        }
        SessionNotification::ParticipantsChanged(participants) => {
            let names: Vec<&str> = participants.iter().map(|p| p.label()).collect();
            println!("👥 {}", names.join(", "));
        }
        SessionNotification::Track(track) => {
            println!("🎬 Remote {} track {}", track.kind, track.id.cyan());
        }
        SessionNotification::MediaVisibility(visible) => {
            println!("🖥  Media {}", if *visible { "visible" } else { "hidden" });
        }
        SessionNotification::Failed(reason) => println!("❌ {}", reason.red()),
        SessionNotification::Closed => println!("{}", "👋 Session closed".green()),
    }
}
