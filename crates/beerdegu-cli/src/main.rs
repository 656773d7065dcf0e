//! Beerdegu terminal shell.
//!
//! # Usage
//!
//! ```bash
//! export BEERDEGU_TOKEN=...
//!
//! # Lobby
//! beerdegu rooms
//! beerdegu join ABCD --password secret
//! beerdegu search porter
//!
//! # Taste
//! beerdegu enter ABCD
//! ```

use std::{error::Error, io::Write, path::PathBuf};

use beerdegu_app::RoomHandle;
use beerdegu_cli::{HELP, ParseError, ShellCommand, render};
use beerdegu_client::{ClientConfig, NewRoom, RoomsApi, open_room};
use beerdegu_core::AuthSession;
use beerdegu_proto::BeerId;
use clap::{Parser, Subcommand};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Beerdegu tasting room shell
#[derive(Parser, Debug)]
#[command(name = "beerdegu")]
#[command(about = "Join Beerdegu tasting rooms from the terminal")]
#[command(version)]
struct Args {
    /// REST backend base URL
    #[arg(long, env = "BEERDEGU_BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    backend_url: String,

    /// WebSocket gateway base URL
    #[arg(long, env = "BEERDEGU_WEBSOCKET_URL", default_value = "ws://127.0.0.1:8000")]
    websocket_url: String,

    /// Login token
    #[arg(long, env = "BEERDEGU_TOKEN", hide_env_values = true)]
    token: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List open rooms
    Rooms,
    /// Create a room you host
    Create {
        /// Room code
        name: String,
        /// Join password
        #[arg(long, default_value = "")]
        password: String,
        /// Participant limit
        #[arg(long)]
        slots: Option<u32>,
    },
    /// Join a room
    Join {
        /// Room code
        room: String,
        /// Join password
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Leave a room
    Leave {
        /// Room code
        room: String,
    },
    /// Search the beer database
    Search {
        /// Name fragment
        query: String,
    },
    /// Add a beer to a room you host
    AddBeer {
        /// Room code
        room: String,
        /// Beer ID
        beer_id: BeerId,
    },
    /// Remove a beer from a room you host
    RemoveBeer {
        /// Room code
        room: String,
        /// Beer ID
        beer_id: BeerId,
    },
    /// Download a finished room's report
    Report {
        /// Room code
        room: String,
        /// Where to write the report
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Enter a room and start the session shell
    Enter {
        /// Room code
        room: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout belongs to the shell.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = ClientConfig::new(&args.backend_url, &args.websocket_url)?;
    let auth = AuthSession::new(args.token);
    let api = RoomsApi::new(&config.backend_url, auth.clone())?;

    match args.command {
        Command::Rooms => say(&render::rooms(&api.list_rooms().await?))?,
        Command::Create { name, password, slots } => {
            api.create_room(&NewRoom { name: name.clone(), password, slots }).await?;
            say(&format!("created {name}"))?;
        },
        Command::Join { room, password } => {
            api.join_room(&room, &password).await?;
            say(&format!("joined {room}"))?;
        },
        Command::Leave { room } => {
            api.leave_room(&room).await?;
            say(&format!("left {room}"))?;
        },
        Command::Search { query } => say(&render::beers(&api.search_beers(&query).await?))?,
        Command::AddBeer { room, beer_id } => {
            api.add_beer(&room, beer_id).await?;
            say(&format!("added beer {beer_id} to {room}"))?;
        },
        Command::RemoveBeer { room, beer_id } => {
            api.remove_beer(&room, beer_id).await?;
            say(&format!("removed beer {beer_id} from {room}"))?;
        },
        Command::Report { room, output } => {
            let bytes = api.download_report(&room).await?;
            tokio::fs::write(&output, &bytes).await?;
            say(&format!("wrote {} bytes to {}", bytes.len(), output.display()))?;
        },
        Command::Enter { room } => enter(&config, &auth, &room).await?,
    }

    Ok(())
}

async fn enter(config: &ClientConfig, auth: &AuthSession, room: &str) -> Result<(), Box<dyn Error>> {
    let (runtime, handle) = open_room(config, auth, room).await?;
    let session = tokio::spawn(runtime.run());
    let printer = tokio::spawn(print_events(handle.clone()));

    say(HELP)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            () = handle.closed() => break,
            line = lines.next_line() => {
                let command = match line? {
                    Some(line) => ShellCommand::parse(&line),
                    None => Ok(ShellCommand::Quit),
                };
                match command {
                    Ok(ShellCommand::Quit) => {
                        if let Err(error) = handle.leave().await {
                            tracing::debug!(%error, "session already over");
                        }
                        break;
                    },
                    Ok(command) => {
                        if let Err(error) = apply(&handle, command).await {
                            say(&format!("! {error}"))?;
                        }
                    },
                    Err(ParseError::Empty) => {},
                    Err(error) => say(&format!("! {error}"))?,
                }
            },
        }
    }

    let outcome = session.await?;
    printer.abort();
    outcome?;

    say(&render::snapshot(&handle.snapshot()))?;
    Ok(())
}

async fn apply(handle: &RoomHandle, command: ShellCommand) -> Result<(), Box<dyn Error>> {
    match command {
        ShellCommand::Say(text) => handle.send_chat(text).await?,
        ShellCommand::Stage(target) => handle.change_stage(target).await?,
        ShellCommand::Refresh => handle.refresh_catalog().await?,
        ShellCommand::Rate(beer_id) => handle.activate_beer(beer_id).await?,
        ShellCommand::Edit(field) => handle.edit_draft(field).await?,
        ShellCommand::Show => say(&render::snapshot(&handle.snapshot()))?,
        ShellCommand::Help => say(HELP)?,
        ShellCommand::Quit => handle.leave().await?,
    }
    Ok(())
}

/// Echo inbound events and socket status changes until the session ends.
async fn print_events(handle: RoomHandle) {
    let mut events = handle.events();
    let mut snapshots = handle.subscribe();
    let mut status = snapshots.borrow().connection_status;

    loop {
        let line = tokio::select! {
            event = events.recv() => match event {
                Ok(event) => render::event(&event),
                Err(RecvError::Lagged(missed)) => Some(format!("* missed {missed} events")),
                Err(RecvError::Closed) => break,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = snapshots.borrow_and_update().connection_status;
                if current == status {
                    None
                } else {
                    status = current;
                    Some(format!("* socket {current:?}"))
                }
            },
        };

        if let Some(line) = line
            && say(&line).is_err()
        {
            break;
        }
    }
}

fn say(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")
}
