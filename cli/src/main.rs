use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pixelbattle_core::{
    Backoff, CellCoord, ClientConfig, ClientEvent, ClientStore, Color, RasterSurface,
    RenderEngine, WriteIntent, WriteOutcome,
};
use tracing_subscriber::EnvFilter;
use url::Url;

mod bot;
mod file_store;
mod http_api;
mod session;
mod ws_host;

use file_store::FileStore;
use session::Session;

#[derive(Parser)]
#[command(name = "pixelbattle-cli", version, about = "Headless client for a pixel battle canvas")]
struct Cli {
    #[arg(long, global = true, env = "PIXELBATTLE_URL", default_value = "http://localhost:8000")]
    url: String,
    #[arg(long, global = true, env = "PIXELBATTLE_STATE", default_value = ".pixelbattle.json")]
    state: PathBuf,
    /// JSON file with client settings; missing fields use defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow live updates, optionally rendering the view to a PNG on exit.
    Watch {
        #[arg(long)]
        duration_secs: Option<u64>,
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
        /// Top-left cell of the view.
        #[arg(long, default_value_t = 0)]
        x: u32,
        #[arg(long, default_value_t = 0)]
        y: u32,
    },
    /// Place one pixel and wait for the authority's answer.
    Place {
        x: u32,
        y: u32,
        color: String,
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Paint an image onto the canvas.
    Bot(bot::BotArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let api_url = build_api_url(&cli.url)?;

    match cli.command {
        Commands::Watch {
            duration_secs,
            snapshot,
            width,
            height,
            x,
            y,
        } => {
            let store: Rc<dyn ClientStore> = Rc::new(FileStore::open(&cli.state));
            let session = Session::new(
                api_url,
                build_ws_url(&cli.url)?,
                store,
                Backoff::from_config(&config.backoff),
            );
            let view = ViewArgs {
                width,
                height,
                origin: CellCoord::new(x, y),
            };
            watch(session, &config, view, duration_secs.map(Duration::from_secs), snapshot)
                .await?;
        }
        Commands::Place {
            x,
            y,
            color,
            timeout_secs,
        } => {
            let color = Color::parse(&color)?;
            let store: Rc<dyn ClientStore> = Rc::new(FileStore::open(&cli.state));
            let session = Session::new(
                api_url,
                build_ws_url(&cli.url)?,
                store,
                Backoff::from_config(&config.backoff),
            );
            let intent = WriteIntent::new(CellCoord::new(x, y), color);
            place(session, intent, Duration::from_secs(timeout_secs)).await?;
        }
        Commands::Bot(args) => bot::run(args, api_url, config.grid).await?,
    }

    Ok(())
}

struct ViewArgs {
    width: u32,
    height: u32,
    origin: CellCoord,
}

async fn watch(
    mut session: Session,
    config: &ClientConfig,
    view: ViewArgs,
    duration: Option<Duration>,
    snapshot: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Rc::new(RefCell::new(RenderEngine::new(
        RasterSurface::new(view.width, view.height),
        config.grid,
        config.view.clone(),
        config.style.clone(),
    )));
    {
        let mut engine = engine.borrow_mut();
        let scaled = engine.viewport().scaled_cell();
        engine.pan_by(
            -(view.origin.x as f64) * scaled,
            -(view.origin.y as f64) * scaled,
        );
    }

    let client = session.client().clone();
    let cells = client.load_initial_grid().await;
    println!("loaded {} pixels", cells.len());
    engine.borrow_mut().set_grid(cells);

    let sink = engine.clone();
    let _subscription = client.subscribe(move |event| match event {
        ClientEvent::PixelChanged { update, origin } => {
            tracing::info!(x = update.x, y = update.y, color = %update.color, ?origin, "pixel changed");
            if let Err(err) = sink
                .borrow_mut()
                .set_pixel(update.coord(), update.color.clone())
            {
                tracing::warn!(%err, "ignoring pixel update");
            }
        }
        ClientEvent::Connection(state) => println!("connection: {state}"),
        ClientEvent::OnlineUsers(count) => println!("online users: {count}"),
        _ => {}
    });

    client.connect();
    session.run_until(wait_for_exit(duration)).await;
    client.shutdown();

    if let Some(path) = snapshot {
        let mut engine = engine.borrow_mut();
        engine.on_frame();
        engine.surface().frame().save(&path)?;
        println!("snapshot: {}", path.display());
    }
    Ok(())
}

async fn place(
    mut session: Session,
    intent: WriteIntent,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = session.client().clone();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let done_tx = RefCell::new(Some(done_tx));
    let _subscription = client.subscribe(move |event| {
        let outcome = match event {
            ClientEvent::WritePlaced { total_placed, .. } => (WriteOutcome::Placed, *total_placed),
            ClientEvent::WriteCooldown { seconds, .. } => (WriteOutcome::Cooldown(*seconds), 0),
            ClientEvent::WriteRejected { message, .. } => {
                (WriteOutcome::Rejected(message.clone()), 0)
            }
            _ => return,
        };
        if let Some(done) = done_tx.borrow_mut().take() {
            let _ = done.send(outcome);
        }
    });

    // Offline at this point, so the write goes through the queue and is
    // flushed once the channel opens.
    client.connect();
    client.submit_write(intent.clone()).await;
    let answer = session
        .run_until(tokio::time::timeout(timeout, done_rx))
        .await;
    client.shutdown();

    let Some(Ok(Ok((outcome, total_placed)))) = answer else {
        return Err("timed out waiting for the authority".into());
    };
    match outcome {
        WriteOutcome::Placed => {
            println!(
                "placed ({}, {}) {}; total placed {total_placed}",
                intent.x, intent.y, intent.color
            );
            Ok(())
        }
        WriteOutcome::Cooldown(seconds) => {
            println!("cooldown: wait {seconds:.1}s");
            Ok(())
        }
        WriteOutcome::Rejected(message) => Err(message.into()),
        WriteOutcome::Queued => Err("write is still queued".into()),
    }
}

async fn wait_for_exit(duration: Option<Duration>) {
    match duration {
        Some(duration) => {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(ClientConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn build_api_url(base_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    let base_path = url.path().trim_end_matches('/');
    let path = format!("{}/api/pixel", base_path);
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}

fn build_ws_url(base_url: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(format!("unsupported url scheme: {other}").into()),
    };
    url.set_scheme(scheme)
        .map_err(|()| format!("cannot use {scheme} with {base_url}"))?;
    let base_path = url.path().trim_end_matches('/');
    let path = format!("{}/ws", base_path);
    url.set_path(&path);
    url.set_query(None);
    Ok(url)
}
