use std::{process, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use log::{info, warn};
use podrace::{
    AppConfig, HttpRaceApi, RaceApi, RaceError, RaceSessionController, TerminalRenderer,
    render::{Mount, Renderer, View},
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Race service base URL, overrides the config file
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Write the effective settings to the config file
    #[arg(long, global = true)]
    save_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the available tracks and racers
    List,
    /// Run a race. Press Enter during the race to accelerate.
    Race {
        #[arg(short, long)]
        track: u32,

        #[arg(short, long)]
        racer: u32,
    },
}

fn load_config(args: &Args) -> Result<AppConfig, RaceError> {
    let mut config = match AppConfig::from_local_file() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring unreadable config file: {e}");
            AppConfig::default()
        }
    };
    if let Some(server) = &args.server {
        config.server_url = server.clone();
    }
    if args.save_config {
        config.save()?;
        info!("Saved config to {:?}", AppConfig::default_path()?);
    }
    Ok(config)
}

async fn list(api: Arc<HttpRaceApi>) -> Result<(), RaceError> {
    let renderer = TerminalRenderer::stdout();
    let tracks = api.list_tracks().await?;
    renderer.render_at(
        Mount::Tracks,
        &View::TrackCards {
            tracks,
            selected: None,
        },
    );
    let racers = api.list_racers().await?;
    renderer.render_at(
        Mount::Racers,
        &View::RacerCards {
            racers,
            selected: None,
        },
    );
    Ok(())
}

async fn race(
    api: Arc<HttpRaceApi>,
    config: AppConfig,
    track: u32,
    racer: u32,
) -> Result<(), RaceError> {
    let mut controller =
        RaceSessionController::load(api, TerminalRenderer::stdout(), config).await?;
    controller.select_track(track)?;
    controller.select_racer(racer)?;

    let token = controller.cancel_token();
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            println!("Exiting...");
            process::exit(0);
        }
        token.cancel();
    })
    .expect("Could not set Ctrl-C handler");

    let input = controller.input_sender();
    let presses = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if !input.accelerate() {
                break;
            }
        }
    });

    let result = controller.create_and_run_race().await;
    presses.abort();

    let finished = result?;
    info!(
        "Race over after {} racers crossed the line",
        finished.positions.len()
    );
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Could not start async runtime");

    let result = runtime.block_on(async {
        let api = Arc::new(HttpRaceApi::new(&config.server_url)?);
        match &cli.command {
            Commands::List => list(api).await,
            Commands::Race { track, racer } => race(api, config.clone(), *track, *racer).await,
        }
    });
    // stdin reads block a runtime thread that would otherwise hold up shutdown
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
