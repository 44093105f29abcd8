use airplay_player::config::{Config, app_name, version};
use airplay_player::engine::MemoryEngine;
use airplay_player::{AirPlayConsumer, MediaEngine, MediaKind, MediaRuntime, Player};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "gstreamer")]
fn default_engine() -> Result<Arc<dyn MediaEngine>> {
    Ok(Arc::new(airplay_player::engine::gst::GstEngine::new()))
}

#[cfg(not(feature = "gstreamer"))]
fn default_engine() -> Result<Arc<dyn MediaEngine>> {
    anyhow::bail!("built without the `gstreamer` feature, run with --dry-run")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new(app_name())
        .version(version())
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("playlist")
                .short('p')
                .long("playlist")
                .value_name("URI")
                .help("Media playlist to play.")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file."),
        )
        .arg(
            Arg::new("seek")
                .short('s')
                .long("seek")
                .value_name("SECONDS")
                .help("Seek to this position once playback started.")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECONDS")
                .help("How often to report the playback position.")
                .value_parser(value_parser!(u64).range(1..))
                .default_value("5"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Record pipeline operations instead of rendering.")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path))?,
        None => Config::new(),
    };

    let engine: Arc<dyn MediaEngine> = if matches.get_flag("dry-run") {
        Arc::new(MemoryEngine::new())
    } else {
        default_engine()?
    };

    let runtime = MediaRuntime::init(engine, &config.engine).context("initializing media engine")?;
    let player = Player::new(runtime.engine(), &config).context("building pipelines")?;

    let uri = matches
        .get_one::<String>("playlist")
        .context("missing playlist URI")?;
    player.on_media_playlist(uri)?;

    if let Some(position) = matches.get_one::<f64>("seek")
        && let Err(e) = player.on_media_scrub(*position)
    {
        warn!("Seek to {}s failed: {}", position, e);
    }

    let interval = matches.get_one::<u64>("interval").copied().unwrap_or(5);
    let stall_threshold = Duration::from_secs(interval);
    let mut ticker = tokio::time::interval(stall_threshold);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("{}: {}", uri, player.playback_info());
                debug!(
                    "video: {}, audio: {}",
                    player.health(MediaKind::Video).summary(),
                    player.health(MediaKind::Audio).summary()
                );
                for kind in [MediaKind::Video, MediaKind::Audio] {
                    if player.is_stalled(kind, stall_threshold) {
                        warn!("{} stream: no buffer for over {:?}", kind, stall_threshold);
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                break;
            }
        }
    }

    println!("{}", serde_json::to_string(&player.playback_info())?);
    player.on_media_playlist_remove()?;

    // pipelines must be released before the engine goes away
    drop(player);
    runtime.shutdown();
    Ok(())
}
