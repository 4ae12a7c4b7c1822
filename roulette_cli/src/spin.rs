use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use roulette_core::{
    AssetSource, CarouselBuilder, Effect, EffectSchedule, EngineParams, ImageCatalog, Presenter,
    Resolution, Roulette, SeededRng, SourceId, SpinState,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One animation frame at 60 Hz.
const FRAME: Duration = Duration::from_micros(16_667);

#[derive(Args, Debug, Clone)]
pub struct SpinArgs {
    /// Folder to spin over; omitted means the demo faces
    #[arg(long)]
    pub folder: Option<String>,
    /// Number of spins to run
    #[arg(long, default_value_t = 1)]
    pub rounds: u32,
    /// Remove each winner before the next round
    #[arg(long)]
    pub eliminate: bool,
    /// Pace ticks and effects at 60 fps instead of running instantly
    #[arg(long)]
    pub realtime: bool,
    /// Secret seed; defaults to the current time
    #[arg(long, env = "ROULETTE_SERVER_SEED")]
    pub server_seed: Option<String>,
    #[arg(long, default_value = "roulette")]
    pub client_seed: String,
    /// Nonce of the first round, incremented per round
    #[arg(long, default_value_t = 0)]
    pub nonce: u64,
    /// Ticks at full speed before the stop, lower bound
    #[arg(long, default_value_t = 60)]
    pub min_spin_ticks: u64,
    #[arg(long, default_value_t = 240)]
    pub max_spin_ticks: u64,
    /// Append one row per round to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
    /// JSON file overriding engine params
    #[arg(long)]
    pub params: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SpinRecord {
    pub round: u32,
    pub source: String,
    pub server_seed_hash: String,
    pub nonce: u64,
    pub ticks: u64,
    pub scroll: f64,
    pub frame_index: usize,
    pub item_index: usize,
    pub item_key: String,
}

/// Logs effects as they come due and keeps the pending schedule.
#[derive(Default)]
pub struct LogPresenter {
    pending: Option<EffectSchedule>,
}

impl LogPresenter {
    /// Plays the pending schedule, sleeping between steps when `realtime`.
    pub async fn play(&mut self, realtime: bool) {
        let Some(mut schedule) = self.pending.take() else {
            return;
        };
        if !realtime {
            for effect in schedule.due(u64::MAX) {
                log_effect(&effect);
            }
            return;
        }
        let started = tokio::time::Instant::now();
        while !schedule.is_finished() {
            let elapsed = started.elapsed().as_millis() as u64;
            for effect in schedule.due(elapsed) {
                log_effect(&effect);
            }
            tokio::time::sleep(FRAME).await;
        }
    }
}

fn log_effect(effect: &Effect) {
    match effect {
        Effect::SnapTo { offset, duration_ms } => debug!(offset, duration_ms, "snap"),
        Effect::Firework { x_fraction, hue } => debug!(x_fraction, hue, "firework"),
        other => debug!(effect = ?other, "effect"),
    }
}

impl Presenter for LogPresenter {
    fn resolved(&mut self, resolution: &Resolution, effects: EffectSchedule) {
        debug!(frame_index = resolution.frame_index, effects = effects.len(), "resolved");
        self.pending = Some(effects);
    }

    fn reset(&mut self) {
        self.pending = None;
    }
}

fn load_params(path: Option<&Path>) -> anyhow::Result<EngineParams> {
    let Some(path) = path else {
        return Ok(EngineParams::default());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let params: EngineParams = serde_json::from_str(&raw).context("parse engine params")?;
    params.validate()?;
    Ok(params)
}

fn csv_writer(path: &Path) -> anyhow::Result<csv::Writer<std::fs::File>> {
    let fresh = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok(csv::WriterBuilder::new().has_headers(fresh).from_writer(file))
}

fn default_server_seed() -> String {
    let now = chrono::Utc::now();
    format!("{}", now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros()))
}

async fn run_round<C: ImageCatalog>(
    table: &mut Roulette<C>,
    presenter: &mut LogPresenter,
    spin_ticks: u64,
    realtime: bool,
) -> Resolution {
    let mut frame = realtime.then(|| tokio::time::interval(FRAME));
    table.start(presenter);
    loop {
        if let Some(interval) = frame.as_mut() {
            interval.tick().await;
        }
        if table.state() == SpinState::Spinning && table.engine().ticks() >= spin_ticks {
            table.stop();
        }
        if let Some(resolution) = table.tick(presenter) {
            return resolution;
        }
    }
}

/// Runs `args.rounds` spins and returns one record per round.
pub async fn run<C: ImageCatalog>(catalog: C, args: &SpinArgs) -> anyhow::Result<Vec<SpinRecord>> {
    let params = load_params(args.params.as_deref())?;
    let source = args
        .folder
        .as_deref()
        .map_or(SourceId::Demo, |id| SourceId::Folder(id.to_string()));
    let server_seed = args.server_seed.clone().unwrap_or_else(default_server_seed);

    let mut table = Roulette::open(
        AssetSource::new(catalog),
        CarouselBuilder::default(),
        params,
        source,
    )
    .await?;
    if let Some(fallback) = &table.loaded().fallback {
        warn!(?fallback, "spinning over the demo faces instead");
    }

    let mut writer = args.csv.as_deref().map(csv_writer).transpose()?;
    let mut presenter = LogPresenter::default();
    let mut records = Vec::with_capacity(args.rounds as usize);

    for round in 0..args.rounds {
        let nonce = args.nonce + round as u64;
        let mut rng = SeededRng::new(&server_seed, &args.client_seed, nonce)?;
        let spin_ticks = rng.next_in(args.min_spin_ticks, args.max_spin_ticks);
        let server_seed_hash = rng.server_seed_hash_hex().to_string();
        table.reseed(rng);

        let resolution = run_round(&mut table, &mut presenter, spin_ticks, args.realtime).await;
        presenter.play(args.realtime).await;

        let item_key = table
            .winner(&resolution)
            .map(|item| item.key.to_string())
            .unwrap_or_default();
        info!(round, nonce, winner = %item_key, items = table.items().len(), "round finished");
        let record = SpinRecord {
            round,
            source: table.loaded().source.to_string(),
            server_seed_hash,
            nonce,
            ticks: table.engine().ticks(),
            scroll: resolution.snapped_scroll,
            frame_index: resolution.frame_index,
            item_index: resolution.item_index,
            item_key,
        };
        if let Some(w) = writer.as_mut() {
            w.serialize(&record)?;
        }
        records.push(record);

        if args.eliminate {
            table.eliminate_winner(&mut presenter).await?;
        } else {
            table.continue_game(&mut presenter);
        }
    }
    if let Some(mut w) = writer {
        w.flush()?;
    }
    Ok(records)
}
