use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    carousel::FrameList,
    error::CoreError,
    presenter::{EffectSchedule, Presenter},
    resolver::{resolve, Resolution},
    rng::SeededRng,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Pixels per tick while spinning.
    pub max_speed: f64,
    /// Per-tick speed multiplier while stopping.
    pub friction: f64,
    pub stop_threshold: f64,
    /// Frame content width in pixels, border included.
    pub frame_width: f64,
    pub gap: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_speed: 50.0,
            friction: 0.992,
            stop_threshold: 0.2,
            frame_width: 188.0,
            gap: 24.0,
        }
    }
}

impl EngineParams {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(CoreError::InvalidParams("friction must be in (0, 1)"));
        }
        if !(self.stop_threshold > 0.0) {
            return Err(CoreError::InvalidParams("stop_threshold must be > 0"));
        }
        if !(self.max_speed > self.stop_threshold) {
            return Err(CoreError::InvalidParams("max_speed must exceed stop_threshold"));
        }
        if !(self.frame_width > 0.0) || !(self.gap >= 0.0) {
            return Err(CoreError::InvalidParams("frame_width must be > 0 and gap >= 0"));
        }
        Ok(())
    }

    /// Distance between the starts of two neighbouring frames.
    pub fn full_width(&self) -> f64 {
        self.frame_width + self.gap
    }

    /// Ticks spent in `Stopping` when the decay starts from `max_speed`:
    /// the smallest `k` with `max_speed * friction^k < stop_threshold`.
    pub fn ticks_to_stop(&self) -> u64 {
        let exact = (self.stop_threshold / self.max_speed).ln() / self.friction.ln();
        exact.floor() as u64 + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinState {
    Idle,
    Spinning,
    Stopping,
    Stopped,
}

/// One carousel's spin simulation.
///
/// `scroll` is the cumulative distance since the last `start()`; only the
/// presenter ever sees it wrapped to one cycle of the item set.
#[derive(Debug, Clone)]
pub struct SpinEngine {
    params: EngineParams,
    state: SpinState,
    scroll: f64,
    speed: f64,
    render_offset: f64,
    frame_count: usize,
    item_count: usize,
    ticks: u64,
    resolution: Option<Resolution>,
    rng: SeededRng,
}

impl SpinEngine {
    pub fn new(params: EngineParams, frames: &FrameList) -> Result<Self, CoreError> {
        params.validate()?;
        if frames.is_empty() || frames.item_count() == 0 {
            return Err(CoreError::EmptyItemSet);
        }
        Ok(Self {
            params,
            state: SpinState::Idle,
            scroll: 0.0,
            speed: 0.0,
            render_offset: 0.0,
            frame_count: frames.len(),
            item_count: frames.item_count(),
            ticks: 0,
            resolution: None,
            rng: SeededRng::new("roulette", "local", 0)?,
        })
    }

    /// Replaces the generator used for celebration effects.
    pub fn reseed(&mut self, rng: SeededRng) {
        self.rng = rng;
    }

    /// Swaps in a freshly built strip. Only allowed while the strip is at rest.
    pub fn load(&mut self, frames: &FrameList) -> Result<(), CoreError> {
        match self.state {
            SpinState::Spinning | SpinState::Stopping => Err(CoreError::EngineBusy(self.state)),
            SpinState::Idle | SpinState::Stopped => {
                if frames.is_empty() || frames.item_count() == 0 {
                    return Err(CoreError::EmptyItemSet);
                }
                self.frame_count = frames.len();
                self.item_count = frames.item_count();
                self.state = SpinState::Idle;
                self.scroll = 0.0;
                self.speed = 0.0;
                self.render_offset = 0.0;
                self.ticks = 0;
                self.resolution = None;
                Ok(())
            }
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn state(&self) -> SpinState {
        self.state
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn render_offset(&self) -> f64 {
        self.render_offset
    }

    /// Ticks advanced since the last `start()`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn cycle_width(&self) -> f64 {
        self.item_count as f64 * self.params.full_width()
    }

    /// Enters `Spinning` from any state, discarding residual motion.
    pub fn start(&mut self) {
        debug!(from = ?self.state, "spin start");
        self.state = SpinState::Spinning;
        self.scroll = 0.0;
        self.speed = self.params.max_speed;
        self.render_offset = 0.0;
        self.ticks = 0;
        self.resolution = None;
    }

    /// Begins the friction decay. No-op unless spinning.
    pub fn stop(&mut self) -> bool {
        if self.state != SpinState::Spinning {
            return false;
        }
        debug!(scroll = self.scroll, ticks = self.ticks, "spin stopping");
        self.state = SpinState::Stopping;
        true
    }

    /// Clears the resolved winner. No-op unless stopped.
    pub fn acknowledge(&mut self) -> bool {
        if self.state != SpinState::Stopped {
            return false;
        }
        self.state = SpinState::Idle;
        self.resolution = None;
        true
    }

    /// Single-button control: start, stop, or acknowledge depending on state.
    pub fn toggle(&mut self) -> SpinState {
        match self.state {
            SpinState::Idle => self.start(),
            SpinState::Spinning => {
                self.stop();
            }
            SpinState::Stopped => {
                self.acknowledge();
            }
            SpinState::Stopping => {}
        }
        self.state
    }

    /// Advances one animation frame. Returns the resolution on the tick the
    /// strip settles, and `None` on every other tick.
    pub fn tick<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Option<Resolution> {
        if !matches!(self.state, SpinState::Spinning | SpinState::Stopping) {
            return None;
        }
        self.ticks += 1;
        self.scroll += self.speed;
        self.render_offset = self.scroll.rem_euclid(self.cycle_width());
        presenter.render(self.render_offset);

        if self.state == SpinState::Stopping {
            self.speed *= self.params.friction;
            if self.speed < self.params.stop_threshold {
                return Some(self.settle(presenter));
            }
        }
        None
    }

    fn settle<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Resolution {
        self.state = SpinState::Stopped;
        self.speed = 0.0;
        let resolution = resolve(
            self.scroll,
            self.params.full_width(),
            self.frame_count,
            self.item_count,
        );
        self.scroll = resolution.snapped_scroll;
        self.render_offset = resolution.snapped_scroll.rem_euclid(self.cycle_width());
        self.resolution = Some(resolution);
        info!(
            ticks = self.ticks,
            scroll = resolution.snapped_scroll,
            frame_index = resolution.frame_index,
            item_index = resolution.item_index,
            "spin settled"
        );
        let effects = EffectSchedule::for_resolution(&resolution, self.render_offset, &mut self.rng);
        presenter.resolved(&resolution, effects);
        resolution
    }
}
