//! Presentation side of a spin.
//!
//! The engine never touches a rendering surface. Each tick it hands the
//! wrapped strip offset to a [`Presenter`], and when a spin settles it hands
//! over an [`EffectSchedule`]: the highlight, snap and celebration steps as an
//! ordered list of timed events that the presenter (or a test) advances.

use std::collections::VecDeque;

use crate::resolver::Resolution;
use crate::rng::SeededRng;

pub const SNAP_DURATION_MS: u64 = 500;
pub const FIREWORK_COUNT: usize = 5;
pub const FIREWORK_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ease the strip onto the snapped offset.
    SnapTo { offset: f64, duration_ms: u64 },
    Highlight { frame_index: usize },
    /// Enlarged copy of the winning frame over the strip.
    Breakout { frame_index: usize },
    PlayCheer,
    ShowWinnerActions,
    Firework { x_fraction: f64, hue: u16 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEffect {
    pub at_ms: u64,
    pub effect: Effect,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectSchedule {
    pending: VecDeque<ScheduledEffect>,
}

impl EffectSchedule {
    pub fn for_resolution(resolution: &Resolution, render_offset: f64, rng: &mut SeededRng) -> Self {
        let frame_index = resolution.frame_index;
        let mut pending = VecDeque::from(vec![
            ScheduledEffect {
                at_ms: 0,
                effect: Effect::SnapTo {
                    offset: render_offset,
                    duration_ms: SNAP_DURATION_MS,
                },
            },
            ScheduledEffect {
                at_ms: SNAP_DURATION_MS,
                effect: Effect::Highlight { frame_index },
            },
            ScheduledEffect {
                at_ms: SNAP_DURATION_MS,
                effect: Effect::Breakout { frame_index },
            },
            ScheduledEffect {
                at_ms: SNAP_DURATION_MS,
                effect: Effect::PlayCheer,
            },
            ScheduledEffect {
                at_ms: SNAP_DURATION_MS,
                effect: Effect::ShowWinnerActions,
            },
        ]);
        for i in 0..FIREWORK_COUNT as u64 {
            pending.push_back(ScheduledEffect {
                at_ms: SNAP_DURATION_MS + i * FIREWORK_INTERVAL_MS,
                effect: Effect::Firework {
                    x_fraction: rng.next_f64(),
                    hue: rng.next_in(0, 359) as u16,
                },
            });
        }
        Self { pending }
    }

    /// Drains every effect scheduled at or before `elapsed_ms`, in order.
    pub fn due(&mut self, elapsed_ms: u64) -> Vec<Effect> {
        let mut out = Vec::new();
        while self
            .pending
            .front()
            .is_some_and(|next| next.at_ms <= elapsed_ms)
        {
            if let Some(next) = self.pending.pop_front() {
                out.push(next.effect);
            }
        }
        out
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time of the last scheduled effect.
    pub fn duration_ms(&self) -> u64 {
        self.pending.back().map_or(0, |last| last.at_ms)
    }
}

pub trait Presenter {
    /// Called once per tick with the wrapped strip offset.
    fn render(&mut self, _offset: f64) {}

    /// Called exactly once per spin, on the tick the strip settles.
    fn resolved(&mut self, resolution: &Resolution, effects: EffectSchedule);

    /// Winner display cleared (continue, eliminate, or a new spin).
    fn reset(&mut self) {}
}

/// Presenter for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub frames_rendered: u64,
    pub last_offset: f64,
    pub resolutions: Vec<(Resolution, EffectSchedule)>,
    pub resets: u64,
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, offset: f64) {
        self.frames_rendered += 1;
        self.last_offset = offset;
    }

    fn resolved(&mut self, resolution: &Resolution, effects: EffectSchedule) {
        self.resolutions.push((*resolution, effects));
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;

    fn schedule() -> EffectSchedule {
        let resolution = resolve(1450.0, 200.0, 84, 3);
        let mut rng = SeededRng::new("server", "client", 1).unwrap();
        EffectSchedule::for_resolution(&resolution, 1400.0 % 600.0, &mut rng)
    }

    #[test]
    fn snap_comes_first() {
        let mut s = schedule();
        assert_eq!(
            s.due(0),
            vec![Effect::SnapTo {
                offset: 200.0,
                duration_ms: SNAP_DURATION_MS
            }]
        );
    }

    #[test]
    fn advances_in_steps() {
        let mut s = schedule();
        assert_eq!(s.len(), 5 + FIREWORK_COUNT);
        assert_eq!(s.duration_ms(), 500 + 4 * 300);
        s.due(0);
        let at_snap_end = s.due(499);
        assert!(at_snap_end.is_empty());
        let burst = s.due(500);
        assert_eq!(burst[0], Effect::Highlight { frame_index: 7 });
        assert_eq!(burst[1], Effect::Breakout { frame_index: 7 });
        assert_eq!(burst[2], Effect::PlayCheer);
        assert_eq!(burst[3], Effect::ShowWinnerActions);
        // first firework shares the 500ms slot
        assert!(matches!(burst[4], Effect::Firework { .. }));
        assert_eq!(burst.len(), 5);
        assert_eq!(s.due(1099).len(), 1);
        assert_eq!(s.due(10_000).len(), 3);
        assert!(s.is_finished());
    }

    #[test]
    fn fireworks_are_seeded() {
        assert_eq!(schedule(), schedule());
    }
}
