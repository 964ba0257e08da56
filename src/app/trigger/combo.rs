// SPDX-License-Identifier: GPL-3.0-only

//! Randomized combo trigger
//!
//! A single face showing happy and angry at the same time opens (or extends)
//! the combo window. Each tick inside the window fires with a fixed chance,
//! after which the cooldown keeps the surprise mode on.

use super::{TriggerOutput, TriggerPhase};
use crate::app::frame_processor::FaceDetection;
use crate::config::TriggerConfig;
use crate::constants::expressions::{ANGRY, HAPPY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

pub struct ComboTrigger {
    config: TriggerConfig,
    rng: StdRng,
    combo_until: Option<Instant>,
    triggered_until: Option<Instant>,
}

impl ComboTrigger {
    /// Seeded from `config.seed` when set, from the OS otherwise
    pub fn new(config: TriggerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    fn with_rng(config: TriggerConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            combo_until: None,
            triggered_until: None,
        }
    }

    /// Clears windows; the RNG stream continues
    pub fn reset(&mut self) {
        self.combo_until = None;
        self.triggered_until = None;
    }

    pub fn phase(&self) -> TriggerPhase {
        if self.triggered_until.is_some() {
            TriggerPhase::Triggered
        } else if self.combo_until.is_some() {
            TriggerPhase::Combo
        } else {
            TriggerPhase::Idle
        }
    }

    fn chance(&self) -> f64 {
        let chance = self.config.combo_chance;
        if (0.0..=1.0).contains(&chance) {
            chance
        } else {
            0.0
        }
    }

    pub fn tick(&mut self, now: Instant, detections: &[FaceDetection]) -> TriggerOutput {
        if let Some(until) = self.triggered_until {
            if now < until {
                return TriggerOutput::new(TriggerPhase::Triggered);
            }
            self.triggered_until = None;
            info!("Surprise mode ended");
        }

        let combo_face = detections.iter().any(|face| {
            face.expressions.get(HAPPY) >= self.config.happy_threshold
                && face.expressions.get(ANGRY) >= self.config.angry_threshold
        });
        if combo_face {
            if self.combo_until.is_none() {
                debug!(window_ms = self.config.combo_window_ms, "Combo window opened");
            }
            self.combo_until = Some(now + self.config.combo_window());
        }

        match self.combo_until {
            Some(until) if now < until => {
                if self.rng.random_bool(self.chance()) {
                    self.combo_until = None;
                    self.triggered_until = Some(now + self.config.cooldown());
                    info!(cooldown_ms = self.config.cooldown_ms, "Surprise mode triggered");
                    return TriggerOutput::new(TriggerPhase::Triggered);
                }
                TriggerOutput::new(TriggerPhase::Combo)
            }
            Some(_) => {
                self.combo_until = None;
                debug!("Combo window expired");
                TriggerOutput::new(TriggerPhase::Idle)
            }
            None => TriggerOutput::new(TriggerPhase::Idle),
        }
    }
}
