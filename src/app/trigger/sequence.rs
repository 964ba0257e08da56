// SPDX-License-Identifier: GPL-3.0-only

//! Deterministic sequence trigger
//!
//! ```text
//! Idle --surprised held--> Golden --no face--> (glitch) --face back--> Followup
//!                                                            happy + angry |
//! Idle <-------------------------- cooldown ---------------------- Triggered
//! ```
//!
//! Window starts are inclusive and ends exclusive: a window opened at `t`
//! with length `d` covers `t <= now < t + d`.

use super::{ExpressionPeaks, PulseKind, TriggerOutput, TriggerPhase};
use crate::config::TriggerConfig;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SequenceTrigger {
    config: TriggerConfig,
    /// Surprised held since
    hold_since: Option<Instant>,
    golden_until: Option<Instant>,
    /// Start of the current no-face stretch inside the golden window
    no_face_since: Option<Instant>,
    glitch_satisfied: bool,
    followup_until: Option<Instant>,
    saw_happy: bool,
    saw_angry: bool,
    triggered_until: Option<Instant>,
}

impl SequenceTrigger {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            hold_since: None,
            golden_until: None,
            no_face_since: None,
            glitch_satisfied: false,
            followup_until: None,
            saw_happy: false,
            saw_angry: false,
            triggered_until: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    /// Drop sequence progress, keeping any running cooldown
    fn reset_sequence(&mut self) {
        self.hold_since = None;
        self.golden_until = None;
        self.no_face_since = None;
        self.glitch_satisfied = false;
        self.followup_until = None;
        self.saw_happy = false;
        self.saw_angry = false;
    }

    pub fn phase(&self) -> TriggerPhase {
        if self.triggered_until.is_some() {
            TriggerPhase::Triggered
        } else if self.followup_until.is_some() {
            TriggerPhase::Followup
        } else if self.golden_until.is_some() {
            TriggerPhase::Golden
        } else if self.hold_since.is_some() {
            TriggerPhase::HoldingSurprise
        } else {
            TriggerPhase::Idle
        }
    }

    pub fn tick(&mut self, now: Instant, peaks: &ExpressionPeaks) -> TriggerOutput {
        // Cooldown: nothing advances until it ends
        if let Some(until) = self.triggered_until {
            if now < until {
                return TriggerOutput::new(TriggerPhase::Triggered);
            }
            self.triggered_until = None;
            info!("Surprise mode ended");
        }

        if let Some(golden_until) = self.golden_until {
            if now >= golden_until {
                let glitched = self.glitch_satisfied;
                self.reset_sequence();
                if glitched {
                    debug!("Golden window expired before the face returned");
                    return TriggerOutput::new(self.phase());
                }
                info!("Golden window closed without glitch");
                return TriggerOutput::with_pulse(TriggerPhase::Idle, PulseKind::GoldenClosed);
            }

            if peaks.face_count == 0 {
                let since = *self.no_face_since.get_or_insert(now);
                if !self.glitch_satisfied && now.duration_since(since) >= self.config.glitch() {
                    self.glitch_satisfied = true;
                    info!(
                        no_face_ms = now.duration_since(since).as_millis(),
                        "Glitch satisfied"
                    );
                    return TriggerOutput::with_pulse(TriggerPhase::Golden, PulseKind::Glitch);
                }
                return TriggerOutput::new(TriggerPhase::Golden);
            }

            if !self.glitch_satisfied {
                self.no_face_since = None;
                return TriggerOutput::new(TriggerPhase::Golden);
            }

            // Face is back after the glitch; this tick already counts
            // towards the follow-up
            self.reset_sequence();
            self.followup_until = Some(now + self.config.followup_window());
            info!(
                window_ms = self.config.followup_window_ms,
                "Follow-up window opened"
            );
        }

        if let Some(followup_until) = self.followup_until {
            if now >= followup_until {
                debug!(
                    happy = self.saw_happy,
                    angry = self.saw_angry,
                    "Follow-up window expired"
                );
                self.reset_sequence();
            } else {
                self.saw_happy |= peaks.happy >= self.config.happy_threshold;
                self.saw_angry |= peaks.angry >= self.config.angry_threshold;

                if self.saw_happy && self.saw_angry {
                    self.reset_sequence();
                    self.triggered_until = Some(now + self.config.cooldown());
                    info!(cooldown_ms = self.config.cooldown_ms, "Surprise mode triggered");
                    return TriggerOutput::new(TriggerPhase::Triggered);
                }
                return TriggerOutput::new(TriggerPhase::Followup);
            }
        }

        if peaks.surprised < self.config.surprised_threshold {
            if self.hold_since.take().is_some() {
                debug!(surprised = peaks.surprised, "Surprise hold broken");
            }
            return TriggerOutput::new(TriggerPhase::Idle);
        }

        let since = *self.hold_since.get_or_insert_with(|| {
            debug!(surprised = peaks.surprised, "Surprise hold started");
            now
        });
        if now.duration_since(since) >= self.config.hold() {
            self.hold_since = None;
            self.golden_until = Some(now + self.config.golden_window());
            info!(
                window_ms = self.config.golden_window_ms,
                "Golden window opened"
            );
            return TriggerOutput::with_pulse(TriggerPhase::Golden, PulseKind::GoldenEntered);
        }
        TriggerOutput::new(TriggerPhase::HoldingSurprise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    fn peaks(surprised: f64, happy: f64, angry: f64) -> ExpressionPeaks {
        ExpressionPeaks {
            face_count: 1,
            surprised,
            happy,
            angry,
        }
    }

    fn no_faces() -> ExpressionPeaks {
        ExpressionPeaks::default()
    }

    /// Hold surprise from 0 to 5000ms; golden opens at 5000
    fn open_golden(trigger: &mut SequenceTrigger, base: Instant) {
        for ms in (0..5000).step_by(100) {
            let out = trigger.tick(at(base, ms), &peaks(0.97, 0.0, 0.0));
            assert_eq!(out.phase, TriggerPhase::HoldingSurprise, "at {ms}ms");
        }
        let out = trigger.tick(at(base, 5000), &peaks(0.97, 0.0, 0.0));
        assert_eq!(out, TriggerOutput::with_pulse(TriggerPhase::Golden, PulseKind::GoldenEntered));
    }

    #[test]
    fn test_hold_broken_by_low_surprise() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());

        trigger.tick(at(base, 0), &peaks(0.99, 0.0, 0.0));
        trigger.tick(at(base, 4900), &peaks(0.5, 0.0, 0.0));
        assert_eq!(trigger.phase(), TriggerPhase::Idle);

        let out = trigger.tick(at(base, 5000), &peaks(0.99, 0.0, 0.0));
        assert_eq!(out.phase, TriggerPhase::HoldingSurprise);
        assert_eq!(out.pulse, None);
    }

    #[test]
    fn test_golden_expires_with_closed_pulse() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        let out = trigger.tick(at(base, 8900), &peaks(0.1, 0.0, 0.0));
        assert_eq!(out.phase, TriggerPhase::Golden);

        let out = trigger.tick(at(base, 9000), &peaks(0.1, 0.0, 0.0));
        assert_eq!(out, TriggerOutput::with_pulse(TriggerPhase::Idle, PulseKind::GoldenClosed));
    }

    #[test]
    fn test_golden_expires_silently_after_glitch() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        let mut pulses = Vec::new();
        let mut last = TriggerOutput::default();
        for ms in (5100..=9500).step_by(100) {
            last = trigger.tick(at(base, ms), &no_faces());
            if let Some(pulse) = last.pulse {
                pulses.push((ms, pulse));
            }
        }
        assert_eq!(pulses, vec![(6100, PulseKind::Glitch)]);
        assert_eq!(last, TriggerOutput::new(TriggerPhase::Idle));

        // The window is gone, so a returning face opens no follow-up
        let out = trigger.tick(at(base, 9600), &peaks(0.0, 0.9, 0.9));
        assert_eq!(out, TriggerOutput::new(TriggerPhase::Idle));
        assert_eq!(trigger.phase(), TriggerPhase::Idle);
    }

    #[test]
    fn test_short_absence_does_not_glitch() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        trigger.tick(at(base, 5100), &no_faces());
        trigger.tick(at(base, 5900), &no_faces());
        // Face back before 1000ms: the stretch restarts
        trigger.tick(at(base, 6000), &peaks(0.0, 0.0, 0.0));
        let out = trigger.tick(at(base, 6100), &no_faces());
        assert_eq!(out.pulse, None);
        let out = trigger.tick(at(base, 7000), &no_faces());
        assert_eq!(out.pulse, None);
        let out = trigger.tick(at(base, 7100), &no_faces());
        assert_eq!(out.pulse, Some(PulseKind::Glitch));
    }

    #[test]
    fn test_glitch_pulse_emitted_once() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        trigger.tick(at(base, 5100), &no_faces());
        let out = trigger.tick(at(base, 6100), &no_faces());
        assert_eq!(out, TriggerOutput::with_pulse(TriggerPhase::Golden, PulseKind::Glitch));
        let out = trigger.tick(at(base, 6200), &no_faces());
        assert_eq!(out.pulse, None);
    }

    #[test]
    fn test_followup_expires_without_both_expressions() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        trigger.tick(at(base, 5100), &no_faces());
        trigger.tick(at(base, 6100), &no_faces());
        let out = trigger.tick(at(base, 6200), &peaks(0.0, 0.8, 0.0));
        assert_eq!(out.phase, TriggerPhase::Followup);

        let out = trigger.tick(at(base, 10100), &peaks(0.0, 0.0, 0.1));
        assert_eq!(out.phase, TriggerPhase::Followup);
        let out = trigger.tick(at(base, 10200), &peaks(0.0, 0.0, 0.9));
        assert_eq!(out.phase, TriggerPhase::Idle);
    }

    #[test]
    fn test_happy_and_angry_on_same_tick_trigger() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        trigger.tick(at(base, 5100), &no_faces());
        trigger.tick(at(base, 6100), &no_faces());
        let out = trigger.tick(at(base, 6300), &peaks(0.0, 0.5, 0.5));
        assert_eq!(out.phase, TriggerPhase::Triggered);
    }

    #[test]
    fn test_reset_clears_progress() {
        let base = Instant::now();
        let mut trigger = SequenceTrigger::new(TriggerConfig::default());
        open_golden(&mut trigger, base);

        trigger.reset();
        assert_eq!(trigger.phase(), TriggerPhase::Idle);
        let out = trigger.tick(at(base, 5100), &no_faces());
        assert_eq!(out, TriggerOutput::new(TriggerPhase::Idle));
    }
}
