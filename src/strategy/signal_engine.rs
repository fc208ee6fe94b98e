//! Signal Engine
//!
//! Z-score to position state machine, followed by a debounce filter.
//!
//! Flat  -> Long   when z <= -entry
//! Flat  -> Short  when z >= entry
//! Held  -> Flat   when |z| <= exit, or the hold limit is reached,
//!                 or |z| reaches the stop level (if one is set)
//!
//! The state at t depends on the state and holding time at t-1, so the
//! series is produced by an explicit left-to-right scan.

use crate::domain::signal::Signal;
use crate::strategy::params::SignalConfig;

/// Sequential position state machine for one spread
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: SignalConfig,
    state: Signal,
    hold_counter: usize,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self {
            config,
            state: Signal::Flat,
            hold_counter: 0,
        }
    }

    pub fn state(&self) -> Signal {
        self.state
    }

    /// Steps the current position has been held
    pub fn hold_counter(&self) -> usize {
        self.hold_counter
    }

    pub fn reset(&mut self) {
        self.state = Signal::Flat;
        self.hold_counter = 0;
    }

    /// Advance one timestep
    ///
    /// A NaN z-score never opens a position; an open one still ages and can
    /// be closed by the hold limit.
    pub fn step(&mut self, zscore: f64) -> Signal {
        let entry = self.config.entry_threshold;

        match self.state {
            Signal::Flat => {
                if zscore <= -entry {
                    self.state = Signal::Long;
                } else if zscore >= entry {
                    self.state = Signal::Short;
                }
            }
            Signal::Long | Signal::Short => {
                self.hold_counter += 1;
                let reverted = zscore.abs() <= self.config.exit_threshold;
                let expired = self
                    .config
                    .max_hold
                    .is_some_and(|max| self.hold_counter >= max);
                let stopped = self
                    .config
                    .stop_threshold
                    .is_some_and(|stop| zscore.abs() >= stop);

                if reverted || expired || stopped {
                    if stopped && !reverted && !expired {
                        tracing::debug!("Pair stop hit at |z| = {:.2}", zscore.abs());
                    }
                    self.state = Signal::Flat;
                    self.hold_counter = 0;
                }
            }
        }

        self.state
    }

    /// Run the machine over a whole z-score series from a flat start
    pub fn generate(&mut self, zscores: &[f64]) -> Vec<Signal> {
        self.reset();
        zscores.iter().map(|&z| self.step(z)).collect()
    }
}

/// Suppresses signal changes that follow too closely on the previous one
///
/// A change is held back (emitted as flat) when fewer than `min_gap` steps
/// have passed since the last accepted change and the last accepted signal
/// is not flat. Leaving flat is therefore never suppressed.
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_gap: usize,
    last_accepted: Signal,
    steps_since_change: usize,
}

impl Debouncer {
    pub fn new(min_gap: usize) -> Self {
        Self {
            min_gap,
            last_accepted: Signal::Flat,
            steps_since_change: 0,
        }
    }

    pub fn last_accepted(&self) -> Signal {
        self.last_accepted
    }

    pub fn filter(&mut self, signal: Signal) -> Signal {
        let out = if signal != self.last_accepted {
            if self.steps_since_change < self.min_gap && !self.last_accepted.is_flat() {
                Signal::Flat
            } else {
                self.last_accepted = signal;
                self.steps_since_change = 0;
                signal
            }
        } else {
            signal
        };
        self.steps_since_change += 1;
        out
    }
}

/// Debounce a whole signal series
pub fn debounce(signals: &[Signal], min_gap: usize) -> Vec<Signal> {
    let mut debouncer = Debouncer::new(min_gap);
    signals.iter().map(|&s| debouncer.filter(s)).collect()
}

/// Raw state machine output passed through the debouncer
pub fn generate_signals(zscores: &[f64], config: &SignalConfig) -> Vec<Signal> {
    let raw = SignalEngine::new(config.clone()).generate(zscores);
    debounce(&raw, config.min_gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use crate::domain::signal::Signal::{Flat, Long, Short};

    #[test]
    fn test_entry_and_exit() {
        let config = SignalConfig::default();
        let z = [0.0, -2.1, -1.0, -0.4, 0.0, 2.5, 1.0, 0.5, 0.0];
        let signals = SignalEngine::new(config).generate(&z);
        assert_eq!(
            signals,
            vec![Flat, Long, Long, Flat, Flat, Short, Short, Flat, Flat]
        );
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        assert_eq!(engine.step(-2.0), Long);
        assert_eq!(engine.step(0.5), Flat);
        assert_eq!(engine.step(2.0), Short);
    }

    #[test]
    fn test_max_hold_forces_exit() {
        let config = SignalConfig::default().with_max_hold(Some(2));
        let z = [3.0, 3.0, 3.0, 3.0, 3.0];
        let signals = SignalEngine::new(config).generate(&z);
        // Entry at t0, two held steps, exit, re-entry on the next step
        assert_eq!(signals, vec![Short, Short, Flat, Short, Short]);
    }

    #[test]
    fn test_stop_threshold() {
        let config = SignalConfig::default().with_stop(Some(4.0));
        let z = [-2.5, -3.0, -4.2, -3.0];
        let signals = SignalEngine::new(config).generate(&z);
        assert_eq!(signals, vec![Long, Long, Flat, Long]);

        // Without a stop the position rides through
        let signals = SignalEngine::new(SignalConfig::default()).generate(&z);
        assert_eq!(signals, vec![Long, Long, Long, Long]);
    }

    #[test]
    fn test_nan_does_not_open_position() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        assert_eq!(engine.step(f64::NAN), Flat);
        assert_eq!(engine.step(-3.0), Long);
        assert_eq!(engine.step(f64::NAN), Long);
        assert_eq!(engine.hold_counter(), 1);
    }

    #[test]
    fn test_generate_resets_state() {
        let mut engine = SignalEngine::new(SignalConfig::default());
        engine.generate(&[3.0, 3.0]);
        assert_eq!(engine.state(), Short);
        let signals = engine.generate(&[0.0]);
        assert_eq!(signals, vec![Flat]);
    }

    #[test]
    fn test_debounce_suppresses_quick_flip() {
        let out = debounce(&[Flat, Long, Short, Long], 2);
        assert_eq!(out, vec![Flat, Long, Flat, Long]);
    }

    #[test]
    fn test_debounce_first_entry_not_suppressed() {
        let out = debounce(&[Short, Short, Long], 5);
        assert_eq!(out, vec![Short, Short, Flat]);
    }

    #[test]
    fn test_min_gap_one_passes_through() {
        let raw = [Flat, Long, Short, Flat, Short, Long];
        assert_eq!(debounce(&raw, 1), raw.to_vec());
    }

    #[test]
    fn test_accepted_changes_respect_min_gap() {
        let mut rng = StdRng::seed_from_u64(17);
        for min_gap in 1..6 {
            let raw: Vec<Signal> = (0..500)
                .map(|_| match rng.gen_range(0..3) {
                    0 => Short,
                    1 => Flat,
                    _ => Long,
                })
                .collect();

            let mut debouncer = Debouncer::new(min_gap);
            let mut last_change: Option<(usize, Signal)> = None;
            for (t, &s) in raw.iter().enumerate() {
                let before = debouncer.last_accepted();
                debouncer.filter(s);
                if debouncer.last_accepted() != before {
                    if let Some((prev_t, prev)) = last_change {
                        if !prev.is_flat() {
                            assert!(
                                t - prev_t >= min_gap,
                                "change at {t} only {} steps after {prev_t}",
                                t - prev_t
                            );
                        }
                    }
                    last_change = Some((t, debouncer.last_accepted()));
                }
            }
        }
    }

    #[test]
    fn test_generate_signals_applies_debounce() {
        let config = SignalConfig::default().with_min_gap(3);
        // Raw: Long, Flat, Short, Short, Short; the flip to short at t2 is held off
        let z = [-2.5, 0.0, 2.5, 2.5, 2.5];
        let signals = generate_signals(&z, &config);
        assert_eq!(signals, vec![Long, Flat, Flat, Short, Short]);
    }
}
