//! Metrics domain module.
//!
//! Pure computation of speaking, focus and coverage scores from session
//! data. Nothing here performs IO or mutates a session.

mod calculator;
mod pause;
mod report;

pub use calculator::{MetricsCalculator, MetricsError, MetricsThresholds};
pub use pause::{derive_pauses, Pause, SpeechStats, WordTiming};
pub use report::{DistractionPeriod, MetricsReport};
