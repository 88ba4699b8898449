//! Text rendering of integration trace records.
//!
//! Formatting is kept apart from stepping: the integrator only produces
//! [`TraceEntry`] values and this module turns them into display lines.

use crate::integrator::TraceEntry;
use serde::{Deserialize, Serialize};

/// Display wording. Has no numeric significance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceStyle {
    /// A single higher-order equation reduced to a vector system.
    HigherOrder,
    /// Several equations supplied together.
    System,
}

impl TraceStyle {
    pub fn for_equation_count(count: usize) -> Self {
        if count == 1 {
            TraceStyle::HigherOrder
        } else {
            TraceStyle::System
        }
    }
}

/// Most decimal places a trace can show; `10^p` must stay finite and exact
/// enough to round an `f64`.
pub const MAX_PRECISION: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSettings {
    /// Decimal places for values.
    pub precision: u32,
    /// Decimal places for the time column.
    pub time_precision: u32,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            precision: 3,
            time_precision: 4,
        }
    }
}

/// Rounds half-up to `digits` decimal places.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor + 0.5).floor() / factor
}

pub struct TraceFormatter {
    style: TraceStyle,
    settings: TraceSettings,
    size: usize,
    step_size: f64,
}

impl TraceFormatter {
    pub fn new(style: TraceStyle, settings: TraceSettings, size: usize, step_size: f64) -> Self {
        Self {
            style,
            settings,
            size,
            step_size,
        }
    }

    pub fn line(&self, entry: &TraceEntry) -> String {
        let time = round_to(entry.time, self.settings.time_precision);
        let derivative = round_to(entry.derivative, self.settings.precision);
        let next = round_to(entry.next, self.settings.precision);

        match self.style {
            TraceStyle::HigherOrder => {
                let marks = "'".repeat(entry.component);
                let pad = " ".repeat(self.size.saturating_sub(entry.component));
                format!(
                    "[Iteration {} | t={}] y{}{} = y(n-1){}{}+ {} * {} = {}",
                    entry.iteration + 1,
                    time,
                    marks,
                    pad,
                    marks,
                    pad,
                    self.step_size,
                    derivative,
                    next
                )
            }
            TraceStyle::System => format!(
                "[t={}] y_({},{}) = y_({},{}) + {} * {} = {}",
                time,
                entry.component + 1,
                entry.iteration + 1,
                entry.component + 1,
                entry.iteration,
                self.step_size,
                derivative,
                next
            ),
        }
    }

    pub fn lines(&self, entries: &[TraceEntry]) -> Vec<String> {
        entries.iter().map(|entry| self.line(entry)).collect()
    }
}
