use crate::error::{OdeError, Result};
use crate::solvers::Euler;
use crate::traits::{DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub step_size: f64,
    pub start_time: f64,
    pub iterations: usize,
    /// Record a [`TraceEntry`] per component per iteration.
    pub verbose: bool,
}

impl IntegrationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(OdeError::InvalidConfiguration(format!(
                "Step size h must be positive and finite (got {}).",
                self.step_size
            )));
        }
        if !self.start_time.is_finite() {
            return Err(OdeError::InvalidConfiguration(format!(
                "Start time must be finite (got {}).",
                self.start_time
            )));
        }
        Ok(())
    }

    /// `t_o + h * iterations`, up to accumulated rounding of the stepped time.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.step_size * self.iterations as f64
    }
}

/// One component of one Euler step. Purely observational.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub iteration: usize,
    /// Time at the start of the step.
    pub time: f64,
    pub component: usize,
    pub previous: f64,
    pub derivative: f64,
    pub next: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Final state, ordered by derivative order.
    pub state: Vec<f64>,
    pub time: f64,
    pub trace: Option<Vec<TraceEntry>>,
}

/// Integrates `system` from `initial_state` with fixed-step explicit Euler.
///
/// Runs exactly `config.iterations` steps. The first NaN, whether in the
/// initial state or produced by a step, aborts with
/// [`OdeError::NumericDivergence`] naming the lowest offending component.
pub fn integrate<S>(system: &S, initial_state: &[f64], config: &IntegrationConfig) -> Result<Solution>
where
    S: DynamicalSystem<f64>,
{
    config.validate()?;

    let dim = system.dimension();
    if initial_state.len() != dim {
        return Err(OdeError::InvalidConfiguration(format!(
            "Initial state dimension mismatch. Expected {}, got {}.",
            dim,
            initial_state.len()
        )));
    }
    if let Some(component) = first_nan(initial_state) {
        return Err(OdeError::NumericDivergence {
            component,
            iteration: 0,
        });
    }

    let mut stepper = Euler::new(dim);
    let mut state = initial_state.to_vec();
    let mut previous = vec![0.0; dim];
    let mut t = config.start_time;
    let mut trace = config.verbose.then(Vec::new);

    for iteration in 0..config.iterations {
        let t_n = t;
        if trace.is_some() {
            previous.copy_from_slice(&state);
        }

        stepper.step(system, &mut t, &mut state, config.step_size);

        if let Some(component) = first_nan(&state) {
            return Err(OdeError::NumericDivergence {
                component,
                iteration,
            });
        }

        if let Some(entries) = trace.as_mut() {
            for (component, (&next, &derivative)) in
                state.iter().zip(stepper.slope()).enumerate()
            {
                entries.push(TraceEntry {
                    iteration,
                    time: t_n,
                    component,
                    previous: previous[component],
                    derivative,
                    next,
                });
            }
        }
    }

    Ok(Solution {
        state,
        time: t,
        trace,
    })
}

fn first_nan(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| v.is_nan())
}
