use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Explicit (forward) Euler stepper: `y_{n+1} = y_n + dt * f(t_n, y_n)`.
///
/// The slope of the most recent step is kept so callers can report the
/// per-component contribution without re-evaluating the system.
pub struct Euler<T: Scalar> {
    slope: Vec<T>,
}

impl<T: Scalar> Euler<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            slope: vec![T::zero(); dim],
        }
    }

    /// `f(t_n, y_n)` from the last call to `step`.
    pub fn slope(&self) -> &[T] {
        &self.slope
    }
}

impl<T: Scalar> Steppable<T> for Euler<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;

        // The whole slope is evaluated against the frozen state before any
        // component is written.
        system.apply(t0, state, &mut self.slope);

        for i in 0..state.len() {
            state[i] = state[i] + dt * self.slope[i];
        }

        *t = t0 + dt;
    }
}
