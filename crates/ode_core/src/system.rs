//! Reduction of derivative equations to a first-order vector system.
//!
//! The state vector holds `[y, y', ..., y^(N-1)]`. Component `i` evolves
//! either by the chain relation `y_i' = y_{i+1}` or by a user equation: an
//! equation of order `k` supplies the derivative of component `k - 1` and
//! replaces the chain relation there. The system size `N` is the highest
//! equation order.

use crate::equation_engine::{parse_equation, Equation};
use crate::error::{OdeError, Result};
use crate::expression::Expr;
use crate::traits::{DynamicalSystem, Scalar};

/// How one component's derivative is computed.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// The derivative is the state component at this index.
    Chain(usize),
    Equation(Expr),
}

impl Slot {
    pub fn eval<T: Scalar>(&self, t: T, y: &[T]) -> T {
        match self {
            Slot::Chain(next) => y.get(*next).copied().unwrap_or_else(T::nan),
            Slot::Equation(expr) => expr.eval(t, y),
        }
    }
}

/// An assembled system: one derivative slot per component plus the initial
/// state. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationSystem {
    slots: Vec<Slot>,
    initial_state: Vec<f64>,
}

impl EquationSystem {
    /// Assembles a system from parsed equations and initial conditions.
    ///
    /// `initial_conditions` pairs each parsed condition with its source text
    /// for diagnostics.
    pub fn assemble(
        equations: &[Equation],
        initial_conditions: &[(&str, Equation)],
        start_time: f64,
    ) -> Result<Self> {
        let slots = assemble_slots(equations)?;
        let initial_state = resolve_initial_state(initial_conditions, slots.len(), start_time)?;
        Ok(Self {
            slots,
            initial_state,
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Initial values ordered by derivative order. Components without an
    /// initial condition are NaN.
    pub fn initial_state(&self) -> &[f64] {
        &self.initial_state
    }

    /// Allocating convenience wrapper around [`DynamicalSystem::apply`].
    pub fn derivative(&self, t: f64, y: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.size()];
        self.apply(t, y, &mut out);
        out
    }
}

impl<T: Scalar> DynamicalSystem<T> for EquationSystem {
    fn dimension(&self) -> usize {
        self.slots.len()
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        for (i, slot) in self.slots.iter().enumerate() {
            out[i] = slot.eval(t, x);
        }
    }
}

/// Parses equation and initial-condition strings and assembles the system.
pub fn build_system<S: AsRef<str>>(
    equations: &[S],
    initial_conditions: &[S],
    start_time: f64,
) -> Result<EquationSystem> {
    let mut parsed = Vec::with_capacity(equations.len());
    for text in equations {
        let equation = parse_equation(text.as_ref())?;
        log::debug!(
            "parsed equation '{}' as y^({}) = {}",
            text.as_ref(),
            equation.order,
            equation.rhs
        );
        parsed.push(equation);
    }

    let mut conditions = Vec::with_capacity(initial_conditions.len());
    for text in initial_conditions {
        let text = text.as_ref();
        conditions.push((text, parse_equation(text)?));
    }

    let system = EquationSystem::assemble(&parsed, &conditions, start_time)?;
    log::debug!(
        "assembled system of order {} with initial state {:?}",
        system.size(),
        system.initial_state()
    );
    Ok(system)
}

fn assemble_slots(equations: &[Equation]) -> Result<Vec<Slot>> {
    if equations.is_empty() {
        return Err(OdeError::SystemAssembly(
            "At least one equation is required.".to_string(),
        ));
    }
    if equations.iter().any(|eq| eq.order == 0) {
        return Err(OdeError::SystemAssembly(
            "An equation of order 0 does not define a derivative.".to_string(),
        ));
    }

    let size = equations.iter().map(|eq| eq.order).max().unwrap_or(0);
    let mut slots: Vec<Option<Slot>> = (0..size)
        .map(|i| (i + 1 < size).then(|| Slot::Chain(i + 1)))
        .collect();
    let mut claimed = vec![false; size];

    for eq in equations {
        let component = eq.order - 1;
        if claimed[component] {
            return Err(OdeError::SystemAssembly(format!(
                "Duplicate equations for order {}.",
                eq.order
            )));
        }
        if let Some(&idx) = eq.rhs.state_refs().iter().find(|&&idx| idx >= size) {
            return Err(OdeError::SystemAssembly(format!(
                "Equation of order {} references y{} outside a system of order {}.",
                eq.order,
                "'".repeat(idx),
                size
            )));
        }
        claimed[component] = true;
        slots[component] = Some(Slot::Equation(eq.rhs.clone()));
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| {
                OdeError::SystemAssembly(format!(
                    "No equation defines the derivative of component {}.",
                    i
                ))
            })
        })
        .collect()
}

/// Evaluates initial conditions in ascending order at `start_time`. Each
/// right-hand side may read components resolved before it.
fn resolve_initial_state(
    conditions: &[(&str, Equation)],
    size: usize,
    start_time: f64,
) -> Result<Vec<f64>> {
    let mut sorted: Vec<&(&str, Equation)> = conditions.iter().collect();
    sorted.sort_by_key(|(_, eq)| eq.order);

    let mut state = vec![f64::NAN; size];
    let mut resolved = vec![false; size];

    for (input, eq) in sorted {
        if eq.order == size {
            return Err(OdeError::SystemAssembly(format!(
                "Initial condition '{}' sets y^({}), the highest derivative of a system of order {}. \
                 That derivative comes from the equation itself; drop this initial condition and \
                 supply only orders 0 through {}.",
                input,
                eq.order,
                size,
                size.saturating_sub(1)
            )));
        }
        if eq.order > size {
            return Err(OdeError::SystemAssembly(format!(
                "Initial condition '{}' has order {}, but a system of order {} only tracks orders below {}.",
                input, eq.order, size, size
            )));
        }
        if resolved[eq.order] {
            return Err(OdeError::SystemAssembly(format!(
                "Duplicate initial conditions for order {}.",
                eq.order
            )));
        }
        if let Some(&component) = eq
            .rhs
            .state_refs()
            .iter()
            .find(|&&idx| idx >= size || !resolved[idx])
        {
            return Err(OdeError::UnresolvedInitialCondition {
                input: input.to_string(),
                component,
            });
        }
        state[eq.order] = eq.rhs.eval(start_time, &state);
        resolved[eq.order] = true;
    }

    Ok(state)
}
