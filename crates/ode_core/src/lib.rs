pub mod equation_engine;
pub mod error;
pub mod expression;
pub mod integrator;
pub mod solver;
pub mod solvers;
pub mod system;
pub mod trace;
/// The `ode_core` crate numerically integrates ordinary differential equations written in
/// derivative notation (`y'''=y''*y'*y+t`) with the explicit Euler method.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (vector fields), `Steppable` (Solvers).
/// - **Equation Engine**: A closed-grammar parser producing expression trees; no code is ever executed.
/// - **System**: Reduction of a higher-order equation to a first-order system via chain relations.
/// - **Integrator**: Fixed-step Euler stepping with structured, optional trace records.
/// - **Trace**: Rounded text rendering of those records.
pub mod traits;
