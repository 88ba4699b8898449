//! Error taxonomy for parsing, assembling and integrating derivative equations.
use thiserror::Error;

/// Every failure aborts the solve in progress; none of them are retried and
/// no partial state is returned alongside them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OdeError {
    /// The left-hand side is not of the form `y'''=` or the right-hand side
    /// falls outside the expression grammar.
    #[error("Malformed equation '{input}': {reason}")]
    MalformedEquation { input: String, reason: String },

    /// An initial condition reads a state component that has no value yet.
    #[error(
        "Initial condition '{input}' references component {component} before it is resolved."
    )]
    UnresolvedInitialCondition { input: String, component: usize },

    /// Equation orders are missing, duplicated, or exceed the system size.
    #[error("System assembly failed: {0}")]
    SystemAssembly(String),

    /// A step produced NaN. Usually the equations do not match the supplied
    /// initial conditions.
    #[error(
        "Component {component} became NaN at iteration {iteration}; write the equation in terms of \
         its highest-order derivative and supply one initial condition per lower order."
    )]
    NumericDivergence { component: usize, iteration: usize },

    #[error("Invalid integration settings: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, OdeError>;

#[cfg(test)]
mod tests {
    use super::OdeError;

    #[test]
    fn messages_carry_diagnostic_context() {
        let err = OdeError::MalformedEquation {
            input: "z'=1".to_string(),
            reason: "expected 'y'".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed equation 'z'=1': expected 'y'");

        let err = OdeError::NumericDivergence {
            component: 2,
            iteration: 7,
        };
        let message = err.to_string();
        assert!(message.contains("Component 2"));
        assert!(message.contains("iteration 7"));

        let err = OdeError::UnresolvedInitialCondition {
            input: "y'=y''".to_string(),
            component: 2,
        };
        assert!(err.to_string().contains("component 2"));
    }
}
