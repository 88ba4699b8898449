//! High-level entry point: options in, final state vector out.

use crate::error::{OdeError, Result};
use crate::integrator::{integrate, IntegrationConfig, Solution};
use crate::system::{build_system, EquationSystem};
use crate::trace::{TraceFormatter, TraceSettings, TraceStyle, MAX_PRECISION};
use serde::{Deserialize, Serialize};

/// Construction options, shaped like the JavaScript options object
/// (`initialConditions`, `t_o`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverOptions {
    pub equations: Vec<String>,
    pub initial_conditions: Vec<String>,
    pub h: f64,
    #[serde(rename = "t_o")]
    pub t_o: f64,
    pub iterations: usize,
    #[serde(default)]
    pub verbose: bool,
    /// Display precision for trace values. Defaults to 3 decimal places.
    #[serde(default)]
    pub precision: Option<u32>,
}

/// A parsed and assembled problem, ready to be solved any number of times.
#[derive(Debug, Clone)]
pub struct Solver {
    system: EquationSystem,
    config: IntegrationConfig,
    style: TraceStyle,
    settings: TraceSettings,
}

impl Solver {
    /// Parses and assembles eagerly; malformed input fails here, before any
    /// integration.
    pub fn new(options: SolverOptions) -> Result<Self> {
        let config = IntegrationConfig {
            step_size: options.h,
            start_time: options.t_o,
            iterations: options.iterations,
            verbose: options.verbose,
        };
        config.validate()?;
        if let Some(precision) = options.precision.filter(|&p| p > MAX_PRECISION) {
            return Err(OdeError::InvalidConfiguration(format!(
                "precision must be at most {} decimal places, got {}.",
                MAX_PRECISION, precision
            )));
        }

        let system = build_system(&options.equations, &options.initial_conditions, options.t_o)?;

        let mut settings = TraceSettings::default();
        if let Some(precision) = options.precision {
            settings.precision = precision;
        }

        Ok(Self {
            system,
            config,
            style: TraceStyle::for_equation_count(options.equations.len()),
            settings,
        })
    }

    pub fn system(&self) -> &EquationSystem {
        &self.system
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    pub fn style(&self) -> TraceStyle {
        self.style
    }

    /// Nominal final time `t_o + h * iterations`.
    pub fn final_time(&self) -> f64 {
        self.config.end_time()
    }

    /// Final state vector; component 0 is `y`, component 1 is `y'`, and so
    /// on. When verbose, each trace line is logged at info level.
    pub fn solve(&self) -> Result<Vec<f64>> {
        let solution = self.run(self.config.verbose)?;
        if let Some(trace) = &solution.trace {
            let formatter = self.formatter();
            for entry in trace {
                log::info!("{}", formatter.line(entry));
            }
        }
        Ok(solution.state)
    }

    /// Solves and always records the per-step trace, regardless of `verbose`.
    pub fn solve_with_trace(&self) -> Result<Solution> {
        self.run(true)
    }

    pub fn trace_lines(&self, solution: &Solution) -> Vec<String> {
        solution
            .trace
            .as_deref()
            .map(|entries| self.formatter().lines(entries))
            .unwrap_or_default()
    }

    fn run(&self, record_trace: bool) -> Result<Solution> {
        let config = IntegrationConfig {
            verbose: record_trace,
            ..self.config
        };
        integrate(&self.system, self.system.initial_state(), &config)
    }

    fn formatter(&self) -> TraceFormatter {
        TraceFormatter::new(
            self.style,
            self.settings,
            self.system.size(),
            self.config.step_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Solver, SolverOptions};
    use crate::error::OdeError;
    use crate::integrator::Solution;
    use crate::trace::{TraceStyle, MAX_PRECISION};

    fn options(equations: &[&str], initial_conditions: &[&str]) -> SolverOptions {
        SolverOptions {
            equations: equations.iter().map(|s| s.to_string()).collect(),
            initial_conditions: initial_conditions.iter().map(|s| s.to_string()).collect(),
            h: 0.1,
            t_o: 0.0,
            iterations: 20,
            verbose: false,
            precision: None,
        }
    }

    #[test]
    fn zero_equations_with_zero_conditions_stay_at_zero() {
        let cases: [(&[&str], &[&str]); 3] = [
            (&["y'=0"], &["y=0"]),
            (&["y'''=0"], &["y=0", "y'=0", "y''=0"]),
            (&["y'=0", "y''=0"], &["y'=0", "y=0"]),
        ];
        for (h, t_o, iterations) in [(0.1, 0.0, 20), (0.001, -3.0, 7), (2.5, 10.0, 0)] {
            for (equations, conditions) in cases {
                let mut opts = options(equations, conditions);
                opts.h = h;
                opts.t_o = t_o;
                opts.iterations = iterations;
                let state = Solver::new(opts).expect("solver").solve().expect("solve");
                assert!(!state.is_empty());
                assert!(state.iter().all(|&v| v == 0.0), "expected zeros, got {state:?}");
            }
        }
    }

    #[test]
    fn exponential_matches_closed_form() {
        let mut opts = options(&["y'=y"], &["y=1"]);
        opts.h = 0.01;
        opts.iterations = 100;
        let solver = Solver::new(opts).expect("solver");
        let state = solver.solve().expect("solve");
        assert_eq!(state.len(), 1);
        assert!((state[0] - std::f64::consts::E).abs() < 0.05);
        assert!((solver.final_time() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn harmonic_oscillator_tracks_cosine() {
        let mut opts = options(&["y''=0-y"], &["y=1", "y'=0"]);
        opts.h = 0.001;
        opts.iterations = 1000;
        let state = Solver::new(opts).expect("solver").solve().expect("solve");
        assert!((state[0] - 1.0_f64.cos()).abs() < 0.01);
        assert!((state[1] + 1.0_f64.sin()).abs() < 0.01);
    }

    #[test]
    fn solve_is_deterministic() {
        let solver =
            Solver::new(options(&["y'''=y''*y'*y+t"], &["y'=0", "y''=0", "y=0"])).expect("solver");
        let first = solver.solve().expect("solve");
        let second = solver.solve().expect("solve");
        let again = Solver::new(options(&["y'''=y''*y'*y+t"], &["y'=0", "y''=0", "y=0"]))
            .expect("solver")
            .solve()
            .expect("solve");
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(bits(&first), bits(&again));
    }

    #[test]
    fn under_determined_system_diverges() {
        let solver = Solver::new(options(&["y''=y"], &["y=1"])).expect("solver");
        let err = solver.solve().expect_err("should diverge");
        assert!(matches!(err, OdeError::NumericDivergence { .. }));
    }

    #[test]
    fn duplicate_orders_fail_construction() {
        let err = Solver::new(options(&["y'=1", "y'=t"], &["y=0"])).expect_err("should fail");
        assert!(matches!(err, OdeError::SystemAssembly(_)));
    }

    #[test]
    fn malformed_equation_fails_construction() {
        let err = Solver::new(options(&["z'=1"], &["y=0"])).expect_err("should fail");
        assert!(matches!(err, OdeError::MalformedEquation { ref input, .. } if input == "z'=1"));
    }

    #[test]
    fn invalid_step_size_fails_construction() {
        let mut opts = options(&["y'=1"], &["y=0"]);
        opts.h = 0.0;
        let err = Solver::new(opts).expect_err("should fail");
        assert!(matches!(err, OdeError::InvalidConfiguration(_)));
    }

    #[test]
    fn out_of_range_precision_fails_construction() {
        for precision in [MAX_PRECISION + 1, 400, u32::MAX] {
            let mut opts = options(&["y'=1"], &["y=0"]);
            opts.precision = Some(precision);
            let err = Solver::new(opts).expect_err("should fail");
            assert!(
                matches!(err, OdeError::InvalidConfiguration(ref msg) if msg.contains("precision")),
                "{err:?}"
            );
        }

        let mut opts = options(&["y'=1"], &["y=0"]);
        opts.precision = Some(MAX_PRECISION);
        opts.iterations = 1;
        let solver = Solver::new(opts).expect("solver");
        let solution = solver.solve_with_trace().expect("solve");
        assert_eq!(
            solver.trace_lines(&solution),
            vec!["[Iteration 1 | t=0] y  = y(n-1) + 0.1 * 1 = 0.1".to_string()]
        );
    }

    #[test]
    fn trace_lines_use_style_and_precision() {
        let mut opts = options(&["y''=1"], &["y=0", "y'=0"]);
        opts.h = 0.5;
        opts.iterations = 1;
        let solver = Solver::new(opts.clone()).expect("solver");
        assert_eq!(solver.style(), TraceStyle::HigherOrder);
        let solution = solver.solve_with_trace().expect("solve");
        assert_eq!(
            solver.trace_lines(&solution),
            vec![
                "[Iteration 1 | t=0] y   = y(n-1)  + 0.5 * 0 = 0".to_string(),
                "[Iteration 1 | t=0] y'  = y(n-1)' + 0.5 * 1 = 0.5".to_string(),
            ]
        );

        opts.equations = vec!["y'=y'".to_string(), "y''=1".to_string()];
        opts.precision = Some(1);
        let solver = Solver::new(opts).expect("solver");
        assert_eq!(solver.style(), TraceStyle::System);
        let solution = solver.solve_with_trace().expect("solve");
        assert_eq!(
            solver.trace_lines(&solution)[1],
            "[t=0] y_(2,1) = y_(2,0) + 0.5 * 1 = 0.5"
        );
    }

    #[test]
    fn trace_lines_are_empty_without_a_trace() {
        let solver = Solver::new(options(&["y'=1"], &["y=0"])).expect("solver");
        let solution = solver.solve_with_trace().expect("solve");
        assert_eq!(solution.trace.as_ref().map(Vec::len), Some(20));
        let untraced = Solution {
            trace: None,
            ..solution
        };
        assert!(solver.trace_lines(&untraced).is_empty());
    }

    #[test]
    fn options_decode_from_javascript_shape() {
        let json = r#"{
            "equations": ["y'''=y''*y'*y+t"],
            "initialConditions": ["y''=0", "y'=0", "y=0"],
            "h": 0.1,
            "t_o": 0,
            "iterations": 21,
            "verbose": true
        }"#;
        let opts: SolverOptions = serde_json::from_str(json).expect("decode");
        assert_eq!(opts.initial_conditions.len(), 3);
        assert_eq!(opts.t_o, 0.0);
        assert!(opts.verbose);
        assert_eq!(opts.precision, None);

        let solver = Solver::new(opts).expect("solver");
        let state = solver.solve().expect("solve");
        assert_eq!(state.len(), 3);
        assert!(state.iter().all(|v| v.is_finite()));
    }
}
