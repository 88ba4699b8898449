//! WASM wrapper around the core solver.

use anyhow::Context;
use ode_core::solver::{Solver, SolverOptions};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(line: &str);
}

/// JavaScript-facing solver, constructed from the options object
/// `{ equations, initialConditions, h, t_o, iterations, verbose }`.
#[wasm_bindgen]
pub struct WasmOde {
    solver: Solver,
}

impl WasmOde {
    pub(crate) fn from_options(options: SolverOptions) -> anyhow::Result<Self> {
        let solver = Solver::new(options).context("Failed to construct ODE")?;
        Ok(Self { solver })
    }

    /// Final state plus the rendered trace lines (empty unless verbose).
    pub(crate) fn run(&self) -> anyhow::Result<(Vec<f64>, Vec<String>)> {
        if !self.solver.config().verbose {
            let state = self.solver.solve().context("Failed to solve ODE")?;
            return Ok((state, Vec::new()));
        }
        let solution = self
            .solver
            .solve_with_trace()
            .context("Failed to solve ODE")?;
        let lines = self.solver.trace_lines(&solution);
        Ok((solution.state, lines))
    }
}

#[wasm_bindgen]
impl WasmOde {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<WasmOde, JsValue> {
        console_error_panic_hook::set_once();

        let options: SolverOptions = from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid ODE options: {}", e)))?;
        Self::from_options(options).map_err(to_js_error)
    }

    /// Integrates and returns the final state, `y` first. With `verbose`
    /// set, every trace line is also written to the console.
    pub fn solve(&self) -> Result<Vec<f64>, JsValue> {
        let (state, lines) = self.run().map_err(to_js_error)?;
        for line in &lines {
            console_log(line);
        }
        Ok(state)
    }

    /// Structured per-step records, regardless of `verbose`.
    pub fn trace(&self) -> Result<JsValue, JsValue> {
        let solution = self
            .solver
            .solve_with_trace()
            .context("Failed to solve ODE")
            .map_err(to_js_error)?;
        to_value(&solution.trace.unwrap_or_default())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = traceLines)]
    pub fn trace_lines(&self) -> Result<Vec<String>, JsValue> {
        let solution = self
            .solver
            .solve_with_trace()
            .context("Failed to solve ODE")
            .map_err(to_js_error)?;
        Ok(self.solver.trace_lines(&solution))
    }

    #[wasm_bindgen(getter)]
    pub fn order(&self) -> usize {
        self.solver.system().size()
    }

    #[wasm_bindgen(getter, js_name = finalTime)]
    pub fn final_time(&self) -> f64 {
        self.solver.final_time()
    }
}

fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}
