//! WASM bridge exposing the Euler ODE solver to JavaScript hosts.

mod solver;

pub use solver::WasmOde;
