//! Parser and graph analysis for branching dialogue scripts.
//!
//! ```text
//! # title: The Lab
//!
//! @node start
//! > Ann: Hello, {name}.
//! $ set visits = 1
//! ? Where to?
//! - The lab [hasKey] -> lab
//! - Home -> home
//!
//! @node lab
//! ```
//!
//! [`parse`] turns source text into a [`Script`] whose jumps and choice
//! targets all resolve; the analysis functions then answer questions about
//! the resulting graph without ever failing.

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
use pyo3::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod analysis;
mod ast;
#[cfg_attr(
    not(any(feature = "python", target_arch = "wasm32")),
    allow(dead_code)
)]
mod bridge;
mod builder;
mod emitter;
mod error;
mod json;
mod parser;
mod types;
mod validate;
mod vars;

pub use analysis::{
    extract_variables, find_paths, find_unreachable_nodes, flow_edges, get_script_stats,
    is_node_reachable, EdgeKind, FlowEdge,
};
pub use builder::{OrphanLines, ParseOptions, Parser};
pub use emitter::{script_template, to_source};
pub use error::{ErrorKind, ParseError, ScriptError};
pub use json::{deserialize_script, serialize_script};
pub use types::{
    ChoiceOption, Line, Metadata, Node, Script, ScriptStats, ValidationReport, VarType,
    START_NODE,
};
pub use validate::validate;
pub use vars::{interpolate_variables, stringify, validate_variable_types, Variables};

#[cfg(any(feature = "python", target_arch = "wasm32"))]
use bridge::*;

/// Parse script source with default options.
pub fn parse(text: &str) -> Result<Script, ParseError> {
    Parser::new().parse(text)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
fn to_py_err(e: ScriptError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn parse_script(text: String) -> PyResult<String> {
    parse_to_json(&text).map_err(to_py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn script_stats(text: String) -> PyResult<String> {
    stats_to_json(&text).map_err(to_py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn script_paths(text: String, target: String) -> PyResult<String> {
    paths_to_json(&text, &target).map_err(to_py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn unreachable_nodes(text: String) -> PyResult<String> {
    unreachable_to_json(&text).map_err(to_py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn interpolate(text: String, vars_json: String) -> PyResult<String> {
    interpolate_with_json(&text, &vars_json).map_err(to_py_err)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn parse_script_wasm(text: &str) -> Result<String, JsValue> {
    parse_to_json(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn script_stats_wasm(text: &str) -> Result<String, JsValue> {
    stats_to_json(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn find_paths_wasm(text: &str, target: &str) -> Result<String, JsValue> {
    paths_to_json(text, target).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn unreachable_nodes_wasm(text: &str) -> Result<String, JsValue> {
    unreachable_to_json(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn interpolate_wasm(text: &str, vars_json: &str) -> Result<String, JsValue> {
    interpolate_with_json(text, vars_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pymodule]
fn vns_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_script, m)?)?;
    m.add_function(wrap_pyfunction!(script_stats, m)?)?;
    m.add_function(wrap_pyfunction!(script_paths, m)?)?;
    m.add_function(wrap_pyfunction!(unreachable_nodes, m)?)?;
    m.add_function(wrap_pyfunction!(interpolate, m)?)?;
    Ok(())
}
