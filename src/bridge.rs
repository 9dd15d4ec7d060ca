//! JSON-in, JSON-out helpers shared by the Python and wasm entry points.

use crate::{
    find_paths, find_unreachable_nodes, get_script_stats, interpolate_variables, parse,
    serialize_script, ScriptError, Variables,
};

pub(crate) fn parse_to_json(text: &str) -> Result<String, ScriptError> {
    serialize_script(&parse(text)?)
}

pub(crate) fn stats_to_json(text: &str) -> Result<String, ScriptError> {
    let script = parse(text)?;
    Ok(serde_json::to_string_pretty(&get_script_stats(&script))?)
}

pub(crate) fn paths_to_json(text: &str, target: &str) -> Result<String, ScriptError> {
    let script = parse(text)?;
    Ok(serde_json::to_string(&find_paths(&script, target))?)
}

pub(crate) fn unreachable_to_json(text: &str) -> Result<String, ScriptError> {
    let script = parse(text)?;
    Ok(serde_json::to_string(&find_unreachable_nodes(&script))?)
}

pub(crate) fn interpolate_with_json(text: &str, vars_json: &str) -> Result<String, ScriptError> {
    let vars: Variables = serde_json::from_str(vars_json)?;
    Ok(interpolate_variables(text, &vars))
}

