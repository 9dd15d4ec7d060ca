use crate::error::ScriptError;
use crate::types::{RawScript, Script};

/// Pretty JSON form of a script. Node and line order are preserved.
pub fn serialize_script(script: &Script) -> Result<String, ScriptError> {
    Ok(serde_json::to_string_pretty(script)?)
}

/// Rebuild a script from [`serialize_script`] output. The result is checked
/// the same way a parsed script is.
pub fn deserialize_script(json: &str) -> Result<Script, ScriptError> {
    let raw: RawScript = serde_json::from_str(json)?;
    Ok(Script::try_from(raw)?)
}
