//! Variable interpolation for configuration values.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolateError {
    #[error("unclosed variable reference: ${{{0}")]
    Unclosed(String),
    #[error("environment variable '{0}' is not set")]
    Unset(String),
    #[error("environment variable '{0}' refers to itself through other variables")]
    Cycle(String),
}

/// Expand `${VAR}` and `${VAR:-fallback}` references in `s`.
///
/// `vars` is consulted before the process environment. A reference without a
/// fallback to a variable that is set nowhere is an error.
pub fn interpolate(s: &str, vars: &HashMap<String, String>) -> Result<String, InterpolateError> {
    interpolate_with(s, |name| {
        Ok(vars.get(name).cloned().or_else(|| std::env::var(name).ok()))
    })
}

/// Expand every value of `vars`, letting values refer to each other.
///
/// References are resolved in dependency order. A value that refers to its
/// own name (`PATH: /opt/bin:${PATH}`) reads the process environment for it.
pub fn interpolate_all(
    vars: &HashMap<String, String>,
) -> Result<HashMap<String, String>, InterpolateError> {
    let mut resolved = HashMap::with_capacity(vars.len());
    let mut pending = Vec::new();
    for (name, raw) in vars {
        resolve(name, raw, vars, &mut resolved, &mut pending)?;
    }
    Ok(resolved)
}

fn resolve(
    name: &str,
    raw: &str,
    vars: &HashMap<String, String>,
    resolved: &mut HashMap<String, String>,
    pending: &mut Vec<String>,
) -> Result<String, InterpolateError> {
    if let Some(value) = resolved.get(name) {
        return Ok(value.clone());
    }
    if pending.iter().any(|p| p == name) {
        return Err(InterpolateError::Cycle(name.to_string()));
    }
    pending.push(name.to_string());
    let value = interpolate_with(raw, |reference| match vars.get(reference) {
        Some(other) if reference != name => {
            resolve(reference, other, vars, resolved, pending).map(Some)
        }
        _ => Ok(std::env::var(reference).ok()),
    })?;
    pending.pop();

    resolved.insert(name.to_string(), value.clone());
    Ok(value)
}

/// Expand references in `s`, asking `lookup` for each variable's value.
fn interpolate_with<F>(s: &str, mut lookup: F) -> Result<String, InterpolateError>
where
    F: FnMut(&str) -> Result<Option<String>, InterpolateError>,
{
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(InterpolateError::Unclosed(after.to_string()));
        };
        let reference = &after[..end];
        let (name, fallback) = match reference.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (reference, None),
        };
        let value = lookup(name)?
            .or_else(|| fallback.map(str::to_string))
            .ok_or_else(|| InterpolateError::Unset(name.to_string()))?;
        result.push_str(&value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}
