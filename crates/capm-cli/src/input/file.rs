use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let (canonical, contents) = read_contents(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}' as JSON: {}", canonical.display(), e).into())
}

/// Read a YAML or JSON file, chosen by extension (`.json` is JSON, anything
/// else is parsed as YAML).
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    if has_extension(path, "json") {
        return read_json(path);
    }
    let (canonical, contents) = read_contents(path)?;
    serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}' as YAML: {}", canonical.display(), e).into())
}

pub fn has_extension(path: &str, ext: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Absolute path of an existing regular file; relative paths resolve against
/// the working directory.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let resolved = std::env::current_dir()?.join(path);
    if !resolved.is_file() {
        let reason = if resolved.exists() { "not a file" } else { "no such file" };
        return Err(format!("Cannot read '{}': {}", resolved.display(), reason).into());
    }
    Ok(resolved)
}

fn read_contents(path: &str) -> Result<(PathBuf, String), Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    Ok((resolved, contents))
}
