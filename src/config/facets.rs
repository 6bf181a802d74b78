use crate::pipeline::PipelineParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config consumed by the `pbn-facets` binary. Relative paths are resolved
/// against the directory holding the config file.
#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub params: PipelineParams,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let mut config: RuntimeConfig = serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    config.input = resolve_path(base_dir, &config.input);
    config.output = resolve_path(base_dir, &config.output);
    Ok(config)
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
