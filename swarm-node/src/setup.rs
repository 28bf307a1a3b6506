use std::path::Path;

use tracing::info;

use swarm_common::Result;

use crate::config::SwarmConfig;

/// Writes a default config at `path` unless one already exists.
pub fn ensure_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        info!("⚠️ Config not found. Writing defaults to {}...", path.display());
        SwarmConfig::default().save_to_file(path)?;
        info!("✅ Config generated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_config_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        ensure_config(&path).unwrap();
        assert!(path.exists());

        std::fs::write(&path, r#"{ "seed": 99 }"#).unwrap();
        ensure_config(&path).unwrap();
        assert_eq!(SwarmConfig::load_from_file(&path).unwrap().seed, 99);
    }
}
