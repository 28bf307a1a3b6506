use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Saves audit data to a JSON file in pretty format.
///
/// # Parameters
/// - `path`: The path to the file where the data will be written.
/// - `data`: The audit snapshot to be saved.
pub fn save_audit<T: Serialize, P: AsRef<Path>>(path: P, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads audit data from a JSON file.
pub fn load_audit<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        decisions: BTreeMap<u64, u32>,
        view_changes: Vec<u64>,
    }

    #[test]
    fn test_save_and_load_audit_data() {
        let mut decisions = BTreeMap::new();
        decisions.insert(0, 12);
        decisions.insert(1, 13);
        let data = Snapshot { decisions, view_changes: vec![40] };

        let file = NamedTempFile::new().expect("Failed to create temp file");
        save_audit(file.path(), &data).expect("Failed to save audit");

        let loaded: Snapshot = load_audit(file.path()).expect("Failed to load audit");
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_audit::<Snapshot, _>("/nonexistent/audit.json").unwrap_err();
        assert!(matches!(err, crate::SwarmError::Io(_)));
    }
}
