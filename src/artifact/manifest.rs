//! The packaging manifest emitted by the DevTools build.
//!
//! `gen/input_grd_files.json` lists every generated file meant for packaging
//! into Chrome. Those are exactly the files the debugger-frontend package
//! ships.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::SyncError;

/// Manifest location relative to the build output directory.
pub const MANIFEST_PATH: &str = "gen/input_grd_files.json";

/// Read and validate the manifest of `build_path`.
pub fn read_manifest(build_path: &Path) -> Result<Vec<PathBuf>> {
    let path = build_path.join(MANIFEST_PATH);
    let text = fs::read_to_string(&path)
        .with_context(|| format!("reading build manifest '{}'", path.display()))?;
    parse_manifest(&path, &text)
}

fn parse_manifest(path: &Path, text: &str) -> Result<Vec<PathBuf>> {
    let entries: Vec<String> =
        serde_json::from_str(text).map_err(|err| SyncError::MalformedManifest {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    entries
        .into_iter()
        .map(|entry| validate_entry(path, entry))
        .collect()
}

fn validate_entry(path: &Path, entry: String) -> Result<PathBuf> {
    let rel = PathBuf::from(&entry);
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if entry.is_empty() || escapes {
        return Err(SyncError::MalformedManifest {
            path: path.to_path_buf(),
            reason: format!("entry '{entry}' is not a relative path inside the build"),
        }
        .into());
    }
    Ok(rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_relative_entries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("gen")).unwrap();
        fs::write(
            temp.path().join(MANIFEST_PATH),
            r#"["front_end/entrypoints/rn_fusebox/rn_fusebox.html", "front_end/core/i18n/locales/en-US.json"]"#,
        )
        .unwrap();

        let files = read_manifest(temp.path()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("front_end/entrypoints/rn_fusebox/rn_fusebox.html"),
                PathBuf::from("front_end/core/i18n/locales/en-US.json"),
            ]
        );
    }

    #[test]
    fn test_missing_manifest_fails() {
        let temp = TempDir::new().unwrap();
        assert!(read_manifest(temp.path()).is_err());
    }

    #[test]
    fn test_non_array_manifest_is_malformed() {
        let err = parse_manifest(Path::new("m.json"), r#"{"files": []}"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::MalformedManifest { .. })
        ));
    }

    #[test]
    fn test_escaping_entries_are_rejected() {
        assert!(parse_manifest(Path::new("m.json"), r#"["../../etc/passwd"]"#).is_err());
        assert!(parse_manifest(Path::new("m.json"), r#"["/abs/file.js"]"#).is_err());
        assert!(parse_manifest(Path::new("m.json"), r#"[""]"#).is_err());
    }
}
