use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{CliError, CliResult};

/// Write `value` as pretty JSON to `out`, or to stdout when `out` is `None`.
pub fn emit_json<T: Serialize>(out: Option<&Path>, value: &T) -> CliResult<()> {
    let mut data = serde_json::to_vec_pretty(value)?;
    data.push(b'\n');
    emit_bytes(out, &data)
}

pub fn emit_text(out: Option<&Path>, text: &str) -> CliResult<()> {
    emit_bytes(out, text.as_bytes())
}

fn emit_bytes(out: Option<&Path>, data: &[u8]) -> CliResult<()> {
    match out {
        Some(path) => {
            write_bytes_atomic(path, data)?;
            tracing::info!(path = %path.display(), bytes = data.len(), "output written");
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Write through a sibling temp file renamed into place.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> CliResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::InvalidConfig(format!("invalid output path {}", path.display())))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> CliResult<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|err| CliError::Input(format!("{}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_content() {
        let dir = std::env::temp_dir().join(format!("schemashift-out-{}", std::process::id()));
        let path = dir.join("nested/plan.json");

        write_bytes_atomic(&path, b"first").unwrap();
        write_bytes_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_file_name("plan.json.tmp").exists());

        let value = read_json(&{
            let json = dir.join("value.json");
            write_bytes_atomic(&json, br#"{"schemas": []}"#).unwrap();
            json
        })
        .unwrap();
        assert_eq!(value["schemas"], serde_json::json!([]));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_input_names_the_path() {
        let err = read_json(Path::new("/nonexistent/realm.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/realm.json"));
    }
}
