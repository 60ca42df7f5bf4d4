//! # Bootstrap Loader
//!
//! One-shot load of a `KEY=VALUE` env file into the configuration namespace
//! at process start, before the maintainer loop begins. Runs exactly once;
//! every later refresh comes from the parameters table.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ConfigStore;

/// A bootstrap file that exists but cannot be read. A missing file is not an
/// error; the daemon simply starts with built-in defaults.
#[derive(Debug, thiserror::Error)]
#[error("failed to read env file {path}: {detail}")]
pub struct BootstrapError {
    pub path: String,
    pub detail: String,
}

/// Load `path` into the namespace. Returns the number of entries applied.
///
/// Blank lines and `#` comments are skipped; a line without `=` or with an
/// empty key is warned about and skipped; single or double quotes around a
/// value are stripped. Last-writer-wins on duplicate keys, matching the
/// namespace contract.
pub fn load(path: &Path, config: &ConfigStore) -> Result<usize, BootstrapError> {
    if !path.exists() {
        info!(path = %path.display(), "env file not found");
        return Ok(0);
    }

    let contents = fs::read_to_string(path).map_err(|e| BootstrapError {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    info!(path = %path.display(), "env file loaded");

    let mut applied = 0;
    for (idx, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                let key = key.trim();
                let value = strip_quotes(value.trim());
                config.set(key, value);
                debug!(key, value, "read from env file");
                applied += 1;
            }
            _ => warn!(line = idx + 1, "skipping malformed env line"),
        }
    }

    Ok(applied)
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write env file");
        file
    }

    #[test]
    fn test_load_basic_entries() {
        let file = env_file("DB_HOST=localhost\nDB_PORT=3306\nLOG_LEVEL=10\n");
        let config = ConfigStore::new();

        let applied = load(file.path(), &config).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(config.get("DB_HOST").as_deref(), Some("localhost"));
        assert_eq!(config.get("DB_PORT").as_deref(), Some("3306"));
        assert_eq!(config.get("LOG_LEVEL").as_deref(), Some("10"));
    }

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let file = env_file("# connection\n\nDB_HOST=localhost\n   \n# end\n");
        let config = ConfigStore::new();

        assert_eq!(load(file.path(), &config).unwrap(), 1);
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let file = env_file("DB_HOST=localhost\nthis is not an entry\n=orphan\nDB_PORT=3306\n");
        let config = ConfigStore::new();

        assert_eq!(load(file.path(), &config).unwrap(), 2);
        assert_eq!(config.get("DB_HOST").as_deref(), Some("localhost"));
        assert_eq!(config.get("DB_PORT").as_deref(), Some("3306"));
    }

    #[test]
    fn test_load_strips_quotes_and_keeps_inner_equals() {
        let file = env_file("DB_PASSWORD=\"p=ss\"\nGREETING='hi there'\n");
        let config = ConfigStore::new();

        load(file.path(), &config).unwrap();

        assert_eq!(config.get("DB_PASSWORD").as_deref(), Some("p=ss"));
        assert_eq!(config.get("GREETING").as_deref(), Some("hi there"));
    }

    #[test]
    fn test_load_missing_file_is_ok_and_empty() {
        let config = ConfigStore::new();
        let applied = load(Path::new("/no/such/.env"), &config).unwrap();
        assert_eq!(applied, 0);
        assert!(config.is_empty());
    }

    #[test]
    fn test_load_last_writer_wins() {
        let file = env_file("LOG_LEVEL=20\nLOG_LEVEL=10\n");
        let config = ConfigStore::new();

        assert_eq!(load(file.path(), &config).unwrap(), 2);
        assert_eq!(config.get("LOG_LEVEL").as_deref(), Some("10"));
    }
}
