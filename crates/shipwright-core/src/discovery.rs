//! Configuration discovery
//!
//! Finds ship.kdl by environment variable override first, then by walking
//! up from the current directory.

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Configuration file name.
pub const CONFIG_FILENAME: &str = "ship.kdl";

/// Environment variable overriding the configuration root.
pub const CONFIG_ROOT_ENV: &str = "SHIP_CONFIG_ROOT";

/// Locate the directory containing ship.kdl.
///
/// Search order:
/// 1. `SHIP_CONFIG_ROOT` environment variable
/// 2. upward search from the current directory
pub fn find_config_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(CONFIG_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking SHIP_CONFIG_ROOT");
        if path.join(CONFIG_FILENAME).exists() {
            info!(config_root = %path.display(), "Found config root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "SHIP_CONFIG_ROOT is set but contains no ship.kdl");
    }

    let start_dir = std::env::current_dir()?;
    find_config_root_from(&start_dir).ok_or(CoreError::ConfigRootNotFound(start_dir))
}

/// Walk up from `start_dir` looking for ship.kdl.
pub fn find_config_root_from(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    debug!(start_dir = %start_dir.display(), "Searching for {}", CONFIG_FILENAME);

    loop {
        if current.join(CONFIG_FILENAME).exists() {
            info!(config_root = %current.display(), "Found config root");
            return Some(current);
        }
        if !current.pop() {
            break;
        }
    }

    debug!("Config root not found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_config_root_from_with_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        std::fs::write(root.join(CONFIG_FILENAME), "// config").unwrap();

        let found = find_config_root_from(root);
        assert_eq!(found.as_deref(), Some(root));
    }

    #[test]
    fn test_find_config_root_from_subdirectory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();

        std::fs::write(root.join(CONFIG_FILENAME), "// config").unwrap();

        let sub_dir = root.join("demo").join("media");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let found = find_config_root_from(&sub_dir);
        assert_eq!(found.as_deref(), Some(root));
    }

    #[test]
    fn test_find_config_root_from_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(find_config_root_from(temp_dir.path()).is_none());
    }
}
