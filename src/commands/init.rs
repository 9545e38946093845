//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Write a default configuration under `base_dir` (or `~/.paperdesk`)
pub fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.config_file.display().to_string(),
        ));
    }

    config.validate()?;
    config.save()?;
    info!("Initialized paperdesk at {:?}", config.paths.base_dir);

    Ok(config)
}

/// Print the result of `init` to console
pub fn print_init(config: &Config) {
    println!("✓ paperdesk initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("  Backend: {}", config.backend.url);
    println!("\nNext steps:");
    println!("  1. Point backend.url at your answering service");
    println!("  2. Check it is reachable: paperdesk health");
    println!("  3. Ask away: paperdesk ask -f paper.pdf \"What is the main result?\"");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let config = cmd_init(Some(dir.path().to_path_buf()), false).unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.backend.url, config.backend.url);
        assert_eq!(loaded.session.default_source, config.session.default_source);
    }

    #[test]
    fn test_init_refuses_existing_without_force() {
        let dir = TempDir::new().unwrap();
        cmd_init(Some(dir.path().to_path_buf()), false).unwrap();

        let err = cmd_init(Some(dir.path().to_path_buf()), false).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized(_)));

        assert!(cmd_init(Some(dir.path().to_path_buf()), true).is_ok());
    }
}
