//! Reading and writing `config.toml`
//!
//! A missing file means defaults. Saving refuses invalid configs, copies
//! the current file to `config.toml.backup` and replaces it through a
//! temp file in the same directory, so readers never see a partial file.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The config file on disk
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the file, or defaults when there is none
    ///
    /// Values out of range are loaded anyway and only logged; `save`
    /// is where they get rejected.
    pub fn load(&self) -> ConfigResult<Config> {
        let Some(text) = self.read_text()? else {
            log::info!(
                "No config at {}, running with defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        };

        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "{} has format version {}, this build understands up to {}",
                self.config_path.display(),
                config.version,
                CONFIG_VERSION
            );
        }
        if let Err(errors) = config.validate() {
            for error in &errors {
                log::warn!("Config value out of range: {}", error);
            }
        }

        Ok(config)
    }

    /// Validates `config` and replaces the file with it
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let text = toml::to_string_pretty(config)?;

        let dir = self.directory();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            log::info!("Created {}", dir.display());
        }

        if self.config_path.exists() {
            let backup = self.config_path.with_extension("toml.backup");
            fs::copy(&self.config_path, &backup)
                .map_err(|source| ConfigError::Backup { path: backup.clone(), source })?;
            log::debug!("Previous config kept at {}", backup.display());
        }

        self.replace_with(&text)?;
        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Writes a config holding only defaults
    pub fn generate_default(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// File contents, `None` if the file does not exist
    fn read_text(&self) -> ConfigResult<Option<String>> {
        if !self.config_path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.config_path).map_err(|source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        })?;
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.config_path.clone(),
            });
        }
        Ok(Some(text))
    }

    fn directory(&self) -> &Path {
        self.config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn replace_with(&self, text: &str) -> ConfigResult<()> {
        let write_error = |source: std::io::Error| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(self.directory()).map_err(write_error)?;
        staged.write_all(text.as_bytes()).map_err(write_error)?;
        staged.flush().map_err(write_error)?;
        staged
            .persist(&self.config_path)
            .map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigPersistence) {
        let dir = TempDir::new().expect("temp dir");
        let persistence = ConfigPersistence::new(dir.path().join("config.toml"));
        (dir, persistence)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (_dir, persistence) = config_file();
        assert_eq!(persistence.load().expect("load"), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, persistence) = config_file();
        let mut config = Config::default();
        config.merge.duplicate_date_tolerance_hours = 72;
        config.sync.enabled = true;

        persistence.save(&config).expect("save");
        assert_eq!(persistence.load().expect("load"), config);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");
        ConfigPersistence::new(path.clone())
            .save(&Config::default())
            .expect("save");
        assert!(path.exists());
    }

    #[test]
    fn test_second_save_keeps_backup() {
        let (_dir, persistence) = config_file();
        let mut config = Config::default();
        persistence.save(&config).expect("first save");

        config.sync.enabled = true;
        persistence.save(&config).expect("second save");

        let backup = persistence.config_path().with_extension("toml.backup");
        let previous: Config =
            toml::from_str(&fs::read_to_string(backup).expect("backup")).expect("toml");
        assert!(!previous.sync.enabled);
    }

    #[test]
    fn test_blank_file_is_rejected() {
        let (_dir, persistence) = config_file();
        fs::write(persistence.config_path(), "   \n").expect("write");
        assert!(matches!(persistence.load(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let (_dir, persistence) = config_file();
        fs::write(persistence.config_path(), "this is not valid TOML {{{").expect("write");
        assert!(matches!(persistence.load(), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_out_of_range_values_load_but_do_not_save() {
        let (_dir, persistence) = config_file();
        fs::write(
            persistence.config_path(),
            "[merge]\nduplicate_duration_tolerance_secs = 0\n",
        )
        .expect("write");

        let config = persistence.load().expect("load");
        assert_eq!(config.merge.duplicate_duration_tolerance_secs, 0);

        match persistence.save(&config) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors[0].field, "merge.duplicate_duration_tolerance_secs")
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_generate_default() {
        let (_dir, persistence) = config_file();
        persistence.generate_default().expect("generate");
        assert_eq!(persistence.load().expect("load"), Config::default());
    }
}
