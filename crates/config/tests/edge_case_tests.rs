//! Edge case and error scenario tests

use castsync_config::{Config, ConfigManager, WriteFailurePolicy};
use std::fs;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_corrupted_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let (_temp_dir, manager) = setup_test_manager()?;

    fs::write(manager.config_path(), "this is not valid TOML {{{")?;

    assert!(manager.load().is_err());
    assert_eq!(manager.load_or_default(), Config::default());

    Ok(())
}

#[test]
fn test_save_creates_parent_directories() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let nested_path = temp_dir.path().join("a").join("b").join("c");
    let manager = ConfigManager::with_directory(nested_path)?;

    manager.save(&Config::default())?;
    assert!(manager.config_path().exists());

    Ok(())
}

#[test]
fn test_concurrent_config_loads() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().to_path_buf();
    let manager = ConfigManager::with_directory(config_dir.clone())?;
    manager.initialize()?;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let dir = config_dir.clone();
            std::thread::spawn(move || {
                let mgr = ConfigManager::with_directory(dir).ok()?;
                (0..10).map(|_| mgr.load().ok()).collect::<Option<Vec<_>>>()
            })
        })
        .collect();

    for handle in handles {
        let loads = handle.join().expect("loader thread panicked");
        assert!(loads.is_some_and(|configs| configs.iter().all(|c| *c == Config::default())));
    }

    Ok(())
}

#[test]
fn test_boundary_values_validation() {
    let mut config = Config::default();

    config.merge.duplicate_duration_tolerance_secs = 1;
    config.merge.duplicate_date_tolerance_hours = 0;
    assert!(config.validate().is_ok());

    config.merge.duplicate_duration_tolerance_secs = 3600;
    config.merge.duplicate_date_tolerance_hours = 168;
    assert!(config.validate().is_ok());

    config.merge.duplicate_date_tolerance_hours = 169;
    assert!(config.validate().is_err());
}

#[test]
fn test_rapid_saves() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    let mut config = Config::default();

    for i in 0..100 {
        config.merge.duplicate_date_tolerance_hours = i;
        manager.save(&config)?;
    }

    assert_eq!(manager.load()?.merge.duplicate_date_tolerance_hours, 99);
    Ok(())
}

#[test]
fn test_config_file_deleted_during_operation() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.initialize()?;

    fs::remove_file(manager.config_path())?;

    assert_eq!(manager.load_or_default(), Config::default());
    Ok(())
}

#[test]
fn test_empty_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    fs::write(manager.config_path(), "")?;

    assert!(manager.load().is_err());
    assert_eq!(manager.load_or_default(), Config::default());
    Ok(())
}

#[test]
fn test_partial_config_toml() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let partial_toml = r#"
version = 1

[merge]
write_failure_policy = "log_and_continue"
"#;
    fs::write(manager.config_path(), partial_toml)?;

    let config = manager.load()?;
    assert_eq!(
        config.merge.write_failure_policy,
        WriteFailurePolicy::LogAndContinue
    );
    assert_eq!(config.merge.duplicate_duration_tolerance_secs, 600);
    assert!(!config.sync.enabled);

    Ok(())
}

#[test]
fn test_unknown_policy_is_parse_error() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    fs::write(
        manager.config_path(),
        "[merge]\nwrite_failure_policy = \"shrug\"\n",
    )?;

    assert!(manager.load().is_err());
    Ok(())
}

#[test]
fn test_update_with_invalid_value() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.initialize()?;

    let result = manager.update(|config| {
        config.merge.duplicate_duration_tolerance_secs = 0;
    });
    assert!(result.is_err());

    let config = manager.load()?;
    assert_eq!(config.merge.duplicate_duration_tolerance_secs, 600);

    Ok(())
}

#[test]
fn test_backup_preserved_on_failed_save() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let mut config = Config::default();
    config.merge.duplicate_date_tolerance_hours = 12;
    manager.save(&config)?;
    manager.save(&config)?;

    config.merge.duplicate_date_tolerance_hours = 1000;
    assert!(manager.save(&config).is_err());

    let backup_path = manager.config_path().with_extension("toml.backup");
    let backup_config: Config = toml::from_str(&fs::read_to_string(&backup_path)?)?;
    assert_eq!(backup_config.merge.duplicate_date_tolerance_hours, 12);

    Ok(())
}
