/*!
 * Tests for configuration files and resolution
 */

use anyhow::Result;

use cuebatch::app_config::Config;
use cuebatch::translation::TuningParams;
use crate::common;

#[test]
fn test_config_saveThenLoad_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = common::test_config(temp_dir.path());
    config.max_blocks = Some(5);
    config.fast_mode = true;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn test_config_fromPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", r#"{"target_language": "es"}"#)?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.target_language, "es");
    assert_eq!(config.source_language, "auto");
    assert!(config.deep_grouping);
    assert!(config.cache_enabled);
    assert_eq!(config.cache_group_threshold, 0.6);
    Ok(())
}

#[test]
fn test_config_fromInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_config_resolve_withExplicitLimits_shouldOverrideTuning() {
    let config = Config {
        max_chars: Some(900),
        concurrency: Some(2),
        ..Config::default()
    };

    let settings = config.resolve(&TuningParams::default());

    assert_eq!(settings.limits.max_chars, 900);
    assert_eq!(settings.concurrency, 2);
    assert_eq!(settings.limits.max_blocks, TuningParams::default().max_blocks);
}
