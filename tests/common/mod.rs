/*!
 * Common test utilities for the cuebatch test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use cuebatch::app_config::Config;
use cuebatch::subtitle_processor::Cue;

/// Sample file: markup, a blank cue, a repeated line and a long pause
pub const SAMPLE_SRT: &str = r#"1
00:00:01,000 --> 00:00:03,000
<i>Hello there.</i>

2
00:00:03,500 --> 00:00:05,000
How are you?

3
00:00:05,200 --> 00:00:06,000


4
00:00:06,500 --> 00:00:08,000
Hello there.

5
00:00:30,000 --> 00:00:32,000
See you tomorrow.
"#;

/// Initialize test logging once; output only shows for failing tests
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates the sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Configuration with the persistent cache inside `dir`
pub fn test_config(dir: &Path) -> Config {
    Config {
        source_language: "en".to_string(),
        target_language: "fr".to_string(),
        cache_path: Some(dir.join("cache").join("translate_cache.sqlite")),
        ..Config::default()
    }
}

/// Back-to-back one second cues
pub fn cues_from(texts: &[&str]) -> Vec<Cue> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| Cue::new(i, i as u64 * 1000, i as u64 * 1000 + 900, *t))
        .collect()
}
