use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use regex::Regex;
use once_cell::sync::Lazy;

// @module: File and directory utilities

// @const: Matches files produced by a previous run, e.g. `movie_fr.srt` or `movie_zh-TW.srt`
static TRANSLATED_OUTPUT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*_[a-z]{2}(?:-[A-Za-z]{2})?\.srt$").expect("output regex is valid")
});

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @generates: Output path for translated subtitle, next to the input
    // @params: input_file, target_language
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('_');
        output_filename.push_str(target_language);
        output_filename.push_str(".srt");

        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }

    /// Whether a path looks like the output of an earlier run
    pub fn is_translated_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_name()
            .map(|name| TRANSLATED_OUTPUT_REGEX.is_match(&name.to_string_lossy()))
            .unwrap_or(false)
    }

    /// Find SRT files directly inside a directory, sorted by name
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case("srt") {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Pick the subtitle to translate from a directory.
    ///
    /// Prefers the first file that is not itself a translated output; falls
    /// back to the first SRT at all.
    pub fn select_source_subtitle<P: AsRef<Path>>(dir: P) -> Result<Option<PathBuf>> {
        let files = Self::find_subtitle_files(dir)?;
        let source = files
            .iter()
            .find(|p| !Self::is_translated_output(p))
            .or_else(|| files.first())
            .cloned();
        Ok(source)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }
}
