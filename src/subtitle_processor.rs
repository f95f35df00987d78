use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::SubtitleError;

// @module: SRT cue source and sink

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp regex is valid")
});

// @struct: Single timed text cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Position in the file, 0-based
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Cue text, possibly multi-line, possibly blank
    pub text: String,
}

impl Cue {
    /// Creates a new cue
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Whether the cue has no translatable text
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of characters in the cue text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index + 1)?;
        writeln!(
            f,
            "{} --> {}",
            Self::format_timestamp(self.start_ms),
            Self::format_timestamp(self.end_ms)
        )?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// An ordered sequence of cues loaded from (and saved to) an SRT file
#[derive(Debug, Clone)]
pub struct SubtitleFile {
    /// Source filename
    pub source_file: PathBuf,

    /// Cues in file order
    pub cues: Vec<Cue>,
}

impl SubtitleFile {
    /// Create a subtitle file from cues already in memory
    pub fn new(source_file: PathBuf, cues: Vec<Cue>) -> Self {
        SubtitleFile { source_file, cues }
    }

    /// Read and parse an SRT file
    pub fn read_srt<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SubtitleError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let cues = Self::parse_srt_string(&content)?;
        debug!("Loaded {} cues from {:?}", cues.len(), path);

        Ok(SubtitleFile {
            source_file: path.to_path_buf(),
            cues,
        })
    }

    /// Write cues to an SRT file, renumbering them sequentially.
    ///
    /// The content is rendered fully before the file is touched, so a failure
    /// never leaves a half-written output behind.
    pub fn write_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        let write_error = |e: std::io::Error| SubtitleError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_error)?;
            }
        }

        fs::write(path, self.to_srt_string()).map_err(write_error)
    }

    /// Render all cues in SRT format
    pub fn to_srt_string(&self) -> String {
        self.cues.iter().map(|cue| cue.to_string()).collect()
    }

    /// Parse SRT content into cues.
    ///
    /// Unlike most SRT readers, blocks without text are kept as blank cues so
    /// they can be passed through a translation run unchanged.
    pub fn parse_srt_string(content: &str) -> Result<Vec<Cue>, SubtitleError> {
        let content = content.trim_start_matches('\u{feff}');
        let lines: Vec<&str> = content.lines().collect();
        let mut cues = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].trim().is_empty() {
                i += 1;
                continue;
            }

            // Sequence numbers are optional, the timestamp line is not
            let timing_line = if TIMESTAMP_REGEX.is_match(lines[i]) {
                i
            } else if lines[i].trim().parse::<usize>().is_ok()
                && i + 1 < lines.len()
                && TIMESTAMP_REGEX.is_match(lines[i + 1])
            {
                i + 1
            } else {
                return Err(SubtitleError::Parse {
                    line: i + 1,
                    message: format!("expected sequence number or timestamp, found '{}'", lines[i].trim()),
                });
            };

            let caps = TIMESTAMP_REGEX
                .captures(lines[timing_line])
                .ok_or_else(|| SubtitleError::Parse {
                    line: timing_line + 1,
                    message: "malformed timestamp".to_string(),
                })?;
            let start_ms = Self::parse_timestamp_to_ms(&caps, 1);
            let end_ms = Self::parse_timestamp_to_ms(&caps, 5);
            if end_ms < start_ms {
                warn!("Cue at line {} ends before it starts", timing_line + 1);
            }

            let mut text_lines = Vec::new();
            i = timing_line + 1;
            while i < lines.len() && !lines[i].trim().is_empty() {
                text_lines.push(lines[i].trim_end());
                i += 1;
            }

            cues.push(Cue::new(cues.len(), start_ms, end_ms, text_lines.join("\n")));
        }

        Ok(cues)
    }

    /// Parse timestamp captures starting at `start_idx` to milliseconds
    fn parse_timestamp_to_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let part = |offset: usize| -> u64 {
            caps.get(start_idx + offset)
                .map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };

        (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
    }
}

impl fmt::Display for SubtitleFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle File")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
