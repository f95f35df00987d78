use anyhow::{Result, anyhow};
use isolang::Language;
use log::debug;
use std::collections::HashMap;

use crate::errors::DetectionError;
use crate::subtitle_processor::Cue;

/// Language utilities
///
/// This module provides language code normalization, script classes used for
/// tuning, and the language detection seam used by the orchestrator.
/// Code used when the source language is left to the provider
pub const AUTO_LANGUAGE: &str = "auto";

/// Maximum number of non-blank cues sampled to find the dominant language
const DOMINANT_SAMPLE_SIZE: usize = 40;

/// Language assumed when a file gives no usable signal
const DEFAULT_DOMINANT_LANGUAGE: &str = "en";

/// Right-to-left languages, in provider code form
const RTL_LANGUAGES: &[&str] = &["ar", "iw", "he", "fa", "ur"];

/// CJK languages, in provider code form (lowercased)
const CJK_LANGUAGES: &[&str] = &["zh", "zh-cn", "zh-tw", "ja", "ko"];

/// Script family of a language, which drives the character budget of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageClass {
    /// Right-to-left scripts (Arabic, Hebrew, ...)
    RightToLeft,
    /// Chinese, Japanese, Korean
    Cjk,
    /// Everything else
    Other,
}

impl LanguageClass {
    /// Classify a language code (any casing, ISO or provider form)
    pub fn of(code: &str) -> Self {
        let normalized = normalize_provider_code(code).to_lowercase();
        if RTL_LANGUAGES.contains(&normalized.as_str()) {
            Self::RightToLeft
        } else if CJK_LANGUAGES.contains(&normalized.as_str()) {
            Self::Cjk
        } else {
            Self::Other
        }
    }
}

/// Normalize a language code to the form translation services expect.
///
/// Empty codes become `auto`; Hebrew maps to its legacy `iw` code and the
/// Chinese variants map to `zh-CN`/`zh-TW`.
pub fn normalize_provider_code(code: &str) -> String {
    let c = code.trim().to_lowercase();
    if c.is_empty() {
        return AUTO_LANGUAGE.to_string();
    }

    match c.as_str() {
        "he" => "iw".to_string(),
        "zh" | "zh-cn" | "zh-sg" | "zh-hans" => "zh-CN".to_string(),
        "zh-tw" | "zh-hk" | "zh-hant" => "zh-TW".to_string(),
        _ => c,
    }
}

/// Whether a code means "let the provider figure it out"
pub fn is_auto(code: &str) -> bool {
    let c = code.trim();
    c.is_empty() || c.eq_ignore_ascii_case(AUTO_LANGUAGE)
}

/// Resolve an ISO 639-1, 639-2 or region-tagged code (`pt-BR`) to a language
fn lookup_language(code: &str) -> Option<Language> {
    let primary = code.trim().split(['-', '_']).next().unwrap_or_default().to_lowercase();
    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary).or_else(|| {
            // ISO 639-2/B codes that differ from 639-2/T
            let part2t = match primary.as_str() {
                "fre" => "fra",
                "ger" => "deu",
                "dut" => "nld",
                "gre" => "ell",
                "chi" => "zho",
                "cze" => "ces",
                "per" => "fas",
                "rum" => "ron",
                "slo" => "slk",
                _ => return None,
            };
            Language::from_639_3(part2t)
        }),
        _ => None,
    }
}

/// Validate a configured language code; `auto` is accepted
pub fn validate_language_code(code: &str) -> Result<()> {
    if is_auto(code) || lookup_language(code).is_some() {
        Ok(())
    } else {
        Err(anyhow!("Invalid language code: {}", code))
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup_language(code)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}

/// Detects the language of a piece of text
///
/// Implementations are called from the blocking worker pool and may be slow.
pub trait LanguageDetector: Send + Sync {
    /// Return an ISO 639-1 code for the text
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

/// Find the most frequent language across the first non-blank cues.
///
/// Detection failures are skipped; falls back to English when nothing could
/// be detected. Ties go to the language seen first.
pub fn detect_dominant_language(cues: &[Cue], detector: &dyn LanguageDetector) -> String {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for cue in cues.iter().filter(|c| !c.is_blank()).take(DOMINANT_SAMPLE_SIZE) {
        if let Ok(code) = detector.detect(cue.text.trim()) {
            if !counts.contains_key(&code) {
                first_seen.push(code.clone());
            }
            *counts.entry(code).or_insert(0) += 1;
        }
    }

    let mut best: Option<(&String, usize)> = None;
    for code in &first_seen {
        let count = counts[code];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((code, count));
        }
    }

    let dominant = best
        .map(|(code, _)| code.clone())
        .unwrap_or_else(|| DEFAULT_DOMINANT_LANGUAGE.to_string());
    debug!("Dominant language: {} ({:?})", dominant, counts);
    dominant
}

/// Confidence under which an unreliable guess is reported as ambiguous
const MIN_CONFIDENCE: f64 = 0.5;

/// Statistical detector: script detection, then trigram profiles within the
/// script (`whatlang`).
///
/// Codes come back in ISO 639-1 form where one exists. Short or mixed text
/// whose best guess stays under the confidence floor is
/// `DetectionError::Ambiguous`.
#[derive(Debug, Default, Clone)]
pub struct TrigramDetector;

impl TrigramDetector {
    /// Create a new trigram detector
    pub fn new() -> Self {
        Self
    }

    /// Map a whatlang language to the code the rest of the crate uses
    fn to_code(lang: whatlang::Lang) -> String {
        match lang {
            whatlang::Lang::Cmn => "zh".to_string(),
            _ => Language::from_639_3(lang.code())
                .and_then(|l| l.to_639_1())
                .unwrap_or(lang.code())
                .to_string(),
        }
    }
}

impl LanguageDetector for TrigramDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        let info = whatlang::detect(text).ok_or(DetectionError::InsufficientText)?;
        let code = Self::to_code(info.lang());

        if !info.is_reliable() && info.confidence() < MIN_CONFIDENCE {
            return Err(DetectionError::Ambiguous(format!(
                "{} ({} at {:.2})",
                info.script().name(),
                code,
                info.confidence()
            )));
        }

        Ok(code)
    }
}
