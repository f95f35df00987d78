/*!
 * # cuebatch - batched subtitle translation with caching
 *
 * A Rust library for translating subtitle files through an external
 * translation service with as few requests as possible.
 *
 * ## Features
 *
 * - Groups neighbouring cues into combined requests, sized from the file
 *   itself (cue lengths, timing gaps, script of the dominant language)
 * - Two-tier cache: per-run memory plus a persistent SQLite store keyed by
 *   language pair and content hash
 * - Bounded concurrency with a deterministic fallback to per-cue requests
 *   when a combined request fails or comes back out of sync
 * - Inline markup (`<i>`, `<font>`) protected from the provider
 * - Blank cues and untranslatable cues are left exactly as they were
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing and writing
 * - `translation`: The translation core:
 *   - `translation::sanitize`: Markup protection and normalization
 *   - `translation::cache`: Memory and persistent cache tiers
 *   - `translation::tuning`: Auto-tuned batching parameters
 *   - `translation::grouping`: Partition of cues into groups
 *   - `translation::orchestrator`: Concurrent translation with fallback
 * - `database`: SQLite storage behind the persistent cache
 * - `file_utils`: File system operations
 * - `app_controller`: One run over one file
 * - `language_utils`: Language codes and detection
 * - `providers`: Translation providers (Ollama, mock)
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod subtitle_processor;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod database;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use subtitle_processor::{Cue, SubtitleFile};
pub use translation::{RunSettings, TranslationOrchestrator, TranslationReport};
pub use language_utils::{LanguageDetector, get_language_name};
pub use providers::Translator;
pub use errors::{AppError, CacheError, DetectionError, ProviderError, SubtitleError};
