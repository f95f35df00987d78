/*!
 * Batched subtitle translation.
 *
 * This module contains the core of a translation run. It is split into
 * several submodules:
 *
 * - `sanitize`: Markup protection and text normalization
 * - `cache`: Two-tier translation cache
 * - `tuning`: Batching and concurrency parameters derived from the file
 * - `grouping`: Partition of cues into translation groups
 * - `orchestrator`: Concurrent translation with cache and fallback
 */

// Re-export main types for easier usage
pub use self::cache::{CacheKey, CacheStore, LookupOutcome, PersistentCache};
pub use self::grouping::{Group, GroupLimits, group_cues};
pub use self::orchestrator::{BatchOutcome, RunSettings, TranslationOrchestrator, TranslationReport};
pub use self::tuning::{CorpusStats, TuningParams, auto_tune};

// Submodules
pub mod cache;
pub mod grouping;
pub mod orchestrator;
pub mod sanitize;
pub mod tuning;
