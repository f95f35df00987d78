/*!
 * Batching and concurrency tuning.
 *
 * This module derives grouping limits and concurrency levels from the shape
 * of a subtitle file (cue lengths, timing gaps) and its dominant language.
 * The result is advisory; explicit configuration overrides any field.
 */

use log::debug;

use crate::language_utils::LanguageClass;
use crate::subtitle_processor::Cue;

/// p90 gap assumed when a file has no measurable gaps
const DEFAULT_P90_GAP_MS: u64 = 1200;

/// Parallelism assumed when the platform cannot report it
const DEFAULT_PARALLELISM: usize = 8;

/// Maximum cues per group, for every language class
const MAX_BLOCKS: usize = 8;

/// Character budget bounds
const MIN_CHARS: usize = 800;
const MAX_CHARS: usize = 2400;

/// Gap threshold bounds (ms)
const MIN_GAP_MS: u64 = 800;
const MAX_GAP_MS: u64 = 2500;

/// Summary statistics of a cue sequence
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    /// Number of cues (blank ones included)
    pub cue_count: usize,

    /// Average text length per cue, in characters
    pub avg_chars: f64,

    /// 90th percentile of the non-negative gaps between consecutive cues
    pub p90_gap_ms: u64,
}

impl CorpusStats {
    /// Compute statistics over the full ordered cue sequence
    pub fn from_cues(cues: &[Cue]) -> Self {
        let total_chars: usize = cues.iter().map(Cue::char_len).sum();
        let avg_chars = total_chars as f64 / cues.len().max(1) as f64;

        let mut gaps: Vec<u64> = cues
            .windows(2)
            .filter_map(|pair| {
                let gap = pair[1].start_ms as i64 - pair[0].end_ms as i64;
                (gap >= 0).then_some(gap as u64)
            })
            .collect();
        gaps.sort_unstable();

        let p90_gap_ms = if gaps.is_empty() {
            DEFAULT_P90_GAP_MS
        } else {
            gaps[(0.9 * gaps.len() as f64) as usize]
        };

        Self {
            cue_count: cues.len(),
            avg_chars,
            p90_gap_ms,
        }
    }
}

/// Derived batching and concurrency parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningParams {
    /// Character budget per group
    pub max_chars: usize,

    /// Maximum cues per group
    pub max_blocks: usize,

    /// Largest gap (ms) allowed inside a group
    pub max_gap_ms: u64,

    /// Concurrency when translating groups
    pub group_concurrency: usize,

    /// Concurrency when translating cue by cue
    pub block_concurrency: usize,
}

impl Default for TuningParams {
    fn default() -> Self {
        auto_tune(&[], "", DEFAULT_PARALLELISM)
    }
}

/// Available parallelism of the host, 8 if unknown
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_PARALLELISM)
}

/// Baseline character budget for a language class
fn base_chars(class: LanguageClass) -> usize {
    match class {
        LanguageClass::RightToLeft => 1200,
        LanguageClass::Cjk => 1400,
        LanguageClass::Other => 1600,
    }
}

/// Derive tuning parameters for a cue sequence.
///
/// `dominant_language` is the file's detected language; `parallelism` is the
/// number of hardware threads to size concurrency against.
pub fn auto_tune(cues: &[Cue], dominant_language: &str, parallelism: usize) -> TuningParams {
    let stats = CorpusStats::from_cues(cues);
    let class = LanguageClass::of(dominant_language);

    let mut max_chars = base_chars(class);
    if stats.avg_chars > 120.0 {
        max_chars = (max_chars as f64 * 0.85) as usize;
    } else if stats.avg_chars < 60.0 {
        max_chars = (max_chars as f64 * 1.1) as usize;
    }
    let max_chars = max_chars.clamp(MIN_CHARS, MAX_CHARS);

    let max_gap_ms = stats.p90_gap_ms.clamp(MIN_GAP_MS, MAX_GAP_MS);

    let params = TuningParams {
        max_chars,
        max_blocks: MAX_BLOCKS,
        max_gap_ms,
        group_concurrency: (parallelism / 2).clamp(6, 16),
        block_concurrency: (parallelism.saturating_mul(2)).clamp(12, 32),
    };

    debug!(
        "Auto-tuned for {:?} ({} cues, avg {:.1} chars, p90 gap {}ms): {:?}",
        class, stats.cue_count, stats.avg_chars, stats.p90_gap_ms, params
    );

    params
}
