/*!
 * Translation orchestration.
 *
 * This module coordinates one translation run over a cue sequence. Every
 * cue (ungrouped mode) or group (grouped mode) becomes a unit; all units are
 * polled together, share one concurrency limiter for provider calls and
 * consult the cache before calling the provider.
 *
 * Grouped units first try a single combined request. When that fails, or
 * the response does not split back into one segment per cue, the group is
 * translated cue by cue. A cue whose translation fails keeps its original
 * text; a single failure never aborts the run.
 */

use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

use crate::errors::ProviderError;
use crate::language_utils::{AUTO_LANGUAGE, LanguageDetector, TrigramDetector, is_auto};
use crate::providers::Translator;
use crate::subtitle_processor::Cue;

use super::cache::CacheStore;
use super::grouping::{Group, GroupLimits, group_cues};
use super::sanitize::{self, Placeholder};
use super::tuning::TuningParams;

/// Marker placed between cue texts in a combined request
pub const GROUP_SEPARATOR: &str = "<<<GSEP_d3e6p>>>";

/// Separator as joined into the combined request, on a line of its own
const GROUP_JOINER: &str = "\n<<<GSEP_d3e6p>>>\n";

/// Minimum trimmed length of a text sampled for group language detection
const MIN_DETECTION_CHARS: usize = 6;

/// Resolved settings a run executes with
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Translate groups with combined requests (otherwise cue by cue)
    pub deep_grouping: bool,

    /// Grouping limits
    pub limits: GroupLimits,

    /// Maximum provider calls in flight
    pub concurrency: usize,

    /// Use the file's dominant language as the source of every group
    pub use_dominant_for_group: bool,

    /// Allow combined requests whose source resolves to `auto`
    pub allow_group_auto: bool,

    /// Cached fraction at which a group skips the combined request
    pub cache_group_threshold: f64,
}

impl RunSettings {
    /// Grouped-mode settings straight from tuning output
    pub fn from_tuning(params: &TuningParams) -> Self {
        Self {
            deep_grouping: true,
            limits: GroupLimits::from(params),
            concurrency: params.group_concurrency,
            use_dominant_for_group: true,
            allow_group_auto: true,
            cache_group_threshold: 0.6,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_tuning(&TuningParams::default())
    }
}

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Cues in the input
    pub cues: usize,

    /// Cues whose text was replaced by a translation
    pub translated_cues: usize,

    /// Cues served from either cache tier
    pub cache_hits: usize,

    /// Provider calls of any kind
    pub provider_calls: usize,

    /// Combined group requests
    pub batch_calls: usize,

    /// Provider calls that failed
    pub provider_failures: usize,

    /// Combined responses with the wrong segment count
    pub desyncs: usize,

    /// Groups translated cue by cue after a failed or desynced combined request
    pub fallback_groups: usize,
}

impl fmt::Display for TranslationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{} cues translated, {} cache hits, {} provider calls ({} combined, {} failed), {} desyncs, {} fallback groups",
            self.translated_cues,
            self.cues,
            self.cache_hits,
            self.provider_calls,
            self.batch_calls,
            self.provider_failures,
            self.desyncs,
            self.fallback_groups
        )
    }
}

/// Result of a combined group request
#[derive(Debug)]
pub enum BatchOutcome {
    /// One segment per cue, in order
    Translated(Vec<String>),
    /// The provider call failed
    ProviderError(ProviderError),
    /// The response split into the wrong number of segments
    Desync { expected: usize, received: usize },
}

/// Run-wide counters, updated concurrently by the units
#[derive(Default)]
struct Counters {
    cache_hits: AtomicUsize,
    provider_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    provider_failures: AtomicUsize,
    desyncs: AtomicUsize,
    fallback_groups: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn report(&self, cues: usize, translated_cues: usize) -> TranslationReport {
        TranslationReport {
            cues,
            translated_cues,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            provider_calls: self.provider_calls.load(Ordering::Relaxed),
            batch_calls: self.batch_calls.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            desyncs: self.desyncs.load(Ordering::Relaxed),
            fallback_groups: self.fallback_groups.load(Ordering::Relaxed),
        }
    }
}

/// State shared by the units of one run
struct RunContext<'a> {
    target_language: &'a str,
    settings: &'a RunSettings,
    semaphore: Semaphore,
    counters: Counters,
    done: AtomicUsize,
    total: usize,
    progress: &'a (dyn Fn(usize, usize) + Send + Sync),
}

impl RunContext<'_> {
    /// Mark one cue as finished
    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        (self.progress)(done, self.total);
    }
}

/// Text of the cues of a unit, after each went through its own path
type UnitResult = Vec<(usize, String)>;

/// Coordinates cache, provider and fallback for a translation run
pub struct TranslationOrchestrator {
    /// Translation provider
    translator: Arc<dyn Translator>,

    /// Detector used to resolve group sources
    detector: Arc<dyn LanguageDetector>,

    /// Cache of this run
    cache: Arc<CacheStore>,

    /// Dominant language of the file, if detected
    dominant_language: Option<String>,
}

impl TranslationOrchestrator {
    /// Create a new orchestrator over a provider and a run cache
    pub fn new(translator: Arc<dyn Translator>, cache: Arc<CacheStore>) -> Self {
        Self {
            translator,
            detector: Arc::new(TrigramDetector::new()),
            cache,
            dominant_language: None,
        }
    }

    /// Use a specific language detector for group sources
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Set the file's dominant language
    pub fn with_dominant_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.dominant_language = (!language.trim().is_empty()).then_some(language);
        self
    }

    /// Translate every cue in place
    pub async fn translate(
        &self,
        cues: &mut [Cue],
        source_language: &str,
        target_language: &str,
        settings: &RunSettings,
    ) -> TranslationReport {
        self.translate_with_progress(cues, source_language, target_language, settings, |_, _| {})
            .await
    }

    /// Translate every cue in place, reporting `(done, total)` once per cue
    pub async fn translate_with_progress<F>(
        &self,
        cues: &mut [Cue],
        source_language: &str,
        target_language: &str,
        settings: &RunSettings,
        progress: F,
    ) -> TranslationReport
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let source_language = if is_auto(source_language) {
            AUTO_LANGUAGE
        } else {
            source_language
        };

        let ctx = RunContext {
            target_language,
            settings,
            semaphore: Semaphore::new(settings.concurrency.max(1)),
            counters: Counters::default(),
            done: AtomicUsize::new(0),
            total: cues.len(),
            progress: &progress,
        };

        if cues.is_empty() {
            info!("No cues to translate");
            return ctx.counters.report(0, 0);
        }

        let snapshot: &[Cue] = cues;
        let results: Vec<UnitResult> = if settings.deep_grouping {
            let groups = group_cues(snapshot, settings.limits);
            info!(
                "Translating {} cues in {} groups (concurrency {})",
                snapshot.len(),
                groups.len(),
                settings.concurrency
            );
            join_all(
                groups
                    .iter()
                    .map(|group| self.translate_group(&ctx, snapshot, group, source_language)),
            )
            .await
        } else {
            info!(
                "Translating {} cues individually (concurrency {})",
                snapshot.len(),
                settings.concurrency
            );
            join_all(
                snapshot
                    .iter()
                    .enumerate()
                    .map(|(i, cue)| self.translate_single(&ctx, i, cue, source_language)),
            )
            .await
        };

        let mut translated_cues = 0;
        for (index, text) in results.into_iter().flatten() {
            cues[index].text = text;
            translated_cues += 1;
        }

        // Queued persistent writes belong to this run
        self.cache.flush().await;

        let report = ctx.counters.report(cues.len(), translated_cues);
        info!("Translation finished: {}", report);
        report
    }

    /// Ungrouped unit: one cue
    async fn translate_single(&self, ctx: &RunContext<'_>, index: usize, cue: &Cue, source: &str) -> UnitResult {
        let result = if cue.is_blank() {
            None
        } else {
            self.translate_cue(ctx, &cue.text, source, true).await
        };
        ctx.tick();

        result.map(|text| vec![(index, text)]).unwrap_or_default()
    }

    /// Translate one cue text through the cache and the provider.
    ///
    /// Concurrent calls for the same key share one memory slot: the first
    /// caller translates while the others wait for its result. The persistent
    /// tier is only read when `check_persistent` is set; group paths already
    /// looked the key up. Returns `None` when the provider failed.
    async fn translate_cue(&self, ctx: &RunContext<'_>, text: &str, source: &str, check_persistent: bool) -> Option<String> {
        let (cleaned, placeholders) = sanitize::protect(text);
        let slot = self.cache.memory_slot(source, ctx.target_language, &cleaned);
        let produced = AtomicBool::new(false);

        let result = slot
            .get_or_try_init(|| async {
                if check_persistent {
                    if let Some(hit) = self.cache.get_persistent(source, ctx.target_language, &cleaned).await {
                        return Ok(hit);
                    }
                }
                let translated = self.call_provider(ctx, source, &cleaned).await?;
                produced.store(true, Ordering::Relaxed);
                self.cache.set_persistent(source, ctx.target_language, &cleaned, &translated);
                Ok::<String, ProviderError>(translated)
            })
            .await;

        match result {
            Ok(translated) => {
                if produced.load(Ordering::Relaxed) {
                    self.cache.record_miss();
                } else {
                    self.cache.record_hit();
                    Counters::bump(&ctx.counters.cache_hits);
                }
                Some(finish(translated, &placeholders))
            }
            Err(e) => {
                warn!("Translation by {} failed, keeping original text: {}", self.translator.name(), e);
                None
            }
        }
    }

    /// One provider call under the run's concurrency limit
    async fn call_provider(&self, ctx: &RunContext<'_>, source: &str, text: &str) -> Result<String, ProviderError> {
        let _permit = ctx
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Concurrency limiter closed: {}", e)))?;

        Counters::bump(&ctx.counters.provider_calls);
        let result = self.translator.translate(source, ctx.target_language, text).await;
        if result.is_err() {
            Counters::bump(&ctx.counters.provider_failures);
        }
        result
    }

    /// Grouped unit: one group of contiguous cues
    async fn translate_group(&self, ctx: &RunContext<'_>, cues: &[Cue], group: &Group, source: &str) -> UnitResult {
        let indices = &group.indices;

        // Blank cues always come as singleton groups
        if indices.iter().all(|&i| cues[i].is_blank()) {
            indices.iter().for_each(|_| ctx.tick());
            return Vec::new();
        }

        let (cleaned, placeholders): (Vec<String>, Vec<Vec<Placeholder>>) =
            indices.iter().map(|&i| sanitize::protect(&cues[i].text)).unzip();

        let group_source = self.resolve_group_source(ctx, &cleaned, source).await;

        let mut cached = Vec::with_capacity(indices.len());
        for text in &cleaned {
            cached.push(self.cache.lookup(&group_source, ctx.target_language, text).await.into_hit());
        }
        let have_cached = cached.iter().filter(|hit| hit.is_some()).count();

        if have_cached == indices.len() {
            debug!("Group {:?} fully cached", group.span());
            return self.apply_cached(ctx, indices, &cached, &placeholders);
        }

        if have_cached as f64 / indices.len() as f64 >= ctx.settings.cache_group_threshold {
            debug!("Group {:?}: {}/{} cached, translating the rest individually", group.span(), have_cached, indices.len());
            let mut results = self.apply_cached(ctx, indices, &cached, &placeholders);
            let missing = indices
                .iter()
                .zip(&cached)
                .filter(|(_, hit)| hit.is_none())
                .map(|(&i, _)| i);
            results.extend(self.translate_individually(ctx, cues, missing, &group_source).await);
            return results;
        }

        if is_auto(&group_source) && !ctx.settings.allow_group_auto {
            debug!("Group {:?} has no resolved source, translating individually", group.span());
            return self
                .translate_individually(ctx, cues, indices.iter().copied(), &group_source)
                .await;
        }

        if indices.len() == 1 {
            return self
                .translate_individually(ctx, cues, indices.iter().copied(), &group_source)
                .await;
        }

        match self.request_combined(ctx, &group_source, &cleaned).await {
            BatchOutcome::Translated(segments) => {
                let mut results = Vec::with_capacity(indices.len());
                for (j, (&i, segment)) in indices.iter().zip(&segments).enumerate() {
                    if cached[j].is_none() {
                        self.cache.store(&group_source, ctx.target_language, &cleaned[j], segment);
                    }
                    results.push((i, finish(segment, &placeholders[j])));
                    ctx.tick();
                }
                results
            }
            BatchOutcome::ProviderError(e) => {
                warn!(
                    "Combined request to {} for group {:?} failed, translating individually: {}",
                    self.translator.name(),
                    group.span(),
                    e
                );
                Counters::bump(&ctx.counters.fallback_groups);
                self.translate_individually(ctx, cues, indices.iter().copied(), &group_source)
                    .await
            }
            BatchOutcome::Desync { expected, received } => {
                warn!(
                    "Combined response for group {:?} has {} segments, expected {}; translating individually",
                    group.span(),
                    received,
                    expected
                );
                Counters::bump(&ctx.counters.desyncs);
                Counters::bump(&ctx.counters.fallback_groups);
                self.translate_individually(ctx, cues, indices.iter().copied(), &group_source)
                    .await
            }
        }
    }

    /// Send a whole group as one request and split the response
    async fn request_combined(&self, ctx: &RunContext<'_>, source: &str, cleaned: &[String]) -> BatchOutcome {
        let combined = cleaned.join(GROUP_JOINER);
        Counters::bump(&ctx.counters.batch_calls);

        let translated = match self.call_provider(ctx, source, &combined).await {
            Ok(translated) => translated,
            Err(e) => return BatchOutcome::ProviderError(e),
        };

        let segments: Vec<String> = translated
            .split(GROUP_SEPARATOR)
            .map(|segment| segment.trim().to_string())
            .collect();

        if segments.len() != cleaned.len() {
            return BatchOutcome::Desync {
                expected: cleaned.len(),
                received: segments.len(),
            };
        }

        BatchOutcome::Translated(segments)
    }

    /// Apply the cached texts of a group, ticking once per applied cue
    fn apply_cached(
        &self,
        ctx: &RunContext<'_>,
        indices: &[usize],
        cached: &[Option<String>],
        placeholders: &[Vec<Placeholder>],
    ) -> UnitResult {
        let mut results = Vec::new();
        for (j, &i) in indices.iter().enumerate() {
            if let Some(hit) = &cached[j] {
                results.push((i, finish(hit, &placeholders[j])));
                Counters::bump(&ctx.counters.cache_hits);
                ctx.tick();
            }
        }
        results
    }

    /// Per-cue translation of part of a group, with the group's source.
    ///
    /// Every cue here went through `lookup` first, so only the memory slot
    /// and the provider are consulted.
    async fn translate_individually(
        &self,
        ctx: &RunContext<'_>,
        cues: &[Cue],
        indices: impl Iterator<Item = usize>,
        source: &str,
    ) -> UnitResult {
        let mut results = Vec::new();
        for i in indices {
            if let Some(text) = self.translate_cue(ctx, &cues[i].text, source, false).await {
                results.push((i, text));
            }
            ctx.tick();
        }
        results
    }

    /// Pick the source language a group is translated from
    async fn resolve_group_source(&self, ctx: &RunContext<'_>, cleaned: &[String], source: &str) -> String {
        if !is_auto(source) {
            return source.to_string();
        }

        if ctx.settings.use_dominant_for_group {
            return self
                .dominant_language
                .clone()
                .unwrap_or_else(|| AUTO_LANGUAGE.to_string());
        }

        let samples: Vec<String> = cleaned
            .iter()
            .map(|text| text.trim())
            .filter(|text| text.chars().count() >= MIN_DETECTION_CHARS)
            .map(str::to_string)
            .collect();
        if samples.is_empty() {
            return AUTO_LANGUAGE.to_string();
        }

        let detector = self.detector.clone();
        let detected = tokio::task::spawn_blocking(move || {
            samples
                .iter()
                .filter_map(|text| detector.detect(text).ok())
                .collect::<HashSet<String>>()
        })
        .await;

        match detected {
            Ok(languages) if languages.len() == 1 => languages
                .into_iter()
                .next()
                .unwrap_or_else(|| AUTO_LANGUAGE.to_string()),
            Ok(languages) => {
                debug!("Group languages disagree ({:?}), using auto", languages);
                AUTO_LANGUAGE.to_string()
            }
            Err(e) => {
                warn!("Language detection task failed, using auto: {}", e);
                AUTO_LANGUAGE.to_string()
            }
        }
    }
}

/// Put markup back and clean up a translated text
fn finish(translated: &str, placeholders: &[Placeholder]) -> String {
    sanitize::normalize(&sanitize::restore(translated, placeholders))
}
