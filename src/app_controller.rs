use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::database::CacheRepository;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils::{self, LanguageDetector, TrigramDetector, is_auto};
use crate::providers::Translator;
use crate::providers::ollama::OllamaTranslator;
use crate::subtitle_processor::{Cue, SubtitleFile};
use crate::translation::cache::CacheStore;
use crate::translation::orchestrator::{TranslationOrchestrator, TranslationReport};
use crate::translation::tuning::{auto_tune, available_parallelism};

// @module: Application controller for one translation run

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Subtitle file that was translated
    pub input_file: PathBuf,

    /// Where the translation was written
    pub output_file: PathBuf,

    /// Dominant language detected in the input
    pub dominant_language: String,

    /// Run counters
    pub report: TranslationReport,
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Translation provider
    translator: Arc<dyn Translator>,

    // @field: Language detector for the dominant language and group sources
    detector: Arc<dyn LanguageDetector>,

    // @field: Draw a progress bar on stderr
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the provider described by the configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate().map_err(|e| AppError::Config(e.to_string()))?;

        let translator = OllamaTranslator::new(
            &config.provider.endpoint,
            config.provider.model.clone(),
            config.provider.timeout_secs,
        )?;

        Ok(Self::with_translator(config, Arc::new(translator)))
    }

    /// Create a controller over an explicit provider
    pub fn with_translator(config: Config, translator: Arc<dyn Translator>) -> Self {
        Self {
            config,
            translator,
            detector: Arc::new(TrigramDetector::new()),
            show_progress: true,
        }
    }

    /// Use a specific language detector
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Configuration used by this controller
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one subtitle file (or the source subtitle of a directory).
    ///
    /// `target_language` and `source_language` override the configuration.
    /// Failing to read the input or write the output is fatal; everything in
    /// between degrades instead of failing.
    pub async fn run(
        &self,
        input_path: &Path,
        target_language: Option<&str>,
        source_language: Option<&str>,
    ) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();

        let target_language = target_language.unwrap_or(&self.config.target_language).trim().to_string();
        let source_language = source_language.unwrap_or(&self.config.source_language).trim().to_string();
        if is_auto(&target_language) {
            return Err(AppError::Config("A target language is required".to_string()));
        }
        language_utils::validate_language_code(&target_language).map_err(|e| AppError::Config(e.to_string()))?;
        language_utils::validate_language_code(&source_language).map_err(|e| AppError::Config(e.to_string()))?;

        let input_file = Self::resolve_input(input_path)?;
        let output_file = FileManager::generate_output_path(&input_file, &target_language);
        info!("Processing file: {} with provider {}", input_file.display(), self.translator.name());
        info!("Output file: {}", output_file.display());

        let mut subtitles = SubtitleFile::read_srt(&input_file)?;
        if subtitles.cues.iter().all(Cue::is_blank) {
            info!("No text to translate in {}", input_file.display());
        }

        let dominant_language = self.detect_dominant_language(&subtitles.cues).await;
        let params = auto_tune(&subtitles.cues, &dominant_language, available_parallelism());
        let settings = self.config.resolve(&params);
        debug!("Run settings: {:?}", settings);

        let cache = Arc::new(self.open_cache().await);
        let orchestrator = TranslationOrchestrator::new(self.translator.clone(), cache.clone())
            .with_detector(self.detector.clone())
            .with_dominant_language(dominant_language.clone());

        let progress_bar = self.create_progress_bar(subtitles.cues.len() as u64);
        let report = orchestrator
            .translate_with_progress(
                &mut subtitles.cues,
                &source_language,
                &target_language,
                &settings,
                |done, _| progress_bar.set_position(done as u64),
            )
            .await;
        progress_bar.finish_and_clear();

        let (hits, misses, hit_rate) = cache.stats();
        debug!("Cache: {} hits, {} misses ({:.1}% hit rate)", hits, misses, hit_rate * 100.0);

        subtitles.write_srt(&output_file)?;
        info!("Saved: {} in {:.1}s", output_file.display(), start_time.elapsed().as_secs_f64());

        Ok(RunSummary {
            input_file,
            output_file,
            dominant_language,
            report,
        })
    }

    /// Resolve a file or directory argument to the subtitle file to translate
    fn resolve_input(input_path: &Path) -> Result<PathBuf, AppError> {
        if FileManager::file_exists(input_path) {
            return Ok(input_path.to_path_buf());
        }

        if FileManager::dir_exists(input_path) {
            return FileManager::select_source_subtitle(input_path)?.ok_or_else(|| {
                AppError::File(format!("No SRT file found in {}", input_path.display()))
            });
        }

        Err(AppError::File(format!("Input path does not exist: {}", input_path.display())))
    }

    /// Detect the file's dominant language off the async executor
    async fn detect_dominant_language(&self, cues: &[Cue]) -> String {
        let sample: Vec<Cue> = cues.iter().filter(|c| !c.is_blank()).take(40).cloned().collect();
        let detector = self.detector.clone();

        match tokio::task::spawn_blocking(move || language_utils::detect_dominant_language(&sample, detector.as_ref())).await {
            Ok(language) => language,
            Err(e) => {
                warn!("Dominant language detection failed: {}", e);
                "en".to_string()
            }
        }
    }

    /// Open the persistent cache, or run with memory only when it is disabled or broken
    async fn open_cache(&self) -> CacheStore {
        if !self.config.cache_enabled {
            info!("Persistent cache disabled");
            return CacheStore::memory_only();
        }

        let cache_path = self.config.cache_path.clone();
        let opened = tokio::task::spawn_blocking(move || match cache_path {
            Some(path) => CacheRepository::open(path),
            None => CacheRepository::new_default(),
        })
        .await;

        match opened {
            Ok(Ok(repository)) => CacheStore::with_persistent(Arc::new(repository)),
            Ok(Err(e)) => {
                warn!("Could not open translation cache, continuing without it: {}", e);
                CacheStore::memory_only()
            }
            Err(e) => {
                warn!("Could not open translation cache, continuing without it: {}", e);
                CacheStore::memory_only()
            }
        }
    }

    fn create_progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating subtitles");
        progress_bar
    }
}
