/*!
 * Orchestrator tests over parsed subtitle files: fallback and concurrency
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use cuebatch::providers::mock::{FixedDetector, MockTranslator};
use cuebatch::subtitle_processor::SubtitleFile;
use cuebatch::translation::{CacheStore, GroupLimits, RunSettings, TranslationOrchestrator};
use crate::common;

fn settings(concurrency: usize) -> RunSettings {
    RunSettings {
        limits: GroupLimits {
            max_chars: 1600,
            max_blocks: 8,
            max_gap_ms: 2000,
        },
        concurrency,
        ..RunSettings::default()
    }
}

#[test]
fn test_translate_withDesyncingProvider_shouldFallBackPerCue() -> Result<()> {
    common::init_logging();
    let mut cues = SubtitleFile::parse_srt_string(common::SAMPLE_SRT)?;
    let translator = MockTranslator::desync_on_batch();
    let orchestrator = TranslationOrchestrator::new(Arc::new(translator.clone()), Arc::new(CacheStore::memory_only()));

    let report = tokio_test::block_on(orchestrator.translate(&mut cues, "en", "fr", &settings(4)));

    assert_eq!(report.desyncs, 1);
    assert_eq!(report.fallback_groups, 1);
    assert_eq!(report.translated_cues, 4);
    assert_eq!(cues[0].text, "[fr] <i>Hello there.</i>");
    assert_eq!(cues[1].text, "[fr] How are you?");
    assert!(cues[2].is_blank());
    assert_eq!(translator.batch_call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_translate_withAutoSourceAndAgreeingDetector_shouldUseDetectedLanguage() -> Result<()> {
    let mut cues = SubtitleFile::parse_srt_string(common::SAMPLE_SRT)?;
    let translator = MockTranslator::working();
    let orchestrator = TranslationOrchestrator::new(Arc::new(translator.clone()), Arc::new(CacheStore::memory_only()))
        .with_detector(Arc::new(FixedDetector::always("de")));

    let run_settings = RunSettings {
        use_dominant_for_group: false,
        ..settings(4)
    };
    orchestrator.translate(&mut cues, "auto", "fr", &run_settings).await;

    let batch: Vec<_> = translator.calls().into_iter().filter(|c| c.is_batch()).collect();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].source_language, "de");
    Ok(())
}

#[tokio::test]
async fn test_translate_withManyGroups_shouldRespectConcurrencyLimit() -> Result<()> {
    // Long pauses put every cue in its own group
    let mut cues: Vec<_> = (0..12)
        .map(|i| {
            let start = i as u64 * 10_000;
            cuebatch::Cue::new(i, start, start + 1000, format!("Sentence {}", i))
        })
        .collect();
    let translator = MockTranslator::working().with_delay(Duration::from_millis(20));
    let orchestrator = TranslationOrchestrator::new(Arc::new(translator.clone()), Arc::new(CacheStore::memory_only()));

    let report = orchestrator.translate(&mut cues, "en", "fr", &settings(2)).await;

    assert_eq!(report.translated_cues, 12);
    assert_eq!(report.provider_calls, 12);
    assert!(translator.max_in_flight() <= 2);
    Ok(())
}
