/*!
 * End-to-end tests: one controller run over a file on disk
 */

use anyhow::Result;
use std::sync::Arc;

use cuebatch::app_controller::Controller;
use cuebatch::providers::mock::MockTranslator;
use cuebatch::subtitle_processor::SubtitleFile;
use crate::common;

#[tokio::test]
async fn test_run_withSampleFile_shouldWriteTranslatedOutput() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let translator = MockTranslator::working();

    let controller = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(translator.clone()))
        .with_progress(false);
    let summary = controller.run(&input, None, None).await?;

    assert_eq!(summary.output_file, temp_dir.path().join("movie_fr.srt"));
    assert_eq!(summary.report.cues, 5);
    assert_eq!(summary.report.translated_cues, 4);

    let output = SubtitleFile::read_srt(&summary.output_file)?;
    let texts: Vec<&str> = output.cues.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "[fr] <i>Hello there.</i>",
            "[fr] How are you?",
            "",
            "[fr] Hello there.",
            "[fr] See you tomorrow.",
        ]
    );

    // Timing is carried over untouched
    let input_cues = SubtitleFile::read_srt(&input)?.cues;
    for (before, after) in input_cues.iter().zip(&output.cues) {
        assert_eq!((before.start_ms, before.end_ms), (after.start_ms, after.end_ms));
    }
    Ok(())
}

#[tokio::test]
async fn test_run_secondTime_shouldBeServedFromPersistentCache() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let first = MockTranslator::working();
    let summary = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(first.clone()))
        .with_progress(false)
        .run(&input, None, None)
        .await?;
    assert!(first.call_count() > 0);
    let first_output = std::fs::read_to_string(&summary.output_file)?;

    let second = MockTranslator::working();
    let summary = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(second.clone()))
        .with_progress(false)
        .run(&input, None, None)
        .await?;

    assert_eq!(second.call_count(), 0);
    assert_eq!(summary.report.provider_calls, 0);
    assert_eq!(summary.report.cache_hits, 4);
    assert_eq!(std::fs::read_to_string(&summary.output_file)?, first_output);
    Ok(())
}

#[tokio::test]
async fn test_run_withDirectoryInput_shouldPickSourceSubtitle() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    common::create_test_file(temp_dir.path(), "episode_de.srt", "1\n00:00:01,000 --> 00:00:02,000\nHallo\n")?;

    let mut config = common::test_config(temp_dir.path());
    config.cache_enabled = false;
    let summary = Controller::with_translator(config, Arc::new(MockTranslator::working()))
        .with_progress(false)
        .run(temp_dir.path(), Some("es"), None)
        .await?;

    assert_eq!(summary.input_file, temp_dir.path().join("episode.srt"));
    assert_eq!(summary.output_file, temp_dir.path().join("episode_es.srt"));
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingProvider_shouldWriteOriginalText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let summary = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(MockTranslator::failing()))
        .with_progress(false)
        .run(&input, None, None)
        .await?;

    assert_eq!(summary.report.translated_cues, 0);
    assert!(summary.report.provider_failures > 0);
    assert_eq!(SubtitleFile::read_srt(&summary.output_file)?.cues, SubtitleFile::read_srt(&input)?.cues);
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(MockTranslator::working()))
        .with_progress(false);

    let result = controller.run(&temp_dir.path().join("missing.srt"), None, None).await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_withAutoTarget_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let controller = Controller::with_translator(common::test_config(temp_dir.path()), Arc::new(MockTranslator::working()))
        .with_progress(false);

    assert!(controller.run(&input, Some("auto"), None).await.is_err());
    Ok(())
}
