/*!
 * Tests for SRT reading and writing
 */

use anyhow::Result;

use cuebatch::errors::SubtitleError;
use cuebatch::subtitle_processor::SubtitleFile;
use crate::common;

#[test]
fn test_readSrt_withSample_shouldKeepBlankCue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let file = SubtitleFile::read_srt(&path)?;

    assert_eq!(file.cues.len(), 5);
    assert_eq!(file.cues[0].text, "<i>Hello there.</i>");
    assert!(file.cues[2].is_blank());
    assert_eq!(file.cues[4].start_ms, 30_000);
    Ok(())
}

#[test]
fn test_writeSrt_thenRead_shouldPreserveCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;
    let file = SubtitleFile::read_srt(&path)?;

    let out = temp_dir.path().join("nested").join("copy.srt");
    file.write_srt(&out)?;
    let reread = SubtitleFile::read_srt(&out)?;

    assert_eq!(reread.cues, file.cues);
    Ok(())
}

#[test]
fn test_readSrt_withMissingFile_shouldReturnReadError() {
    let result = SubtitleFile::read_srt("/nonexistent/file.srt");
    assert!(matches!(result, Err(SubtitleError::Read { .. })));
}

#[test]
fn test_readSrt_withCrlfLineEndings_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = common::SAMPLE_SRT.replace('\n', "\r\n");
    let path = common::create_test_file(temp_dir.path(), "crlf.srt", &content)?;

    let file = SubtitleFile::read_srt(&path)?;

    assert_eq!(file.cues.len(), 5);
    assert_eq!(file.cues[1].text, "How are you?");
    Ok(())
}
