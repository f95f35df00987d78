/*!
 * Tests for grouping parsed subtitle files with auto-tuned limits
 */

use anyhow::Result;

use cuebatch::subtitle_processor::SubtitleFile;
use cuebatch::translation::{GroupLimits, auto_tune, group_cues};
use crate::common;

#[test]
fn test_groupCues_withSampleFile_shouldSplitOnBlankAndLongPause() -> Result<()> {
    let cues = SubtitleFile::parse_srt_string(common::SAMPLE_SRT)?;
    let params = auto_tune(&cues, "en", 8);

    let groups = group_cues(&cues, GroupLimits::from(&params));
    let indices: Vec<Vec<usize>> = groups.iter().map(|g| g.indices.clone()).collect();

    assert_eq!(indices, vec![vec![0, 1], vec![2], vec![3], vec![4]]);
    Ok(())
}

#[test]
fn test_groupCues_withLongFile_shouldRespectTunedLimits() {
    let texts: Vec<String> = (0..100).map(|i| format!("Line number {} of a long dialogue", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let cues = common::cues_from(&refs);

    let params = auto_tune(&cues, "en", 8);
    let limits = GroupLimits::from(&params);
    let groups = group_cues(&cues, limits);

    let mut seen = Vec::new();
    for group in &groups {
        assert!(group.len() <= limits.max_blocks);
        let chars: usize = group.indices.iter().map(|&i| cues[i].char_len()).sum();
        assert!(chars <= limits.max_chars);
        seen.extend(group.indices.iter().copied());
    }
    assert_eq!(seen, (0..100).collect::<Vec<_>>());
}

#[test]
fn test_autoTune_withCjkLanguage_shouldUseSmallerBudgetThanLatin() {
    let cues = common::cues_from(&["short line"; 20]);

    let latin = auto_tune(&cues, "en", 8);
    let cjk = auto_tune(&cues, "ja", 8);
    let rtl = auto_tune(&cues, "ar", 8);

    assert!(cjk.max_chars < latin.max_chars);
    assert!(rtl.max_chars < cjk.max_chars);
}
