/*!
 * Cue grouping.
 *
 * Partitions an ordered cue sequence into contiguous groups that are
 * translated with one combined request each. Groups are closed on long
 * timing gaps, on the block limit and on the character budget; blank cues
 * always stand alone.
 */

use log::debug;

use crate::subtitle_processor::Cue;
use crate::translation::tuning::TuningParams;

/// Contiguous run of cue indices translated together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// Indices into the cue slice, ascending and contiguous
    pub indices: Vec<usize>,
}

impl Group {
    fn single(index: usize) -> Self {
        Self { indices: vec![index] }
    }

    /// Number of cues in the group
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// First and last cue index, for log messages
    pub fn span(&self) -> Option<(usize, usize)> {
        Some((*self.indices.first()?, *self.indices.last()?))
    }
}

/// Limits a group must respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLimits {
    /// Character budget of a group's combined text
    pub max_chars: usize,

    /// Maximum cues per group
    pub max_blocks: usize,

    /// Largest start-to-previous-end gap allowed inside a group
    pub max_gap_ms: u64,
}

impl From<&TuningParams> for GroupLimits {
    fn from(params: &TuningParams) -> Self {
        Self {
            max_chars: params.max_chars,
            max_blocks: params.max_blocks,
            max_gap_ms: params.max_gap_ms,
        }
    }
}

/// Partition `cues` into translation groups in a single left-to-right pass.
///
/// Every cue index appears in exactly one group and groups come out in cue
/// order. A cue longer than `max_chars` still gets a group of its own.
pub fn group_cues(cues: &[Cue], limits: GroupLimits) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut current = Group::default();
    let mut current_chars = 0;
    let mut last_end: Option<u64> = None;

    for (i, cue) in cues.iter().enumerate() {
        if cue.is_blank() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            groups.push(Group::single(i));
            last_end = Some(cue.end_ms);
            continue;
        }

        let len = cue.char_len();
        let gap_exceeded = last_end
            .map(|end| cue.start_ms as i64 - end as i64 > limits.max_gap_ms as i64)
            .unwrap_or(false);

        if gap_exceeded || current.len() >= limits.max_blocks || current_chars + len > limits.max_chars {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
            current.indices.push(i);
            current_chars = len;
        } else {
            current.indices.push(i);
            current_chars += len;
        }

        last_end = Some(cue.end_ms);
    }

    if !current.is_empty() {
        groups.push(current);
    }

    debug!("Grouped {} cues into {} groups", cues.len(), groups.len());
    groups
}
