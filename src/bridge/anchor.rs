//! Anchor patterns and byte-level anchor search.
//!
//! An anchor is the first bytes of a telegram (L-field, C-field and manufacturer
//! code) that the bridge leaves intact no matter how it wraps the frame. Each
//! anchor fixes the size of the window cut from the buffer once it is found.

use serde::{Deserialize, Serialize};

use crate::constants::{COMPACT_ANCHOR, COMPACT_FRAME_LEN, FULL_ANCHOR, FULL_FRAME_LEN};

/// Telegram size variant, determined by the anchor that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Compact,
    Full,
    Unknown,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FrameKind::Compact => "compact",
            FrameKind::Full => "full",
            FrameKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A fixed byte sequence marking the start of a telegram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPattern {
    /// Anchor bytes, written as a hex string in configuration files
    #[serde(with = "hex::serde")]
    pub pattern: Vec<u8>,
    /// Frame kind announced by this anchor
    pub kind: FrameKind,
    /// Total telegram size, anchor included, cut when this anchor matches
    pub window: usize,
}

impl AnchorPattern {
    pub fn new(pattern: &[u8], kind: FrameKind, window: usize) -> Self {
        Self {
            pattern: pattern.to_vec(),
            kind,
            window,
        }
    }

    /// Anchor of the 38-byte compact frame (`25 44 2D 2C`).
    pub fn compact() -> Self {
        Self::new(&COMPACT_ANCHOR, FrameKind::Compact, COMPACT_FRAME_LEN)
    }

    /// Anchor of the 49-byte full frame (`30 44 2D 2C`).
    pub fn full() -> Self {
        Self::new(&FULL_ANCHOR, FrameKind::Full, FULL_FRAME_LEN)
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// True when `data` begins with this anchor.
    pub fn is_prefix_of(&self, data: &[u8]) -> bool {
        !self.pattern.is_empty() && data.starts_with(&self.pattern)
    }

    /// Position of the first occurrence at or after `from`.
    pub fn find(&self, data: &[u8], from: usize) -> Option<usize> {
        if self.pattern.is_empty() || from >= data.len() {
            return None;
        }
        data[from..]
            .windows(self.pattern.len())
            .position(|w| w == self.pattern.as_slice())
            .map(|pos| pos + from)
    }
}

/// Location of an anchor inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorMatch<'a> {
    pub offset: usize,
    pub anchor: &'a AnchorPattern,
}

impl AnchorMatch<'_> {
    /// End of the window this match would cut, exclusive.
    pub fn window_end(&self) -> usize {
        self.offset.saturating_add(self.anchor.window)
    }
}

/// Earliest anchor occurrence at or after `from`.
///
/// When two anchors start at the same offset the one listed first wins.
pub fn find_first<'a>(data: &[u8], anchors: &'a [AnchorPattern], from: usize) -> Option<AnchorMatch<'a>> {
    anchors
        .iter()
        .filter_map(|anchor| anchor.find(data, from).map(|offset| AnchorMatch { offset, anchor }))
        .min_by_key(|m| m.offset)
}

/// True when any anchor occurs anywhere in `data`.
pub fn contains_any(data: &[u8], anchors: &[AnchorPattern]) -> bool {
    find_first(data, anchors, 0).is_some()
}

/// Anchor that `data` begins with, if any.
pub fn leading_anchor<'a>(data: &[u8], anchors: &'a [AnchorPattern]) -> Option<&'a AnchorPattern> {
    anchors.iter().find(|anchor| anchor.is_prefix_of(data))
}

/// Frame kind announced by the leading anchor of `data`.
pub fn classify(data: &[u8], anchors: &[AnchorPattern]) -> FrameKind {
    leading_anchor(data, anchors).map_or(FrameKind::Unknown, |anchor| anchor.kind)
}
