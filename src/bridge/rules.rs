//! Length-keyed extraction rule table.
//!
//! The bridge firmware wraps telegrams differently depending on how many bytes
//! it sends in one notification. The table maps the *total* notification length
//! to the rule that knows how to cut telegrams out of it. It is plain data so a
//! new firmware variant only needs a new row.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPACT_FRAME_LEN, FULL_FRAME_LEN, NOTIFICATION_LEN_COMPACT, NOTIFICATION_LEN_FULL,
    NOTIFICATION_LEN_MULTI, NOTIFICATION_LEN_OFFSET, OFFSET_TRIM_PREFIX, OFFSET_TRIM_SUFFIX,
};
use crate::error::BridgeError;

/// How telegrams are cut out of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ExtractionRule {
    /// The stripped core is a single frame of at least `min_core_len` bytes.
    SingleFrame { min_core_len: usize },
    /// Drop fixed byte counts from both ends of the unstripped payload.
    OffsetTrim { prefix: usize, suffix: usize },
    /// Cut consecutive, non-overlapping anchor windows out of the core.
    MultiFrameScan,
}

impl ExtractionRule {
    pub fn name(&self) -> &'static str {
        match self {
            ExtractionRule::SingleFrame { .. } => "single_frame",
            ExtractionRule::OffsetTrim { .. } => "offset_trim",
            ExtractionRule::MultiFrameScan => "multi_frame_scan",
        }
    }
}

/// Where a rule came from: a table row or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    Table(usize),
    Fallback,
}

/// Identifies the rule that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleId {
    pub source: RuleSource,
    pub rule: ExtractionRule,
}

impl RuleId {
    pub fn is_fallback(&self) -> bool {
        self.source == RuleSource::Fallback
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            RuleSource::Table(len) => write!(f, "{len}:{}", self.rule.name()),
            RuleSource::Fallback => write!(f, "fallback:{}", self.rule.name()),
        }
    }
}

/// Declared notification length → extraction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    entries: BTreeMap<usize, ExtractionRule>,
    #[serde(default)]
    fallback: Option<ExtractionRule>,
}

impl RuleTable {
    /// An empty table with no fallback; every lookup fails until rows are added.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            fallback: None,
        }
    }

    pub fn with_rule(mut self, declared_length: usize, rule: ExtractionRule) -> Self {
        self.entries.insert(declared_length, rule);
        self
    }

    pub fn with_fallback(mut self, rule: ExtractionRule) -> Self {
        self.fallback = Some(rule);
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn fallback(&self) -> Option<ExtractionRule> {
        self.fallback
    }

    pub fn get(&self, declared_length: usize) -> Option<ExtractionRule> {
        self.entries.get(&declared_length).copied()
    }

    /// Rows in ascending length order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ExtractionRule)> + '_ {
        self.entries.iter().map(|(len, rule)| (*len, *rule))
    }

    /// Select the rule for a notification of `declared_length` bytes.
    ///
    /// A miss without a fallback is a defect in the table, not in the data.
    pub fn rule_for(&self, declared_length: usize) -> Result<RuleId, BridgeError> {
        if let Some(rule) = self.get(declared_length) {
            return Ok(RuleId {
                source: RuleSource::Table(declared_length),
                rule,
            });
        }
        self.fallback
            .map(|rule| RuleId {
                source: RuleSource::Fallback,
                rule,
            })
            .ok_or(BridgeError::NoRule(declared_length))
    }

    pub(crate) fn validate(&self) -> Result<(), BridgeError> {
        for (len, rule) in self.iter() {
            match rule {
                ExtractionRule::OffsetTrim { prefix, suffix }
                    if prefix.checked_add(suffix).map_or(true, |trimmed| trimmed >= len) =>
                {
                    return Err(BridgeError::Config(format!(
                        "offset_trim for {len}-byte notifications leaves no frame ({prefix}+{suffix} bytes trimmed)"
                    )));
                }
                ExtractionRule::SingleFrame { min_core_len } if min_core_len == 0 => {
                    return Err(BridgeError::Config(format!(
                        "single_frame for {len}-byte notifications needs min_core_len > 0"
                    )));
                }
                _ => {}
            }
        }
        if let Some(ExtractionRule::OffsetTrim { .. }) = self.fallback {
            return Err(BridgeError::Config(
                "offset_trim cannot be the fallback rule: offsets depend on the length".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RuleTable {
    /// Rows observed on the VW1871 bridge with flowIQ 2101 meters.
    fn default() -> Self {
        RuleTable::empty()
            .with_rule(
                NOTIFICATION_LEN_COMPACT,
                ExtractionRule::SingleFrame {
                    min_core_len: COMPACT_FRAME_LEN,
                },
            )
            .with_rule(
                NOTIFICATION_LEN_FULL,
                ExtractionRule::SingleFrame {
                    min_core_len: FULL_FRAME_LEN,
                },
            )
            .with_rule(
                NOTIFICATION_LEN_OFFSET,
                ExtractionRule::OffsetTrim {
                    prefix: OFFSET_TRIM_PREFIX,
                    suffix: OFFSET_TRIM_SUFFIX,
                },
            )
            .with_rule(NOTIFICATION_LEN_MULTI, ExtractionRule::MultiFrameScan)
            .with_fallback(ExtractionRule::MultiFrameScan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rows() {
        let table = RuleTable::default();
        assert_eq!(table.get(59), Some(ExtractionRule::SingleFrame { min_core_len: 38 }));
        assert_eq!(table.get(70), Some(ExtractionRule::SingleFrame { min_core_len: 49 }));
        assert_eq!(table.get(96), Some(ExtractionRule::OffsetTrim { prefix: 54, suffix: 4 }));
        assert_eq!(table.get(244), Some(ExtractionRule::MultiFrameScan));
        assert_eq!(table.iter().count(), 4);
    }

    #[test]
    fn test_unlisted_length_uses_fallback() {
        let id = RuleTable::default().rule_for(62).unwrap();
        assert!(id.is_fallback());
        assert_eq!(id.rule, ExtractionRule::MultiFrameScan);
        assert_eq!(id.to_string(), "fallback:multi_frame_scan");
    }

    #[test]
    fn test_table_hit_is_not_fallback() {
        let id = RuleTable::default().rule_for(96).unwrap();
        assert_eq!(id.source, RuleSource::Table(96));
        assert_eq!(id.to_string(), "96:offset_trim");
    }

    #[test]
    fn test_missing_fallback_is_hard_error() {
        let table = RuleTable::default().without_fallback();
        assert!(matches!(table.rule_for(62), Err(BridgeError::NoRule(62))));
        assert!(table.rule_for(244).is_ok());
    }

    #[test]
    fn test_validate_rejects_impossible_trim() {
        let table = RuleTable::empty().with_rule(10, ExtractionRule::OffsetTrim { prefix: 8, suffix: 2 });
        assert!(matches!(table.validate(), Err(BridgeError::Config(_))));

        let table = RuleTable::empty().with_fallback(ExtractionRule::OffsetTrim { prefix: 1, suffix: 1 });
        assert!(table.validate().is_err());

        assert!(RuleTable::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_trim() {
        let table = RuleTable::empty().with_rule(
            96,
            ExtractionRule::OffsetTrim {
                prefix: usize::MAX,
                suffix: 4,
            },
        );
        assert!(matches!(table.validate(), Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_serde_layout() {
        let json = r#"{
            "entries": { "59": { "rule": "single_frame", "min_core_len": 38 },
                         "244": { "rule": "multi_frame_scan" } },
            "fallback": null
        }"#;
        let table: RuleTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.get(59), Some(ExtractionRule::SingleFrame { min_core_len: 38 }));
        assert_eq!(table.get(244), Some(ExtractionRule::MultiFrameScan));
        assert_eq!(table.fallback(), None);
    }
}
