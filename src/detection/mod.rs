// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Detection module - feature encoding, fault classification and narration

mod classification;
mod features;
mod narrator;

pub use classification::*;
pub use features::*;
pub use narrator::explain;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Fault severity, ordered from healthy to stop-now
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FaultSeverity {
    Normal = 0,
    Minor = 1,
    Major = 2,
    Critical = 3,
}

impl FaultSeverity {
    pub const ALL: [FaultSeverity; 4] = [
        FaultSeverity::Normal,
        FaultSeverity::Minor,
        FaultSeverity::Major,
        FaultSeverity::Critical,
    ];

    /// Class index as stored in the log
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Status label shown in history and log views
    pub fn label(&self) -> &'static str {
        match self {
            FaultSeverity::Normal => "Normal",
            FaultSeverity::Minor => "Minor Fault",
            FaultSeverity::Major => "Major Fault",
            FaultSeverity::Critical => "Critical Fault",
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, FaultSeverity::Critical)
    }
}

impl fmt::Display for FaultSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i64> for FaultSeverity {
    type Error = EngineError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FaultSeverity::Normal),
            1 => Ok(FaultSeverity::Minor),
            2 => Ok(FaultSeverity::Major),
            3 => Ok(FaultSeverity::Critical),
            other => Err(EngineError::InvalidPrediction(other)),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{DecisionTreeModel, TreeNode, FEATURE_NAMES};

    /// temp <= 100 -> (vib_z <= 0.9 -> (temp <= 95 -> Normal | Minor) | Major)
    /// temp >  100 -> (temp <= 110 -> Major | Critical)
    pub(crate) fn sample_tree() -> DecisionTreeModel {
        DecisionTreeModel::new(
            "test-tree",
            FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            vec![
                TreeNode::Split { feature: 0, threshold: 100.0, left: 1, right: 2 },
                TreeNode::Split { feature: 5, threshold: 0.9, left: 3, right: 4 },
                TreeNode::Split { feature: 0, threshold: 110.0, left: 5, right: 6 },
                TreeNode::Split { feature: 0, threshold: 95.0, left: 7, right: 8 },
                TreeNode::Leaf { class: 2 },
                TreeNode::Leaf { class: 2 },
                TreeNode::Leaf { class: 3 },
                TreeNode::Leaf { class: 0 },
                TreeNode::Leaf { class: 1 },
            ],
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(FaultSeverity::Normal < FaultSeverity::Minor);
        assert!(FaultSeverity::Minor < FaultSeverity::Major);
        assert!(FaultSeverity::Major < FaultSeverity::Critical);
        assert_eq!(FaultSeverity::ALL.iter().max(), Some(&FaultSeverity::Critical));
    }

    #[test]
    fn test_severity_codes() {
        for severity in FaultSeverity::ALL {
            assert_eq!(FaultSeverity::try_from(severity.code() as i64).unwrap(), severity);
        }
        assert!(matches!(FaultSeverity::try_from(4), Err(EngineError::InvalidPrediction(4))));
        assert!(FaultSeverity::try_from(-1).is_err());
    }
}
