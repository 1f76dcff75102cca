//! Absolute actuator positions per entity and side.
//!
//! Tables are data, not code: hardware recalibration ships as a new revision
//! (built in or loaded from TOML) rather than as new match arms.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use shared::domain::Side;
use thiserror::Error;

pub const DEFAULT_REVISION: &str = "asymmetric";

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("failed to read calibration file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid calibration data: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown calibration revision '{0}'")]
    UnknownRevision(String),
    #[error("calibration table '{0}' is empty")]
    EmptyTable(&'static str),
    #[error("arm table must not define binary action '{0}'")]
    ShadowedArmAction(String),
    #[error("hand tables disagree: right-only {right_only:?}, left-only {left_only:?}")]
    HandMismatch {
        right_only: Vec<String>,
        left_only: Vec<String>,
    },
}

/// Logical position name to absolute actuator position.
///
/// Values are usually within `0..=100`, but hand revisions overshoot on
/// purpose (`-25`, `125`) and are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationTable(BTreeMap<String, i32>);

impl CalibrationTable {
    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<[(&str, i32); N]> for CalibrationTable {
    fn from(entries: [(&str, i32); N]) -> Self {
        CalibrationTable(
            entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }
}

/// MQTT command a hand position is published under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandCommand {
    /// `<side>hand/set`.
    #[default]
    Set,
    /// The action name itself, e.g. `<side>hand/up`.
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandCalibration {
    #[serde(default)]
    pub command: HandCommand,
    pub right: CalibrationTable,
    pub left: CalibrationTable,
}

impl HandCalibration {
    pub fn for_side(&self, side: Side) -> &CalibrationTable {
        match side {
            Side::Right => &self.right,
            Side::Left => &self.left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub revision: String,
    pub arm: CalibrationTable,
    pub head: CalibrationTable,
    pub hand: HandCalibration,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::asymmetric()
    }
}

impl Calibration {
    /// Current hardware: right and left hands are not mirror images.
    pub fn asymmetric() -> Self {
        Self {
            revision: "asymmetric".into(),
            arm: Self::arm_table(),
            head: Self::head_table(),
            hand: HandCalibration {
                command: HandCommand::Set,
                right: CalibrationTable::from([
                    ("horizontal_right", 125),
                    ("vertical", 50),
                    ("horizontal_left", -25),
                ]),
                left: CalibrationTable::from([
                    ("horizontal_right", 115),
                    ("vertical", 57),
                    ("horizontal_left", 0),
                ]),
            },
        }
    }

    /// First hardware revision: one table shared by both hands, published
    /// under the action name.
    pub fn symmetric() -> Self {
        let hand = CalibrationTable::from([("up", 0), ("horizontal", 50), ("down", 100)]);
        Self {
            revision: "symmetric".into(),
            arm: Self::arm_table(),
            head: Self::head_table(),
            hand: HandCalibration {
                command: HandCommand::Action,
                right: hand.clone(),
                left: hand,
            },
        }
    }

    pub fn builtin(revision: &str) -> Result<Self, CalibrationError> {
        match revision {
            "asymmetric" => Ok(Self::asymmetric()),
            "symmetric" => Ok(Self::symmetric()),
            other => Err(CalibrationError::UnknownRevision(other.to_string())),
        }
    }

    pub fn builtin_revisions() -> &'static [&'static str] {
        &["asymmetric", "symmetric"]
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CalibrationError> {
        let calibration: Calibration = toml::from_str(raw)?;
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn from_file(path: &Path) -> Result<Self, CalibrationError> {
        let raw = fs::read_to_string(path).map_err(|source| CalibrationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (name, table) in [
            ("arm", &self.arm),
            ("head", &self.head),
            ("hand.right", &self.hand.right),
            ("hand.left", &self.hand.left),
        ] {
            if table.is_empty() {
                return Err(CalibrationError::EmptyTable(name));
            }
        }

        if let Some(shadowed) = self
            .arm
            .names()
            .find(|name| matches!(*name, "up" | "down"))
        {
            return Err(CalibrationError::ShadowedArmAction(shadowed.to_string()));
        }

        let right: BTreeSet<&str> = self.hand.right.names().collect();
        let left: BTreeSet<&str> = self.hand.left.names().collect();
        if right != left {
            return Err(CalibrationError::HandMismatch {
                right_only: right.difference(&left).map(|s| s.to_string()).collect(),
                left_only: left.difference(&right).map(|s| s.to_string()).collect(),
            });
        }

        Ok(())
    }

    fn arm_table() -> CalibrationTable {
        CalibrationTable::from([("middle", 50), ("quarter", 25), ("threequarter", 75)])
    }

    fn head_table() -> CalibrationTable {
        CalibrationTable::from([("left", 0), ("middle", 50), ("right", 100)])
    }
}

#[cfg(test)]
#[path = "tests/calibration_tests.rs"]
mod tests;
