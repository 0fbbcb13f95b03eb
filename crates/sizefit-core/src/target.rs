//! Target sizes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CompressionError;

/// Validated byte budget for one session: `0 < target_bytes < original_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionTarget {
    original_bytes: u64,
    target_bytes: u64,
}

impl CompressionTarget {
    pub fn new(original_bytes: u64, target_bytes: u64) -> Result<Self, CompressionError> {
        if target_bytes == 0 || target_bytes >= original_bytes {
            return Err(CompressionError::InvalidTarget {
                target_bytes,
                original_bytes,
            });
        }
        Ok(Self {
            original_bytes,
            target_bytes,
        })
    }

    pub fn original_bytes(&self) -> u64 {
        self.original_bytes
    }

    pub fn target_bytes(&self) -> u64 {
        self.target_bytes
    }
}

/// Unit a user-facing target is expressed in (1024 base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    Bytes,
    #[default]
    Kb,
    Mb,
}

impl SizeUnit {
    pub fn multiplier(self) -> f64 {
        match self {
            SizeUnit::Bytes => 1.0,
            SizeUnit::Kb => 1024.0,
            SizeUnit::Mb => 1024.0 * 1024.0,
        }
    }
}

/// A target such as `500KB` or `1.5MB`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSize {
    pub amount: f64,
    pub unit: SizeUnit,
}

#[derive(Debug, Error, PartialEq)]
pub enum TargetSizeError {
    #[error("Invalid target size: {0:?}")]
    Malformed(String),

    #[error("Unknown size unit: {0:?} (expected B, KB or MB)")]
    UnknownUnit(String),
}

impl TargetSize {
    pub fn from_unit(amount: f64, unit: SizeUnit) -> Self {
        Self { amount, unit }
    }

    /// Byte count, truncated. Negative or non-finite amounts yield 0.
    pub fn to_bytes(self) -> u64 {
        let bytes = self.amount * self.unit.multiplier();
        if bytes.is_finite() && bytes > 0.0 {
            bytes as u64
        } else {
            0
        }
    }
}

impl FromStr for TargetSize {
    type Err = TargetSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let amount: f64 = number
            .parse()
            .map_err(|_| TargetSizeError::Malformed(s.to_string()))?;

        let unit = match unit.trim().to_ascii_uppercase().as_str() {
            "" | "KB" | "K" => SizeUnit::Kb,
            "MB" | "M" => SizeUnit::Mb,
            "B" => SizeUnit::Bytes,
            other => return Err(TargetSizeError::UnknownUnit(other.to_string())),
        };

        Ok(Self { amount, unit })
    }
}
