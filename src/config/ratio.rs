//! Aspect-ratio labels.
//!
//! The set is closed: a label that does not parse is an `InvalidRatio`
//! error before any table is consulted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, LookupTable};

/// Canonical aspect-ratio identifier, used both to pick a capture resolution
/// and an output canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RatioLabel {
    /// "16:9"
    Wide16x9,
    /// "9:16"
    Tall9x16,
    /// "4:3"
    Wide4x3,
    /// "3:4"
    Tall3x4,
}

impl RatioLabel {
    /// Every label, landscape first.
    pub const ALL: [RatioLabel; 4] = [
        RatioLabel::Wide16x9,
        RatioLabel::Tall9x16,
        RatioLabel::Wide4x3,
        RatioLabel::Tall3x4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RatioLabel::Wide16x9 => "16:9",
            RatioLabel::Tall9x16 => "9:16",
            RatioLabel::Wide4x3 => "4:3",
            RatioLabel::Tall3x4 => "3:4",
        }
    }

    /// Parse a label, reporting failures as `InvalidRatio`.
    pub fn parse(label: &str) -> Result<Self, CaptureError> {
        label.parse()
    }

    /// True for the portrait labels (height > width).
    pub fn is_portrait(self) -> bool {
        matches!(self, RatioLabel::Tall9x16 | RatioLabel::Tall3x4)
    }

    /// The same ratio with sides exchanged.
    pub fn transposed(self) -> Self {
        match self {
            RatioLabel::Wide16x9 => RatioLabel::Tall9x16,
            RatioLabel::Tall9x16 => RatioLabel::Wide16x9,
            RatioLabel::Wide4x3 => RatioLabel::Tall3x4,
            RatioLabel::Tall3x4 => RatioLabel::Wide4x3,
        }
    }

    /// Ratio the camera is opened with when this ratio is selected for the
    /// document. Sensors deliver landscape frames, so portrait selections
    /// capture in the matching landscape mode.
    pub fn capture_ratio(self) -> Self {
        if self.is_portrait() { self.transposed() } else { self }
    }
}

impl fmt::Display for RatioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatioLabel {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RatioLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s.trim())
            .ok_or_else(|| CaptureError::invalid_ratio(s, LookupTable::Parse))
    }
}

impl TryFrom<String> for RatioLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(|e: CaptureError| e.to_string())
    }
}

impl From<RatioLabel> for String {
    fn from(label: RatioLabel) -> Self {
        label.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_label() {
        for label in RatioLabel::ALL {
            assert_eq!(RatioLabel::parse(label.as_str()).unwrap(), label);
        }
        assert_eq!(RatioLabel::parse(" 4:3 ").unwrap(), RatioLabel::Wide4x3);
    }

    #[test]
    fn unknown_label_is_invalid_ratio() {
        let err = RatioLabel::parse("5:4").unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidRatio { table: LookupTable::Parse, .. }
        ));
    }

    #[test]
    fn portrait_selections_capture_in_landscape() {
        assert_eq!(RatioLabel::Tall3x4.capture_ratio(), RatioLabel::Wide4x3);
        assert_eq!(RatioLabel::Wide4x3.capture_ratio(), RatioLabel::Wide4x3);
        assert_eq!(RatioLabel::Tall9x16.capture_ratio(), RatioLabel::Wide16x9);
        assert_eq!(RatioLabel::Wide16x9.capture_ratio(), RatioLabel::Wide16x9);
    }

    #[test]
    fn serializes_as_plain_label() {
        let json = serde_json::to_string(&RatioLabel::Tall9x16).unwrap();
        assert_eq!(json, "\"9:16\"");
        let back: RatioLabel = serde_json::from_str("\"3:4\"").unwrap();
        assert_eq!(back, RatioLabel::Tall3x4);
        assert!(serde_json::from_str::<RatioLabel>("\"1:1\"").is_err());
    }
}
