//! Ideological categories of the 2023 PASO vote.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PasoCategory {
    LeftWing,
    Progressivism,
    Centre,
    ModerateRightA,
    ModerateRightB,
    RightWingLibertarian,
    Blank,
    NoApply,
    NoResponse,
    Other,
}

impl PasoCategory {
    /// Categories shown in summaries and charts, in display order.
    pub const DISPLAY_ORDER: [PasoCategory; 6] = [
        PasoCategory::LeftWing,
        PasoCategory::Progressivism,
        PasoCategory::Centre,
        PasoCategory::ModerateRightA,
        PasoCategory::ModerateRightB,
        PasoCategory::RightWingLibertarian,
    ];

    pub const ALL: [PasoCategory; 10] = [
        PasoCategory::LeftWing,
        PasoCategory::Progressivism,
        PasoCategory::Centre,
        PasoCategory::ModerateRightA,
        PasoCategory::ModerateRightB,
        PasoCategory::RightWingLibertarian,
        PasoCategory::Blank,
        PasoCategory::NoApply,
        PasoCategory::NoResponse,
        PasoCategory::Other,
    ];

    /// Value as stored in `Categoria_PASO_2023`.
    pub fn as_str(self) -> &'static str {
        match self {
            PasoCategory::LeftWing => "Left_Wing",
            PasoCategory::Progressivism => "Progressivism",
            PasoCategory::Centre => "Centre",
            PasoCategory::ModerateRightA => "Moderate_Right_A",
            PasoCategory::ModerateRightB => "Moderate_Right_B",
            PasoCategory::RightWingLibertarian => "Right_Wing_Libertarian",
            PasoCategory::Blank => "Blank",
            PasoCategory::NoApply => "No apply",
            PasoCategory::NoResponse => "No response",
            PasoCategory::Other => "Other",
        }
    }

    /// Sentinel answers that are not an ideological position.
    pub fn is_sentinel(self) -> bool {
        matches!(
            self,
            PasoCategory::NoApply | PasoCategory::NoResponse | PasoCategory::Other
        )
    }

    pub fn label(self) -> String {
        display_label(self.as_str())
    }
}

impl fmt::Display for PasoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PasoCategory {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        PasoCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == trimmed)
            .ok_or_else(|| ModelError::UnknownCategory(trimmed.to_string()))
    }
}

/// Underscores become spaces; only the first letter stays upper-case.
pub fn display_label(text: &str) -> String {
    let spaced = text.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
