//! Content pack domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed content packs written into an app workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackName {
    Design,
    Layout,
    Screens,
    Onboarding,
    Config,
}

impl PackName {
    /// Every pack, in manifest declaration order
    pub const ALL: [PackName; 5] = [
        PackName::Design,
        PackName::Layout,
        PackName::Screens,
        PackName::Onboarding,
        PackName::Config,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackName::Design => "design",
            PackName::Layout => "layout",
            PackName::Screens => "screens",
            PackName::Onboarding => "onboarding",
            PackName::Config => "config",
        }
    }

    /// File name of the serialized pack, e.g. `design_pack.json`
    pub fn file_name(&self) -> String {
        format!("{}_pack.json", self.as_str())
    }
}

impl fmt::Display for PackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
