use serde::{Deserialize, Serialize};
use std::fmt;

/// GPS vendor a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Trackimo,
    Arvento,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Trackimo, Provider::Arvento];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Trackimo => "trackimo",
            Provider::Arvento => "arvento",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
