pub mod connections;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantType {
    #[serde(rename = "ORGANISATION")]
    Organisation,
    #[serde(rename = "PRACTICEMANAGER")]
    PracticeManager,
    #[serde(rename = "PRACTICE")]
    Practice,
    #[serde(other)]
    Other,
}

impl Display for TenantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organisation => f.write_str("ORGANISATION"),
            Self::PracticeManager => f.write_str("PRACTICEMANAGER"),
            Self::Practice => f.write_str("PRACTICE"),
            Self::Other => f.write_str("OTHER"),
        }
    }
}
