//! Event categories shown in the trace viewer

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a trace event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Preprocess,
    Function,
    Namespace,
    Struct,
    GimplePass,
    RtlPass,
    SimpleIpaPass,
    IpaPass,
    Unknown,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Preprocess => "PREPROCESS",
            EventCategory::Function => "FUNCTION",
            EventCategory::Namespace => "NAMESPACE",
            EventCategory::Struct => "STRUCT",
            EventCategory::GimplePass => "GIMPLE_PASS",
            EventCategory::RtlPass => "RTL_PASS",
            EventCategory::SimpleIpaPass => "SIMPLE_IPA_PASS",
            EventCategory::IpaPass => "IPA_PASS",
            EventCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_name_matches_display() {
        for category in [
            EventCategory::Preprocess,
            EventCategory::Function,
            EventCategory::Namespace,
            EventCategory::Struct,
            EventCategory::GimplePass,
            EventCategory::RtlPass,
            EventCategory::SimpleIpaPass,
            EventCategory::IpaPass,
            EventCategory::Unknown,
        ] {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }
}
