use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberRole {
    Coach,
    Student,
}

impl SubscriberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberRole::Coach => "coach",
            SubscriberRole::Student => "student",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "coach" => Some(SubscriberRole::Coach),
            "student" => Some(SubscriberRole::Student),
            _ => None,
        }
    }
}

impl Display for SubscriberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
