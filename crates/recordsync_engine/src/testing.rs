//! Record fixtures shared by unit tests.

use recordsync_cache::{Filter, Record};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Letter {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub status: String,
}

impl Record for Letter {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

pub(crate) fn letter(id: u64) -> Letter {
    Letter {
        id,
        subject: format!("Letter {id}"),
        status: "draft".into(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct LetterFilter {
    pub search: String,
    pub status: Option<String>,
}

impl LetterFilter {
    pub fn matching(term: &str) -> Self {
        Self {
            search: term.into(),
            status: None,
        }
    }
}

impl Filter for LetterFilter {
    fn search(&self) -> &str {
        &self.search
    }
}
