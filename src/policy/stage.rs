//! Pipeline stage definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline point of enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Before the user query leaves the application
    PreQuery,
    /// Before retrieval runs against the corpus
    PreRetrieval,
    /// After retrieval, before generation
    PostRetrieval,
    /// After generation, before the response is returned
    PostGeneration,
}

impl Stage {
    /// The wire name of the stage (`pre_query`, `pre_retrieval`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreQuery => "pre_query",
            Stage::PreRetrieval => "pre_retrieval",
            Stage::PostRetrieval => "post_retrieval",
            Stage::PostGeneration => "post_generation",
        }
    }

    /// All stages in pipeline order.
    pub fn all() -> [Stage; 4] {
        [
            Stage::PreQuery,
            Stage::PreRetrieval,
            Stage::PostRetrieval,
            Stage::PostGeneration,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "pre_query" => Ok(Stage::PreQuery),
            "pre_retrieval" => Ok(Stage::PreRetrieval),
            "post_retrieval" => Ok(Stage::PostRetrieval),
            "post_generation" => Ok(Stage::PostGeneration),
            other => Err(crate::Error::parse(format!("unknown stage: {other}"))),
        }
    }
}
