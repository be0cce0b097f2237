use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Modality a learner can consume course content in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Written,
    Visual,
    Audio,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::Written, ContentType::Visual, ContentType::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Written => "written",
            ContentType::Visual => "visual",
            ContentType::Audio => "audio",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content type: {0:?}")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "written" => Ok(ContentType::Written),
            "visual" => Ok(ContentType::Visual),
            "audio" => Ok(ContentType::Audio),
            _ => Err(UnknownContentType(s.to_string())),
        }
    }
}

/// Most frequent label in `interactions`. Ties go to the earlier entry of
/// [`ContentType::ALL`]; an empty slice yields `Written`.
pub fn most_frequent(interactions: &[ContentType]) -> ContentType {
    let mut counts = [0usize; 3];
    for kind in interactions {
        let idx = ContentType::ALL.iter().position(|k| k == kind).unwrap_or(0);
        counts[idx] += 1;
    }

    let mut best = 0;
    for idx in 1..counts.len() {
        if counts[idx] > counts[best] {
            best = idx;
        }
    }
    ContentType::ALL[best]
}
