//! Domain models for radial slots and scene node references.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::QuickMenusError;

static DAG_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\|[^|\s\p{Cc}]+)+$").expect("valid DAG path pattern"));

/// One of the eight compass slots around a marking menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RadialPosition {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl RadialPosition {
    /// Canonical clockwise ordering starting at north.
    pub const ALL: [RadialPosition; 8] = [
        RadialPosition::N,
        RadialPosition::NE,
        RadialPosition::E,
        RadialPosition::SE,
        RadialPosition::S,
        RadialPosition::SW,
        RadialPosition::W,
        RadialPosition::NW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RadialPosition::N => "N",
            RadialPosition::NE => "NE",
            RadialPosition::E => "E",
            RadialPosition::SE => "SE",
            RadialPosition::S => "S",
            RadialPosition::SW => "SW",
            RadialPosition::W => "W",
            RadialPosition::NW => "NW",
        }
    }
}

impl fmt::Display for RadialPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RadialPosition {
    type Err = QuickMenusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_uppercase();
        RadialPosition::ALL
            .into_iter()
            .find(|position| position.as_str() == wanted)
            .ok_or_else(|| {
                QuickMenusError::invalid_argument(format!("unknown radial position '{value}'"))
            })
    }
}

/// Stable reference to a scene object, stored as a full `|`-separated DAG path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeRef(String);

impl NodeRef {
    /// Normalize a raw reference into its canonical form.
    ///
    /// Whitespace around the reference is ignored, a missing leading `|` is added and a trailing
    /// `|` is dropped. Empty path segments, inner whitespace and control characters are rejected.
    pub fn parse(raw: &str) -> Result<Self, QuickMenusError> {
        let trimmed = raw.trim();
        let body = trimmed.strip_suffix('|').unwrap_or(trimmed);
        let canonical = if body.starts_with('|') {
            body.to_owned()
        } else {
            format!("|{body}")
        };

        if DAG_PATH.is_match(&canonical) {
            Ok(Self(canonical))
        } else {
            Err(QuickMenusError::InvalidReference(raw.to_owned()))
        }
    }

    /// Normalize every reference, failing on the first one that cannot be resolved.
    pub fn parse_all<I, S>(raw: I) -> Result<Vec<Self>, QuickMenusError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter().map(|node| Self::parse(node.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, the name shown to artists.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('|').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeRef {
    type Error = QuickMenusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeRef> for String {
    fn from(value: NodeRef) -> Self {
        value.0
    }
}
