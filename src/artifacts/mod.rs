//! Append-only persistence of plans and drafts.
//!
//! Each save writes a new Markdown file under `draftplan/` or `draftwriting/`;
//! nothing is ever overwritten or deleted by the program.

pub mod format;
pub mod naming;
mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use store::ArtifactStore;

pub const META_LEVEL: &str = "Academic Level";
pub const META_LENGTH: &str = "Length";
pub const META_TONE: &str = "Tone";

/// Header key/value pairs stored alongside an artifact body.
pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    Plan,
    Draft,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Plan, ArtifactKind::Draft];

    pub fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Plan => "plan",
            ArtifactKind::Draft => "draft",
        }
    }

    /// Subdirectory of the artifact root holding this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Plan => "draftplan",
            ArtifactKind::Draft => "draftwriting",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            ArtifactKind::Plan => "untitled_plan",
            ArtifactKind::Draft => "untitled_draft",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::Plan => "Theology Assignment Plan",
            ArtifactKind::Draft => "Theology Assignment Draft",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// File name of an artifact inside its kind directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Kind encoded in the name prefix; `None` for names this program never writes.
    pub fn kind(&self) -> Option<ArtifactKind> {
        let valid = !self.0.is_empty()
            && !self.0.contains(['/', '\\'])
            && !self.0.contains("..")
            && self.0.ends_with(".md");
        if !valid {
            return None;
        }
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| self.0.starts_with(&format!("{}_", kind.prefix())))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored plan or draft with its parsed header.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    pub topic: String,
    pub created_at: Option<NaiveDateTime>,
    pub metadata: Metadata,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
