//! Artifact Builder: assembles completed chapters into downloadable EPUB/TXT
//! files and caches them on disk, rebuilding in the background when stale.

pub mod epub;
pub mod manager;
pub mod txt;

pub use manager::{ArtifactManager, ArtifactRequest, ArtifactStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Epub,
    Txt,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Epub => "epub",
            ArtifactKind::Txt => "txt",
        }
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epub" => Ok(ArtifactKind::Epub),
            "txt" => Ok(ArtifactKind::Txt),
            other => Err(anyhow::anyhow!("unknown artifact kind: {other}")),
        }
    }
}
