use std::path::PathBuf;

use thiserror::Error;

use crate::phantom::PhantomModel;

/// Problems with the inputs which make a dose calculation meaningless. These
/// abort the run.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unknown phantom model `{0}`; expected one of plane, cylinder, human, table, pad")]
    UnknownPhantomModel(String),

    #[error("the human phantom requires a mesh identifier")]
    MissingHumanMesh,

    #[error("phantom model {model:?} requires dimension `{field}`")]
    MissingDimension { model: PhantomModel, field: &'static str },

    #[error("event {event}: missing field `{field}`")]
    MissingEventField { event: usize, field: &'static str },

    #[error("event {event}: field `{field}` is malformed: {reason}")]
    MalformedEventField { event: usize, field: &'static str, reason: String },

    #[error("the event table contains no events")]
    EmptyEventTable,

    #[error("{0:?} phantom repositioned before its reference pose was saved")]
    ReferencePoseNotSaved(PhantomModel),

    #[error("could not read `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("could not parse `{path}`: {source}")]
    Toml { path: PathBuf, source: toml::de::Error },

    #[error("could not parse mesh `{path}`: {source}")]
    Mesh { path: PathBuf, source: binrw::Error },
}

/// Correction functions refuse to work on inputs they cannot give a meaningful
/// answer for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrectionError {
    #[error("correction requested for an empty set of hit cells")]
    EmptyHitSet,
}

/// A correction factor which could not be found in the lookup store. The
/// driver substitutes a neutral factor of 1 and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("event {event}: no {correction} value for {query}")]
pub struct LookupMiss {
    pub event: usize,
    pub correction: Correction,
    pub query: String,
}

/// The corrections which are read from the lookup store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Correction {
    HalfValueLayer,
    Backscatter,
    Medium,
    Table,
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::HalfValueLayer => "HVL",
            Self::Backscatter    => "backscatter (k_bs)",
            Self::Medium         => "medium (k_med)",
            Self::Table          => "table transmission (k_tab)",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Correction(#[from] CorrectionError),

    #[error("could not write `{path}`: {source}")]
    Output { path: PathBuf, source: std::io::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
