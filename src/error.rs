//! Error types shared across a run

use thiserror::Error;

use crate::manifest::ManifestError;
use crate::mirror::MirrorError;
use crate::paths::PathError;
use crate::scaffold::ScaffoldError;
use crate::source::SourceError;

/// Invalid command-line input that clap cannot reject on its own
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Unsupported option: --{0}")]
    UnsupportedProfile(String),
}

/// Any failure of an alignment run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Scaffold(#[from] ScaffoldError),
    #[error(transparent)]
    Mirror(#[from] MirrorError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Path(#[from] PathError),
}
