// src/errors.rs
//
// Error taxonomy for loading, compiling and playing back a scenario.
// Configuration and compilation errors are fatal to entering playback,
// animation failures only ever skip one animation for one tick.

use std::path::PathBuf;
use thiserror::Error;

/// Raised when the catalogue has no animation kind with the given tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown animation kind '{0}'")]
pub struct UnknownKindError(pub String);

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("malformed scenario configuration: {0}")]
    Malformed(String),

    #[error("cannot read scenario configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported scenario file format '{0}', expected .yaml, .yml or .json")]
    UnsupportedFormat(String),

    #[error("action '{action}': unknown animation kind '{kind}'")]
    UnknownKind { action: String, kind: String },

    #[error("action '{action}': animation '{kind}' is missing attributes [{}]", .missing.join(", "))]
    MissingAttribute {
        action: String,
        kind: String,
        missing: Vec<String>,
    },

    #[error("'{0}' must have at least one entry")]
    EmptyConfiguration(&'static str),

    #[error("action '{action}': 'animations' must contain at least one animation")]
    EmptyAnimations { action: String },

    #[error("action '{action}': start_at ({start}) is after end_at ({end})")]
    InvalidOffsets { action: String, start: u32, end: u32 },

    #[error("action '{action}': duration must be a positive integer")]
    InvalidDuration { action: String },
}

impl From<serde_yaml::Error> for ConfigurationError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigurationError::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    #[error("action '{action}': variable '{variable}' is not a parameter of the action")]
    UnboundVariable { action: String, variable: String },

    #[error("action '{action}': plan step has no argument for '{variable}' (position {index})")]
    MissingArgument {
        action: String,
        variable: String,
        index: usize,
    },

    #[error("anchor '{anchor}' for '{mobile}' is not a declared fixed position")]
    UnresolvedAnchor { anchor: String, mobile: String },

    #[error("predicate '{0}' is not declared by the domain")]
    UnknownPredicate(String),

    #[error("predicate '{predicate}' has no parameter '{parameter}'")]
    UnknownPredicateParameter { predicate: String, parameter: String },

    #[error("action '{action}': animation '{kind}' has no '{role}' entity")]
    MissingEntityRole {
        action: String,
        kind: String,
        role: &'static str,
    },

    #[error("action '{action}': attribute '{attribute}' must be {expected}")]
    InvalidAttribute {
        action: String,
        attribute: String,
        expected: &'static str,
    },

    #[error("action '{action}': timeline exceeds {max} ticks", max = u32::MAX)]
    TimelineOverflow { action: String },
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("invalid structure: {0}")]
    Structure(String),
}

/// Why a single animation did nothing on a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimationFailure {
    #[error("{kind}: entity '{entity}' does not exist")]
    MissingEntity { kind: &'static str, entity: String },

    #[error("{kind}: entity '{entity}' cannot target itself")]
    SelfReference { kind: &'static str, entity: String },

    #[error("{kind}: entity '{entity}' is loaded and frozen")]
    Frozen { kind: &'static str, entity: String },

    #[error("{kind}: '{entity}' is not loaded in '{container}'")]
    NotLoaded {
        kind: &'static str,
        entity: String,
        container: String,
    },

    #[error("{kind}: '{entity}' is already loaded in '{container}'")]
    AlreadyLoaded {
        kind: &'static str,
        entity: String,
        container: String,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("no config.toml next to the executable or in the working directory")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
