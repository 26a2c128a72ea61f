use std::path::PathBuf;
use thiserror::Error;

use crate::models::TransitionError;
use crate::oracle::OracleError;

#[derive(Error, Debug)]
pub enum SymbiosisError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Document parsing failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Reasoning service error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Persistence failure: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Unsupported file type: {0}. Only PDF, DOCX, and TXT are supported")]
    UnsupportedFileType(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Failed to resolve secret '{name}': {reason}")]
    Secret { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open file '{path}': {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Failures of the document-parsing collaborator. Any of these fails the
/// task that triggered the call.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parser unreachable at '{url}': {source}")]
    Unavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Parser rejected the document (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed parser response: {0}")]
    MalformedBody(String),
}

pub type Result<T> = std::result::Result<T, SymbiosisError>;
