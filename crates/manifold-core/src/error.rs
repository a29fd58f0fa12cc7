//! Core error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::id::ResourceId;

#[derive(Error, Debug, Diagnostic)]
pub enum ManifestError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Duplicate(#[from] DuplicateResourceError),

    #[error("Invalid resource id '{id}': {reason}")]
    #[diagnostic(code(manifold::id::invalid))]
    InvalidId { id: String, reason: String },
}

impl ManifestError {
    /// The colliding id, if this is a duplicate definition
    pub fn duplicate_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Duplicate(dup) => Some(&dup.id),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;

/// A document that is not well-formed YAML or has malformed identity fields
#[derive(Error, Debug, Diagnostic)]
#[error("{source_label}{}: {message}", position_hint(.line, .column))]
#[diagnostic(code(manifold::decode))]
pub struct DecodeError {
    /// Label of the stream the document came from
    pub source_label: String,

    /// Index of the document within its stream
    pub document: usize,

    /// 1-based line within the stream, when known
    pub line: Option<usize>,

    /// 1-based column, when known
    pub column: Option<usize>,

    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl DecodeError {
    /// Whether the YAML itself is malformed, as opposed to the resource shape
    pub fn is_syntax_error(&self) -> bool {
        self.column.is_some()
    }
}

fn position_hint(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!(":{}:{}", line, column),
        (Some(line), None) => format!(":{}", line),
        _ => String::new(),
    }
}

/// Two documents resolving to the same resource id
#[derive(Error, Debug, Diagnostic)]
#[error("duplicate definition of '{id}' (in {first} and {second})")]
#[diagnostic(
    code(manifold::duplicate),
    help("each (namespace, kind, name) triple may be defined only once per load")
)]
pub struct DuplicateResourceError {
    pub id: ResourceId,
    /// Where the id was first defined
    pub first: String,
    /// Where the colliding definition was found
    pub second: String,
}
