//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::CodecError;
use storage::repository::StorageError;

/// Errors emitted by session services.
///
/// `EmptySelection` and `Desync` are soft: the control surface turns them
/// into a redirect instead of failing the request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions match the selection")]
    EmptySelection,
    #[error("no active question for this request")]
    Desync,
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
