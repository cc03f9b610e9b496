use thiserror::Error;

use crate::image::BoundsError;
use crate::io::{FormatError, RangeError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Range(#[from] RangeError),
}
