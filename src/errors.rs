#![allow(missing_docs)]

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Capacity cannot be zero")]
    ZeroCapacity,
    #[error("Capacity ({0}) is too large to allocate")]
    CapacityTooLarge(usize),
}
