//! Error kinds returned across this crate's public surface.

use thiserror::Error;

/// Errors surfaced to callers of [`crate::address_space`], [`crate::load`]
/// and [`crate::fault`].
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum VmError {
    /// Heap or frame allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// Null fault, out-of-region access, read-only violation, or a
    /// precondition went unmet. Delivered to user mode as a fatal fault
    /// signal by the host kernel's trap layer.
    #[error("invalid memory access")]
    InvalidAddress,

    /// The fault handler was invoked with an unrecognized fault kind.
    #[error("invalid argument")]
    InvalidArgument,
}

/// Errors internal to [`crate::page_table::PageTable::install`].
///
/// Never crosses this crate's public surface directly: every caller maps
/// it onto a [`VmError`] variant appropriate to its own contract.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub(crate) enum InstallError {
    #[error("out of memory")]
    OutOfMemory,

    /// A non-empty entry already occupies the target slot. The source
    /// treats this as a fault-handler bug; callers in this crate surface
    /// it to their own caller as [`VmError::InvalidAddress`].
    #[error("slot already mapped")]
    AlreadyMapped,
}

impl From<InstallError> for VmError {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::OutOfMemory => Self::OutOfMemory,
            InstallError::AlreadyMapped => Self::InvalidAddress,
        }
    }
}
