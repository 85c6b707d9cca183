use alloc::string::String;
use thiserror::Error;

use audiopipe_graph::{ChainError, FilterRuntimeError};

use crate::output::AudioOutputError;

/// Top-level error the coordinator's `poll` can surface. Most failures are
/// handled internally (format-change reinit, spdif fallback); this is
/// reserved for the ones that leave the coordinator unable to continue.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("filter chain error: {0}")]
    Chain(#[from] ChainError),

    #[error(transparent)]
    FilterRuntime(#[from] FilterRuntimeError),

    #[error("audio output error: {0}")]
    Output(#[from] AudioOutputError),

    #[error("balance control unavailable: {0}")]
    Balance(#[from] BalanceError),

    #[error("no output device factory succeeded: {0}")]
    NoOutputAvailable(String),
}

/// Why a balance-control request was rejected. The coordinator's balance
/// controller only ever touches a filter it created and labelled
/// `autopan` itself; it never reaches for an unlabelled user `pan` filter,
/// so a pre-existing one blocks balance control instead of being silently
/// overwritten.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    #[error("balance control is owned by a user-inserted pan filter and cannot be adjusted here")]
    PanFilterOwnedByUser,
}
