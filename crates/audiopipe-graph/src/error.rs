use alloc::string::String;

use thiserror::Error;

/// A filter factory failed to build a filter. The filter (if partially
/// constructed) is discarded; the operation that triggered the build
/// fails without mutating prior chain state.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("unknown filter name {0:?}")]
    UnknownFilter(String),
    #[error("option parsing failed: {0}")]
    BadOptions(String),
    #[error("filter open callback failed: {0}")]
    OpenFailed(String),
}

/// `filter_frame`/`filter_out` returned an error. Logged against the
/// offending filter; the filter itself is left in place (runtime errors
/// do not remove filters).
#[derive(Debug, Error)]
#[error("filter {filter} failed while processing a frame: {reason}")]
pub struct FilterRuntimeError {
    pub filter: String,
    pub reason: String,
}

impl FilterRuntimeError {
    pub fn new(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            reason: reason.into(),
        }
    }
}

/// No arrangement of auto-conversions satisfies every adjacent pair. The
/// chain is left in `initialized = Err` until the next explicit
/// `init`/`uninit`. Carries a rendered chain snapshot with a marker at the
/// failing filter, mirroring the original's printed-chain diagnostic.
#[derive(Debug, Error)]
#[error("filter chain negotiation failed at {failing_filter}: {reason}\nchain: {chain_snapshot}")]
pub struct NegotiationError {
    pub failing_filter: String,
    pub reason: String,
    pub chain_snapshot: String,
}

/// Errors from chain mutation operations (`add`, `remove_by_label`, ...).
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("filter open failed: {0}")]
    Open(#[from] OpenError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("no filter labelled {0:?} was found")]
    LabelNotFound(String),
    #[error("a filter labelled {0:?} already exists")]
    DuplicateLabel(String),
    #[error(
        "removing the filter labelled {label:?} broke negotiation; the chain was fully \
         re-initialized and is left in the state before removal failed: {source}"
    )]
    RemoveReinitFailed {
        label: String,
        #[source]
        source: NegotiationError,
    },
}
