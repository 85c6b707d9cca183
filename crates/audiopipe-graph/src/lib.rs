#![cfg_attr(not(feature = "std"), no_std)]

//! The filter chain: format negotiation, pull/push frame propagation,
//! and whole-chain control dispatch.
//!
//! A [`Chain`] is a doubly linked pipeline of [`FilterInstance`]s with
//! fixed head/tail sentinels, backed by a `thunderdome` arena so filters
//! have a stable [`FilterId`] across insertions and removals — the
//! "arena + indices" realization of the linked list this domain is
//! usually described with.

extern crate alloc;

mod chain;
mod control;
mod descriptor;
mod dispatch;
mod error;
mod instance;
mod negotiation;
mod propagation;
mod replaygain;

pub use chain::{Chain, ChainState, FilterId};
pub use control::{ControlCommand, ControlResult};
pub use descriptor::{Alias, Arg, FilterDescriptor, Registry, BRIDGE_NAME};
pub use error::{ChainError, FilterRuntimeError, NegotiationError, OpenError};
pub use instance::{Filter, FilterInstance};
pub use negotiation::reinit;
pub use replaygain::ReplayGain;
