#![cfg_attr(not(feature = "std"), no_std)]

//! An audio filter chain engine and playback coordinator.
//!
//! This crate re-exports the workspace's member crates behind feature
//! flags, one aggregation point for the whole workspace:
//!
//! - [`audiopipe_core`] — `AudioConfig`, `SampleFormat`, `ChannelMap`, `Frame`.
//! - [`audiopipe_graph`] — the filter chain, negotiation, and propagation engine.
//! - [`audiopipe_nodes`] — the built-in filter catalogue.
//! - [`audiopipe_coordinator`] — the playback state machine.
//! - [`audiopipe_cpal`] — a `cpal`-backed [`audiopipe_coordinator::AudioOutput`].

pub use audiopipe_core as core;
pub use audiopipe_coordinator as coordinator;
pub use audiopipe_graph as graph;
pub use audiopipe_nodes as nodes;

#[cfg(feature = "cpal")]
pub use audiopipe_cpal as cpal_backend;

pub mod prelude {
    pub use crate::core::{AudioConfig, ChannelMap, Frame, SampleFormat};
    pub use crate::coordinator::{AudioStatus, PlaybackCoordinator};
    pub use crate::graph::{Chain, FilterDescriptor, FilterId};
    pub use crate::nodes::builtin_registry;
}
