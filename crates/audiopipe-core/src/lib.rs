#![cfg_attr(not(feature = "std"), no_std)]

//! Shared types for the `audiopipe` workspace: stream shapes, channel
//! layouts, and the frame type that moves through a filter chain.
//!
//! Nothing here knows about filters, chains, or playback; those live in
//! `audiopipe-graph` and `audiopipe-coordinator` respectively. This crate
//! is the vocabulary they share.

extern crate alloc;

mod channel;
mod config;
mod error;
mod format;
mod frame;

pub use channel::{ChannelMap, Speaker};
pub use config::AudioConfig;
pub use error::ConfigError;
pub use format::SampleFormat;
pub use frame::{Frame, PlanarBuffers};
