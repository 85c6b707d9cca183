#![cfg_attr(not(feature = "std"), no_std)]

//! The playback coordinator: ties a negotiated [`audiopipe_graph::Chain`]
//! to an external decoder and audio output device, running the
//! SYNCING→FILLING→READY→PLAYING→DRAINING→EOF state machine and the
//! speed/volume/balance policy controllers on top of it.
//!
//! Adapted from `player/audio.c`'s `fill_audio_out_buffers` around an
//! explicit, never-blocking `poll()` reentry point instead of a loop
//! living inside the player core, per this crate's external-interface
//! design: the coordinator pulls from a [`Decoder`] and pushes to an
//! [`AudioOutput`], both supplied by the host.

extern crate alloc;

mod buffer;
mod clock;
mod config;
mod controllers;
mod coordinator;
mod decoder;
mod error;
mod output;
mod state;
mod sync;

pub use clock::Clock;
pub use config::{CoordinatorConfig, GaplessMode, PlaybackSettings};
pub use coordinator::{PlaybackCoordinator, PollOutcome};
pub use decoder::{DecodeOutcome, Decoder, DemuxerId};
pub use error::{BalanceError, CoordinatorError};
pub use output::{AoEvent, AudioOutput, AudioOutputError, PlayFlags};
pub use state::AudioStatus;
pub use sync::{get_skip_duplicate_samples, get_sync_samples, SkipDuplicateAction, SyncAction, SyncRequest};
