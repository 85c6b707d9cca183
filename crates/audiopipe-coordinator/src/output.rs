use audiopipe_core::AudioConfig;
use thiserror::Error;

/// An event the output device reports asynchronously (device reconfigured
/// underneath the stream, format changed, etc.), polled once per
/// [`crate::coordinator::PlaybackCoordinator::poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AoEvent {
    /// The device wants to be torn down and reopened (`AO_EVENT_RELOAD`).
    Reload,
}

/// Flags accompanying one [`AudioOutput::play`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayFlags {
    /// This is the last chunk of a non-gapless track (`AOPLAY_FINAL_CHUNK`).
    pub final_chunk: bool,
}

/// The external playback sink the coordinator writes negotiated audio to.
/// Modelled on `ao_get_space`/`ao_play`/`ao_reset`/`ao_get_delay`/
/// `ao_eof_reached`/`ao_get_format`, adapted to this crate's explicit
/// pull-model coordinator loop rather than firewheel's push-callback
/// audio thread.
pub trait AudioOutput: Send {
    /// The stream shape this device was opened with.
    fn format(&self) -> AudioConfig;

    /// Free space in the device's internal buffer, in samples.
    fn get_space(&self) -> u32;

    /// Writes up to `samples` frames of interleaved PCM (or one spdif
    /// burst) from `data`, returning how many were actually accepted.
    fn play(&mut self, data: &[u8], samples: u32, flags: PlayFlags) -> u32;

    /// Drops any buffered/in-flight audio (used on sync corrections that
    /// would otherwise make some AOs repeat stale data on underflow).
    fn reset(&mut self);

    /// Seconds of audio currently buffered inside the device, not yet
    /// audible.
    fn get_delay(&self) -> f64;

    /// Whether every sample previously written has finished playing.
    fn eof_reached(&self) -> bool;

    /// Blocks (conceptually; a `no_std` pull model never actually blocks
    /// here) until every buffered sample has played, used by gapless
    /// teardown.
    fn drain(&mut self);

    /// True for devices with no real internal timing (a null/dummy sink),
    /// the same case `ao_untimed` flags so the coordinator doesn't try to
    /// pace against a clock the device doesn't have.
    fn untimed(&self) -> bool {
        false
    }

    /// Drains and returns any pending device events.
    fn poll_events(&mut self) -> alloc::vec::Vec<AoEvent> {
        alloc::vec::Vec::new()
    }
}

/// Errors opening or reconfiguring an [`AudioOutput`].
#[derive(Debug, Error)]
pub enum AudioOutputError {
    #[error("no audio output device is available")]
    NoDeviceAvailable,
    #[error("requested format {0:?} is not supported by this device")]
    UnsupportedFormat(AudioConfig),
    #[error("audio output device failed to open: {0}")]
    OpenFailed(alloc::string::String),
}
