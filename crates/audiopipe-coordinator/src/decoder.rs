use audiopipe_core::Frame;

/// Opaque demuxer identity, used only to tell whether the audio and video
/// tracks come from distinct demuxers for the "second-chance" refresh-seek
/// heuristic in [`crate::sync::get_sync_samples`]. The coordinator never
/// does anything else with this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DemuxerId(pub u64);

/// `decode_new_frame`'s five-way result, renamed from the original's
/// `AD_*` integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A frame is ready; call [`Decoder::take_frame`] to claim it.
    Ok,
    /// No frame available yet; try again once the decoder signals more
    /// data is available.
    Wait,
    /// No frame yet, but calling again immediately might make progress
    /// (the decoder is mid-way through assembling one).
    NoProgress,
    /// The decoder is starved of input and cannot produce a frame until
    /// fed more compressed data from outside this crate.
    Starve,
    /// The stream is exhausted.
    Eof,
}

/// The external decode source the coordinator pulls frames from. Treated
/// as an opaque input interface — this crate only drives it, never
/// decodes anything itself.
pub trait Decoder: Send {
    /// Identity of the demuxer this track's packets come from.
    fn demuxer_id(&self) -> DemuxerId;

    /// Attempt to decode one frame, buffering it internally until
    /// [`Decoder::take_frame`] claims it. Must be idempotent: calling this
    /// again while a frame is already buffered returns [`DecodeOutcome::Ok`]
    /// without decoding another one.
    fn decode_new_frame(&mut self) -> DecodeOutcome;

    /// Claims the frame buffered by the most recent [`DecodeOutcome::Ok`].
    /// Returns `None` if nothing is buffered.
    fn take_frame(&mut self) -> Option<Frame>;

    /// Enables or disables spdif passthrough at the source, used by the
    /// coordinator's AO-open fallback: if opening a passthrough AO format
    /// fails, the coordinator disables spdif here and retries with PCM.
    fn set_try_spdif(&mut self, enabled: bool);
}
