/// The playback coordinator's state machine, one explicit enum standing
/// in for what would otherwise be a scatter of ad-hoc flags
/// (`draining`, `format_change_blocked`, an initial-sync boolean).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioStatus {
    /// Waiting on the initial sample-accurate sync against video (skip or
    /// prepend silence) before any audio is written to the device.
    Syncing,
    /// Accumulating decoded audio into the AO buffer; not yet full enough
    /// to start writing to the device.
    Filling,
    /// Buffer is full enough to play, but nothing has been written to the
    /// device yet this cycle.
    Ready,
    /// Actively writing buffered audio to the device.
    Playing,
    /// The decoder has reached EOF; writing out whatever remains buffered
    /// before declaring end of stream.
    Draining,
    /// Every sample has been written and the device has finished playing
    /// them; playback of this track is complete.
    Eof,
}

impl AudioStatus {
    /// Whether audio is still expected to reach the device from this state
    /// (i.e. not yet fully drained).
    pub fn is_active(self) -> bool {
        !matches!(self, AudioStatus::Eof)
    }
}

impl Default for AudioStatus {
    fn default() -> Self {
        AudioStatus::Syncing
    }
}
