/// Per-track replaygain metadata, as reported by the decoder/demuxer and
/// consumed by the volume controller's gain formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayGain {
    /// dB gain for the selected mode (track or album).
    pub gain: f32,
    /// Peak sample value, used to clamp gain so the track never clips.
    pub peak: f32,
}
