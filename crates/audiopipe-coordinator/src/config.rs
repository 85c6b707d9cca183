/// How the coordinator tears down (or doesn't) the output device between
/// tracks. Named states for `opts->gapless_audio`'s tri-state int in the
/// original (`< 0`, `0`, `>= 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GaplessMode {
    /// Never gapless: the AO is torn down on every format change and the
    /// final chunk is flagged immediately.
    Disabled,
    /// "Weak" gapless: the AO is kept across tracks, but still drained
    /// and reopened the moment the decoder's format actually changes.
    Weak,
    /// Full gapless: the AO is never torn down between tracks; the final
    /// chunk flag is deferred until the device itself is uninitialized.
    Enabled,
}

/// The magic constants `fill_audio_out_buffers`/`get_sync_samples` use,
/// named instead of left as inline literals so a caller can tune them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoordinatorConfig {
    /// Whether to perform the initial sample-accurate sync at all
    /// (`opts->initial_audio_sync`).
    pub initial_audio_sync: bool,
    /// `ptsdiff` is clamped to `±ptsdiff_clamp_secs` before being turned
    /// into a skip/prepend sample count.
    pub ptsdiff_clamp_secs: f64,
    /// Above this `ptsdiff`, and if the audio and video tracks come from
    /// distinct demuxers, allow one refresh-seek retry instead of just
    /// skipping/prepending silence.
    pub second_chance_seek_threshold_secs: f64,
    /// A PTS jump bigger than this inside one track logs a warning
    /// (`fabs(desync) > 0.1` in `filter_audio`).
    pub pts_jump_warn_secs: f64,
    /// A PTS jump bigger than this triggers a full playback reset
    /// (`desync >= 5` in `filter_audio`).
    pub pts_reset_secs: f64,
    pub gapless_audio: GaplessMode,
    /// Seconds to wait after opening the AO before audio actually starts
    /// (`opts->audio_wait_open`); `0.0` disables the delay.
    pub audio_wait_open_secs: f64,
    /// Display-sync drop/duplicate throttle budget
    /// (`sync_max_audio_change + sync_max_video_change`), as a fraction.
    pub sync_drop_duplicate_budget: f64,
    /// Minimum |A/V difference| before a drop/duplicate correction is
    /// considered (`opts->sync_audio_drop_size`).
    pub sync_audio_drop_size_secs: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            initial_audio_sync: true,
            ptsdiff_clamp_secs: 3600.0,
            second_chance_seek_threshold_secs: 0.2,
            pts_jump_warn_secs: 0.1,
            pts_reset_secs: 5.0,
            gapless_audio: GaplessMode::Weak,
            audio_wait_open_secs: 0.0,
            sync_drop_duplicate_budget: 0.1,
            sync_audio_drop_size_secs: 0.017,
        }
    }
}

/// The user-facing knobs the speed/volume/balance controllers read every
/// time they're asked to reconcile the chain with current settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackSettings {
    pub speed: f64,
    pub pitch_correction: bool,
    /// `0..=100`-style volume percentage; `100.0` is unity gain before
    /// the cubic softvol curve and replaygain are applied.
    pub softvol_volume: f32,
    pub mute: bool,
    pub balance: f32,
    /// `1` = track gain, `2` = album gain, `0` = disabled.
    pub rgain_mode: u8,
    pub rgain_preamp_db: f32,
    pub rgain_clip: bool,
    pub rgain_fallback_db: Option<f32>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch_correction: true,
            softvol_volume: 100.0,
            mute: false,
            balance: 0.0,
            rgain_mode: 0,
            rgain_preamp_db: 0.0,
            rgain_clip: false,
            rgain_fallback_db: None,
        }
    }
}
