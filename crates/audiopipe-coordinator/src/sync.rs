//! Initial sample-accurate A/V sync (`get_sync_samples` in
//! `player/audio.c`): computed once, in the [`crate::state::AudioStatus::Syncing`]
//! state, before any audio is written to the device.

use crate::config::CoordinatorConfig;
use crate::decoder::DemuxerId;

/// What [`get_sync_samples`] decided to do with the first decoded chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncAction {
    /// Drop this many samples from the front of the first chunk; audio
    /// starts ahead of where the decoder put it.
    Skip(u32),
    /// Prepend this many samples of silence; audio starts behind.
    Prepend(u32),
    /// Neither: already in sync within a sample's tolerance.
    None,
    /// The desync is large and the audio/video tracks come from distinct
    /// demuxers — ask the caller to issue one refresh-seek and try the
    /// whole sync computation again, rather than stretching playback.
    RequestRefreshSeek,
}

/// Inputs to one sync decision.
pub struct SyncRequest {
    /// `pts` the first decoded audio frame is stamped with.
    pub frame_pts: f64,
    /// The playback position sync is targeting (typically the video
    /// frame's PTS, or the seek target with no video).
    pub sync_pts: f64,
    pub sample_rate: u32,
    /// Channel/sample-format alignment the skip must be a whole multiple
    /// of (`align` in the original — relevant for compressed/spdif
    /// frames where only whole bursts may be dropped).
    pub align: u32,
    pub audio_demuxer: Option<DemuxerId>,
    pub video_demuxer: Option<DemuxerId>,
    /// Whether a second-chance refresh-seek has already been tried once
    /// for this sync attempt (the original only ever allows one retry).
    pub refresh_seek_already_tried: bool,
}

/// Computes the skip/prepend/refresh-seek decision for the initial sync.
/// A `ptsdiff` outside `±ptsdiff_clamp_secs` is clamped first — a huge
/// diff almost always means a bad timestamp, not audio that genuinely
/// needs minutes of silence prepended.
pub fn get_sync_samples(req: &SyncRequest, cfg: &CoordinatorConfig) -> SyncAction {
    let mut ptsdiff = req.sync_pts - req.frame_pts;
    ptsdiff = ptsdiff.clamp(-cfg.ptsdiff_clamp_secs, cfg.ptsdiff_clamp_secs);

    if ptsdiff.abs() > cfg.second_chance_seek_threshold_secs
        && !req.refresh_seek_already_tried
        && distinct_demuxers(req.audio_demuxer, req.video_demuxer)
    {
        return SyncAction::RequestRefreshSeek;
    }

    if req.sample_rate == 0 || req.align == 0 {
        return SyncAction::None;
    }

    // ptsdiff > 0: audio starts later than the sync target, so samples
    // need to be dropped (skip) to catch it up. ptsdiff < 0: audio
    // starts earlier, so silence is prepended to delay it.
    let raw_samples = (ptsdiff.abs() * req.sample_rate as f64).round() as u32;
    let aligned_samples = (raw_samples / req.align) * req.align;
    if aligned_samples == 0 {
        return SyncAction::None;
    }

    if ptsdiff > 0.0 {
        SyncAction::Skip(aligned_samples)
    } else {
        SyncAction::Prepend(aligned_samples)
    }
}

fn distinct_demuxers(a: Option<DemuxerId>, b: Option<DemuxerId>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a != b,
        _ => false,
    }
}

/// What the continuous display-sync drift correction
/// ([`get_skip_duplicate_samples`]) decided to do against the rolling A/V
/// difference this iteration, distinct from [`SyncAction`]'s one-shot
/// initial placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipDuplicateAction {
    /// Drop this many already-buffered samples; audio is running ahead of
    /// the sync target.
    Skip(u32),
    /// Duplicate this many already-buffered samples; audio is running
    /// behind the sync target.
    Duplicate(u32),
    None,
}

/// Bounded, continuous drop/duplicate correction for display-sync drift
/// (`adjust_sync` in `player/audio.c`), applied every iteration once
/// already playing rather than only once at the start like
/// [`get_sync_samples`]. `diff_secs` uses the same sign convention as
/// `ptsdiff` there: `sync_pts - written_pts`, positive meaning audio has
/// fallen behind the target and needs to skip ahead, negative meaning it
/// is running ahead and needs a duplicated sample to hold it back.
///
/// Never corrects by more than `cfg.sync_drop_duplicate_budget` of
/// `playsize` samples in one call — a bigger jump in a single chunk would
/// be audible as a click — and does nothing at all while `diff_secs` is
/// within `cfg.sync_audio_drop_size_secs` of zero.
pub fn get_skip_duplicate_samples(
    diff_secs: f64,
    sample_rate: u32,
    playsize: u32,
    cfg: &CoordinatorConfig,
) -> SkipDuplicateAction {
    if sample_rate == 0 || playsize == 0 {
        return SkipDuplicateAction::None;
    }
    if diff_secs.abs() < cfg.sync_audio_drop_size_secs {
        return SkipDuplicateAction::None;
    }
    let budget = (playsize as f64 * cfg.sync_drop_duplicate_budget).floor() as u32;
    if budget == 0 {
        return SkipDuplicateAction::None;
    }
    let wanted = (diff_secs.abs() * sample_rate as f64).round() as u32;
    let n = wanted.clamp(1, budget);
    if diff_secs > 0.0 {
        SkipDuplicateAction::Skip(n)
    } else {
        SkipDuplicateAction::Duplicate(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CoordinatorConfig {
        CoordinatorConfig::default()
    }

    #[test]
    fn in_sync_within_one_sample_does_nothing() {
        let req = SyncRequest {
            frame_pts: 1.0,
            sync_pts: 1.0,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: None,
            video_demuxer: None,
            refresh_seek_already_tried: false,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::None);
    }

    #[test]
    fn audio_behind_video_skips_samples() {
        let req = SyncRequest {
            frame_pts: 1.0,
            sync_pts: 1.01,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: None,
            video_demuxer: None,
            refresh_seek_already_tried: false,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::Skip(480));
    }

    #[test]
    fn audio_ahead_of_video_prepends_silence() {
        let req = SyncRequest {
            frame_pts: 1.01,
            sync_pts: 1.0,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: None,
            video_demuxer: None,
            refresh_seek_already_tried: false,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::Prepend(480));
    }

    #[test]
    fn large_desync_with_distinct_demuxers_requests_refresh_seek() {
        let req = SyncRequest {
            frame_pts: 1.0,
            sync_pts: 3.0,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: Some(DemuxerId(1)),
            video_demuxer: Some(DemuxerId(2)),
            refresh_seek_already_tried: false,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::RequestRefreshSeek);
    }

    #[test]
    fn large_desync_with_same_demuxer_skips_instead_of_refresh_seek() {
        let req = SyncRequest {
            frame_pts: 1.0,
            sync_pts: 3.0,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: Some(DemuxerId(1)),
            video_demuxer: Some(DemuxerId(1)),
            refresh_seek_already_tried: false,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::Skip(96000));
    }

    #[test]
    fn already_tried_refresh_seek_falls_back_to_skip() {
        let req = SyncRequest {
            frame_pts: 1.0,
            sync_pts: 3.0,
            sample_rate: 48000,
            align: 1,
            audio_demuxer: Some(DemuxerId(1)),
            video_demuxer: Some(DemuxerId(2)),
            refresh_seek_already_tried: true,
        };
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::Skip(96000));
    }

    #[test]
    fn small_drift_within_threshold_does_nothing() {
        let cfg = cfg();
        let action = get_skip_duplicate_samples(cfg.sync_audio_drop_size_secs / 2.0, 48000, 4800, &cfg);
        assert_eq!(action, SkipDuplicateAction::None);
    }

    #[test]
    fn positive_drift_skips_bounded_by_budget() {
        let cfg = cfg();
        // Wanted correction (0.05s @ 48kHz = 2400 samples) exceeds the
        // 10% budget of a 4800-sample chunk, so it's capped at 480.
        let action = get_skip_duplicate_samples(0.05, 48000, 4800, &cfg);
        assert_eq!(action, SkipDuplicateAction::Skip(480));
    }

    #[test]
    fn negative_drift_duplicates_bounded_by_budget() {
        let cfg = cfg();
        let action = get_skip_duplicate_samples(-0.05, 48000, 4800, &cfg);
        assert_eq!(action, SkipDuplicateAction::Duplicate(480));
    }

    #[test]
    fn small_correction_within_budget_is_not_rounded_up_to_it() {
        let cfg = cfg();
        // 0.001s @ 48kHz = 48 samples, well under the 480-sample budget.
        let action = get_skip_duplicate_samples(0.001, 48000, 4800, &cfg);
        assert_eq!(action, SkipDuplicateAction::Skip(48));
    }

    #[test]
    fn zero_playsize_does_nothing() {
        let cfg = cfg();
        let action = get_skip_duplicate_samples(1.0, 48000, 0, &cfg);
        assert_eq!(action, SkipDuplicateAction::None);
    }

    #[test]
    fn skip_amount_rounds_down_to_alignment() {
        let req = SyncRequest {
            frame_pts: 0.0,
            sync_pts: 0.0305,
            sample_rate: 48000,
            align: 1536,
            audio_demuxer: None,
            video_demuxer: None,
            refresh_seek_already_tried: false,
        };
        // raw = 1464 samples, floored to the nearest 1536-sample burst: 0.
        assert_eq!(get_sync_samples(&req, &cfg()), SyncAction::None);
    }
}
