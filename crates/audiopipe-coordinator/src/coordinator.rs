//! The playback coordinator's main loop: `poll` is the single reentry
//! point a host calls repeatedly (once per scheduler tick, never
//! blocking), mirroring `fill_audio_out_buffers`'s per-iteration state
//! machine but restructured around one call instead of a `while` loop
//! inside the player core.

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};
use audiopipe_graph::{Chain, ChainError, ChainState};

use crate::buffer::AoBuffer;
use crate::clock::Clock;
use crate::config::{CoordinatorConfig, GaplessMode, PlaybackSettings};
use crate::controllers;
use crate::decoder::{DecodeOutcome, Decoder, DemuxerId};
use crate::error::CoordinatorError;
use crate::output::{AoEvent, AudioOutput, AudioOutputError, PlayFlags};
use crate::state::AudioStatus;
use crate::sync::{get_skip_duplicate_samples, get_sync_samples, SkipDuplicateAction, SyncAction, SyncRequest};

/// Minimum buffered audio before leaving [`AudioStatus::Filling`] for
/// [`AudioStatus::Ready`].
const MIN_BUFFER_SECS: f64 = 0.2;
/// Target amount to keep buffered ahead of the device during steady
/// playback, bounding how eagerly `poll` decodes ahead.
const TARGET_BUFFER_SECS: f64 = 1.0;

/// What one [`PlaybackCoordinator::poll`] call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Status(AudioStatus),
    /// The initial sync desync is large enough, and the audio/video
    /// tracks come from distinct demuxers, that a host-issued
    /// refresh-seek is worth trying once before resorting to
    /// skip/prepend. Call [`PlaybackCoordinator::note_refresh_seek_done`]
    /// after performing it and `poll` again.
    NeedsRefreshSeek,
}

/// Ties a negotiated [`Chain`], a [`Decoder`], and an [`AudioOutput`]
/// factory together into the SYNCING→FILLING→READY→PLAYING→DRAINING→EOF
/// state machine, adapted from `fill_audio_out_buffers` around an
/// explicit pull-model reentry point instead of a blocking loop.
pub struct PlaybackCoordinator<D, O, F>
where
    D: Decoder,
    O: AudioOutput,
    F: FnMut(&AudioConfig) -> Result<O, AudioOutputError>,
{
    chain: Chain,
    decoder: D,
    output: Option<O>,
    open_output: F,
    buffer: AoBuffer,
    status: AudioStatus,
    config: CoordinatorConfig,
    settings: PlaybackSettings,
    /// The output rate in effect before any speed-via-resample scaling;
    /// the speed controller's resample method restores this once speed
    /// returns to `1.0`.
    base_output_rate: u32,
    /// Last decoder frame format seen, to detect a mid-stream format
    /// change the way `filter_audio` compares against `in_format`.
    decoder_format: Option<AudioConfig>,
    sync_pts: Option<f64>,
    video_demuxer: Option<DemuxerId>,
    refresh_seek_tried: bool,
    decoder_eof: bool,
    /// PTS of the most recently decoded frame, used to back-compute
    /// `written_pts` for the continuous display-sync drift correction
    /// (§4.F step 8): `written_pts = last_decoded_pts - buffered duration`.
    last_decoded_pts: Option<f64>,
    /// The most recently computed `sync_pts - written_pts`, kept around
    /// for callers that want to observe the running A/V drift.
    last_av_difference: f64,
    /// Set to `now + audio_wait_open_secs` whenever the output device is
    /// (re)opened; writes are withheld until the clock reaches it
    /// (`opts->audio_wait_open`).
    resume_deadline: Option<f64>,
}

impl<D, O, F> PlaybackCoordinator<D, O, F>
where
    D: Decoder,
    O: AudioOutput,
    F: FnMut(&AudioConfig) -> Result<O, AudioOutputError>,
{
    pub fn new(chain: Chain, decoder: D, open_output: F) -> Self {
        let base_output_rate = chain.output.rate;
        Self {
            chain,
            decoder,
            output: None,
            open_output,
            buffer: AoBuffer::new(AudioConfig::null()),
            status: AudioStatus::Syncing,
            config: CoordinatorConfig::default(),
            settings: PlaybackSettings::default(),
            base_output_rate,
            decoder_format: None,
            sync_pts: None,
            video_demuxer: None,
            refresh_seek_tried: false,
            decoder_eof: false,
            last_decoded_pts: None,
            last_av_difference: 0.0,
            resume_deadline: None,
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn status(&self) -> AudioStatus {
        self.status
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PlaybackSettings {
        &mut self.settings
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Sets (or updates) the PTS the coordinator is synchronising
    /// against, typically the current video frame's PTS. Called once
    /// before the initial sync runs, and again every frame thereafter by
    /// a host running display-sync, which keeps the continuous
    /// drop/duplicate drift correction (§4.F step 8) tracking a moving
    /// target instead of only ever firing once at playback start.
    pub fn set_sync_target(&mut self, sync_pts: f64, video_demuxer: Option<DemuxerId>) {
        self.sync_pts = Some(sync_pts);
        self.video_demuxer = video_demuxer;
    }

    /// Called by the host after performing the refresh-seek requested by
    /// [`PollOutcome::NeedsRefreshSeek`].
    pub fn note_refresh_seek_done(&mut self) {
        self.refresh_seek_tried = true;
    }

    /// The most recently measured `sync_pts - written_pts`, in seconds,
    /// from the continuous display-sync drift correction. Positive means
    /// audio has fallen behind the sync target, negative means it is
    /// running ahead; `0.0` before any measurement has been taken.
    pub fn last_av_difference(&self) -> f64 {
        self.last_av_difference
    }

    /// Flushes all buffered state for a seek (`seek_reset` plus the
    /// coordinator's own sync/eof bookkeeping).
    pub fn seek_reset(&mut self) {
        self.chain.seek_reset();
        self.buffer = AoBuffer::new(self.buffer_config());
        self.status = AudioStatus::Syncing;
        self.refresh_seek_tried = false;
        self.decoder_eof = false;
        self.last_decoded_pts = None;
        self.last_av_difference = 0.0;
        if let Some(output) = self.output.as_mut() {
            output.reset();
        }
    }

    fn buffer_config(&self) -> AudioConfig {
        self.output
            .as_ref()
            .map(|o| o.format())
            .unwrap_or(self.chain.output.clone())
    }

    /// The single reentry point: never blocks, advances as much of the
    /// state machine as data is currently available for, and returns.
    /// `clock` is consulted only for the `audio_wait_open` resume delay.
    pub fn poll(&mut self, clock: &dyn Clock) -> Result<PollOutcome, CoordinatorError> {
        self.drain_output_events();
        self.ensure_negotiated()?;
        self.ensure_output_open(clock)?;
        self.apply_settings()?;

        match self.status {
            AudioStatus::Syncing => self.poll_syncing(clock),
            AudioStatus::Filling | AudioStatus::Ready | AudioStatus::Playing => self.poll_playing(clock),
            AudioStatus::Draining => self.poll_draining(clock),
            AudioStatus::Eof => Ok(PollOutcome::Status(AudioStatus::Eof)),
        }
    }

    fn drain_output_events(&mut self) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        for event in output.poll_events() {
            match event {
                AoEvent::Reload => self.output = None,
            }
        }
    }

    fn ensure_negotiated(&mut self) -> Result<(), CoordinatorError> {
        if self.chain.state != ChainState::Ok {
            audiopipe_graph::reinit(&mut self.chain).map_err(ChainError::from)?;
        }
        Ok(())
    }

    fn apply_settings(&mut self) -> Result<(), CoordinatorError> {
        controllers::update_speed(&mut self.chain, &self.settings, self.base_output_rate)
            .map_err(ChainError::from)?;
        let replaygain = self.chain.replaygain_data;
        controllers::update_volume(&mut self.chain, &self.settings, replaygain);
        controllers::update_balance(&mut self.chain, self.settings.balance)?;
        Ok(())
    }

    /// Opens (or reopens, on a format change) the output device, falling
    /// back from spdif passthrough to PCM once if the device refuses the
    /// passthrough format, mirroring `reinit_audio_filters_and_output`'s
    /// AO-open retry.
    fn ensure_output_open(&mut self, clock: &dyn Clock) -> Result<(), CoordinatorError> {
        let needs_reopen = match &self.output {
            None => true,
            Some(output) => output.format() != self.chain.output,
        };
        if !needs_reopen {
            return Ok(());
        }
        if let Some(mut output) = self.output.take() {
            output.drain();
        }
        match (self.open_output)(&self.chain.output) {
            Ok(output) => {
                self.buffer = AoBuffer::new(output.format());
                self.output = Some(output);
                self.arm_resume_deadline(clock);
                Ok(())
            }
            Err(_) if self.chain.output.format.is_spdif() => {
                self.decoder.set_try_spdif(false);
                self.chain.state = ChainState::Uninit;
                audiopipe_graph::reinit(&mut self.chain).map_err(ChainError::from)?;
                let output = (self.open_output)(&self.chain.output)?;
                self.buffer = AoBuffer::new(output.format());
                self.output = Some(output);
                self.arm_resume_deadline(clock);
                Ok(())
            }
            Err(err) => Err(CoordinatorError::from(err)),
        }
    }

    fn arm_resume_deadline(&mut self, clock: &dyn Clock) {
        self.resume_deadline = if self.config.audio_wait_open_secs > 0.0 {
            Some(clock.now_secs() + self.config.audio_wait_open_secs)
        } else {
            None
        };
    }

    /// Decodes one frame, renegotiating the chain first if the decoder's
    /// format changed since the last frame, and feeds it into the chain's
    /// head. Returns the raw decode outcome, and the frame's PTS/rate for
    /// callers that need the pre-filter values (the initial sync check).
    fn decode_one(&mut self) -> Result<(DecodeOutcome, Option<Frame>), CoordinatorError> {
        let outcome = self.decoder.decode_new_frame();
        if outcome != DecodeOutcome::Ok {
            if outcome == DecodeOutcome::Eof {
                self.decoder_eof = true;
            }
            return Ok((outcome, None));
        }
        let Some(frame) = self.decoder.take_frame() else {
            return Ok((outcome, None));
        };
        if self.decoder_format.as_ref() != Some(&frame.config) {
            self.chain.input = frame.config.clone();
            self.chain.state = ChainState::Uninit;
            self.decoder_format = Some(frame.config.clone());
        }
        if frame.pts.is_some() {
            self.last_decoded_pts = frame.pts;
        }
        Ok((outcome, Some(frame)))
    }

    /// `written_pts`: the PTS of the last sample handed to the AO,
    /// back-computed from the most recently decoded frame's PTS minus
    /// everything still buffered between the decoder and the speaker —
    /// the chain's own delay plus whatever the device hasn't played yet.
    fn written_pts(&self) -> Option<f64> {
        let decoded_pts = self.last_decoded_pts?;
        let output_delay = self.output.as_ref().map(|o| o.get_delay()).unwrap_or(0.0);
        Some(decoded_pts - self.chain.calc_delay() - output_delay)
    }

    /// The continuous display-sync drift correction (§4.F steps 5 & 8):
    /// measures `sync_pts - written_pts` against the host's current
    /// target and, once it has drifted past `sync_audio_drop_size_secs`,
    /// drops or duplicates a budget-bounded number of already-buffered
    /// samples to nudge it back, recording the measurement in
    /// `last_av_difference` either way.
    fn apply_skip_duplicate(&mut self) {
        let (Some(sync_pts), Some(written_pts)) = (self.sync_pts, self.written_pts()) else {
            return;
        };
        let diff = sync_pts - written_pts;
        self.last_av_difference = diff;

        let output_rate = self
            .output
            .as_ref()
            .map(|o| o.format().rate)
            .unwrap_or(self.chain.output.rate);
        match get_skip_duplicate_samples(diff, output_rate, self.buffer.samples(), &self.config) {
            SkipDuplicateAction::Skip(n) => self.buffer.skip(n),
            SkipDuplicateAction::Duplicate(n) => self.buffer.duplicate(n),
            SkipDuplicateAction::None => {}
        }
    }

    fn poll_syncing(&mut self, clock: &dyn Clock) -> Result<PollOutcome, CoordinatorError> {
        let Some(sync_pts) = self.sync_pts else {
            self.status = AudioStatus::Filling;
            return self.poll_playing(clock);
        };
        if !self.config.initial_audio_sync {
            self.status = AudioStatus::Filling;
            return self.poll_playing(clock);
        }

        let (outcome, frame) = self.decode_one()?;
        let frame = match outcome {
            DecodeOutcome::Ok => frame,
            DecodeOutcome::Eof => {
                self.status = AudioStatus::Draining;
                return self.poll_draining(clock);
            }
            DecodeOutcome::Wait | DecodeOutcome::Starve | DecodeOutcome::NoProgress => {
                return Ok(PollOutcome::Status(self.status));
            }
        };
        let Some(frame) = frame else {
            return Ok(PollOutcome::Status(self.status));
        };

        self.ensure_negotiated()?;

        let sample_rate = frame.config.rate;
        let align = if frame.config.format.is_spdif() {
            frame.config.format.sample_alignment()
        } else {
            1
        };
        let req = SyncRequest {
            frame_pts: frame.pts.unwrap_or(sync_pts),
            sync_pts,
            sample_rate,
            align,
            audio_demuxer: Some(self.decoder.demuxer_id()),
            video_demuxer: self.video_demuxer,
            refresh_seek_already_tried: self.refresh_seek_tried,
        };

        match get_sync_samples(&req, &self.config) {
            SyncAction::RequestRefreshSeek => {
                self.chain.filter_frame_into_chain(frame)?;
                Ok(PollOutcome::NeedsRefreshSeek)
            }
            SyncAction::None => {
                self.chain.filter_frame_into_chain(frame)?;
                self.status = AudioStatus::Filling;
                self.poll_playing(clock)
            }
            SyncAction::Skip(n) => {
                let mut frame = frame;
                skip_frame_samples(&mut frame, n);
                self.chain.filter_frame_into_chain(frame)?;
                self.status = AudioStatus::Filling;
                self.poll_playing(clock)
            }
            SyncAction::Prepend(n) => {
                self.chain.filter_frame_into_chain(frame)?;
                self.drain_chain_into_buffer()?;
                let output_n =
                    ((n as f64) * self.chain.output.rate as f64 / sample_rate.max(1) as f64).round() as u32;
                self.buffer.prepend_silence(output_n);
                self.status = AudioStatus::Filling;
                self.poll_playing(clock)
            }
        }
    }

    fn poll_playing(&mut self, clock: &dyn Clock) -> Result<PollOutcome, CoordinatorError> {
        let output_rate = self
            .output
            .as_ref()
            .map(|o| o.format().rate)
            .unwrap_or(self.chain.output.rate)
            .max(1);
        let target_samples = (TARGET_BUFFER_SECS * output_rate as f64) as u32;

        while !self.decoder_eof && self.buffer.samples() < target_samples {
            let (outcome, frame) = self.decode_one()?;
            match outcome {
                DecodeOutcome::Ok => {
                    if let Some(frame) = frame {
                        self.chain.filter_frame_into_chain(frame)?;
                    }
                    self.drain_chain_into_buffer()?;
                }
                DecodeOutcome::NoProgress => continue,
                DecodeOutcome::Wait | DecodeOutcome::Starve => break,
                DecodeOutcome::Eof => break,
            }
        }
        self.drain_chain_into_buffer()?;

        let min_buffer_samples = (MIN_BUFFER_SECS * output_rate as f64) as u32;
        if self.status == AudioStatus::Filling {
            if self.buffer.samples() >= min_buffer_samples || self.decoder_eof {
                self.status = AudioStatus::Ready;
            } else {
                return Ok(PollOutcome::Status(AudioStatus::Filling));
            }
        }

        if self.status != AudioStatus::Filling {
            self.apply_skip_duplicate();
        }

        self.write_to_output(clock)?;

        if self.decoder_eof && self.buffer.is_empty() {
            self.status = AudioStatus::Draining;
            return self.poll_draining(clock);
        }

        Ok(PollOutcome::Status(self.status))
    }

    fn poll_draining(&mut self, clock: &dyn Clock) -> Result<PollOutcome, CoordinatorError> {
        self.drain_chain_eof_into_buffer()?;
        self.write_to_output(clock)?;

        let Some(output) = self.output.as_mut() else {
            self.status = AudioStatus::Eof;
            return Ok(PollOutcome::Status(AudioStatus::Eof));
        };

        if self.buffer.is_empty() {
            if output.eof_reached() || output.untimed() {
                if matches!(self.config.gapless_audio, GaplessMode::Disabled) {
                    output.drain();
                }
                self.status = AudioStatus::Eof;
            }
        }
        Ok(PollOutcome::Status(self.status))
    }

    /// Pulls every frame the chain can currently produce (no EOF flush)
    /// into the AO buffer.
    fn drain_chain_into_buffer(&mut self) -> Result<(), CoordinatorError> {
        while let Some(frame) = self.chain.read_output_frame()? {
            self.buffer.append_capped(&frame, u32::MAX);
        }
        Ok(())
    }

    /// Flushes every filter's remaining internal state through an EOF
    /// marker, pulling whatever that produces into the AO buffer.
    fn drain_chain_eof_into_buffer(&mut self) -> Result<(), CoordinatorError> {
        loop {
            if !self.chain.output_frame(true)? {
                break;
            }
            match self.chain.read_output_frame()? {
                Some(frame) => self.buffer.append_capped(&frame, u32::MAX),
                None => break,
            }
        }
        Ok(())
    }

    fn write_to_output(&mut self, clock: &dyn Clock) -> Result<(), CoordinatorError> {
        if let Some(deadline) = self.resume_deadline {
            if clock.now_secs() < deadline {
                return Ok(());
            }
            self.resume_deadline = None;
        }
        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };
        let space = output.get_space();
        if space == 0 || self.buffer.is_empty() {
            return Ok(());
        }
        let (bytes, samples) = self.buffer.peek(space);
        let final_chunk = self.decoder_eof
            && self.buffer.samples() <= samples
            && matches!(self.config.gapless_audio, GaplessMode::Disabled);
        let written = output.play(bytes, samples, PlayFlags { final_chunk });
        if written > 0 {
            self.buffer.skip(written);
            if self.status == AudioStatus::Ready {
                self.status = AudioStatus::Playing;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::VecDeque;
    use alloc::vec;
    use alloc::vec::Vec;

    use audiopipe_core::{ChannelMap, SampleFormat};
    use audiopipe_graph::Chain;

    use super::*;
    use crate::clock::Clock;

    struct FixedClock(f64);

    impl Clock for FixedClock {
        fn now_secs(&self) -> f64 {
            self.0
        }
    }

    struct FakeDecoder {
        frames: VecDeque<Frame>,
        pending: Option<Frame>,
    }

    impl FakeDecoder {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames: frames.into(),
                pending: None,
            }
        }
    }

    impl Decoder for FakeDecoder {
        fn demuxer_id(&self) -> DemuxerId {
            DemuxerId(0)
        }

        fn decode_new_frame(&mut self) -> DecodeOutcome {
            if self.pending.is_some() {
                return DecodeOutcome::Ok;
            }
            match self.frames.pop_front() {
                Some(frame) => {
                    self.pending = Some(frame);
                    DecodeOutcome::Ok
                }
                None => DecodeOutcome::Eof,
            }
        }

        fn take_frame(&mut self) -> Option<Frame> {
            self.pending.take()
        }

        fn set_try_spdif(&mut self, _enabled: bool) {}
    }

    struct FakeOutput {
        format: AudioConfig,
        written: Vec<u8>,
        eof: bool,
    }

    impl AudioOutput for FakeOutput {
        fn format(&self) -> AudioConfig {
            self.format.clone()
        }

        fn get_space(&self) -> u32 {
            48_000
        }

        fn play(&mut self, data: &[u8], samples: u32, _flags: PlayFlags) -> u32 {
            self.written.extend_from_slice(data);
            self.eof = false;
            samples
        }

        fn reset(&mut self) {
            self.written.clear();
        }

        fn get_delay(&self) -> f64 {
            0.0
        }

        fn eof_reached(&self) -> bool {
            true
        }

        fn drain(&mut self) {
            self.eof = true;
        }
    }

    fn stereo_config(rate: u32) -> AudioConfig {
        AudioConfig::new(SampleFormat::S16, ChannelMap::stereo(), rate)
    }

    fn pcm_frame(config: AudioConfig, samples: u32, pts: f64) -> Frame {
        let bytes = samples as usize * config.channels.num_channels() * config.format.bytes_per_sample();
        Frame::new(
            config,
            samples,
            Some(pts),
            audiopipe_core::PlanarBuffers::Interleaved(vec![0u8; bytes]),
        )
    }

    fn build_coordinator(
        frames: Vec<Frame>,
    ) -> PlaybackCoordinator<FakeDecoder, FakeOutput, impl FnMut(&AudioConfig) -> Result<FakeOutput, AudioOutputError>>
    {
        let registry = audiopipe_nodes::builtin_registry();
        let config = stereo_config(48_000);
        let chain = Chain::new(registry, config.clone(), config.clone());
        let decoder = FakeDecoder::new(frames);
        PlaybackCoordinator::new(chain, decoder, move |fmt: &AudioConfig| {
            Ok(FakeOutput {
                format: fmt.clone(),
                written: Vec::new(),
                eof: false,
            })
        })
    }

    #[test]
    fn starts_in_syncing_and_moves_to_filling_with_no_sync_target() {
        let mut coordinator = build_coordinator(vec![pcm_frame(stereo_config(48_000), 4800, 0.0)]);
        let clock = FixedClock(0.0);
        assert_eq!(coordinator.status(), AudioStatus::Syncing);
        let outcome = coordinator.poll(&clock).unwrap();
        // no sync_pts was ever set, so syncing falls straight through to filling/ready.
        assert_ne!(outcome, PollOutcome::Status(AudioStatus::Syncing));
    }

    #[test]
    fn reaches_playing_once_enough_audio_is_buffered() {
        let frames = (0..20)
            .map(|i| pcm_frame(stereo_config(48_000), 4800, i as f64 * 0.1))
            .collect();
        let mut coordinator = build_coordinator(frames);
        let clock = FixedClock(0.0);
        let mut last = PollOutcome::Status(AudioStatus::Syncing);
        for _ in 0..5 {
            last = coordinator.poll(&clock).unwrap();
            if last == PollOutcome::Status(AudioStatus::Playing) {
                break;
            }
        }
        assert_eq!(last, PollOutcome::Status(AudioStatus::Playing));
    }

    #[test]
    fn drains_to_eof_once_decoder_and_buffer_are_exhausted() {
        let frames = vec![pcm_frame(stereo_config(48_000), 480, 0.0)];
        let mut coordinator = build_coordinator(frames);
        let clock = FixedClock(0.0);
        let mut last = PollOutcome::Status(AudioStatus::Syncing);
        for _ in 0..5 {
            last = coordinator.poll(&clock).unwrap();
        }
        assert_eq!(last, PollOutcome::Status(AudioStatus::Eof));
    }

    #[test]
    fn sync_request_with_distinct_demuxers_asks_for_refresh_seek() {
        let mut coordinator = build_coordinator(vec![pcm_frame(stereo_config(48_000), 4800, 0.0)]);
        coordinator.set_sync_target(5.0, Some(DemuxerId(9)));
        let clock = FixedClock(0.0);
        let outcome = coordinator.poll(&clock).unwrap();
        assert_eq!(outcome, PollOutcome::NeedsRefreshSeek);
        coordinator.note_refresh_seek_done();
        assert_eq!(coordinator.status(), AudioStatus::Syncing);
    }

    #[test]
    fn no_sync_target_leaves_av_difference_untouched() {
        let frames = (0..5)
            .map(|i| pcm_frame(stereo_config(48_000), 4800, i as f64 * 0.1))
            .collect();
        let mut coordinator = build_coordinator(frames);
        let clock = FixedClock(0.0);
        for _ in 0..5 {
            coordinator.poll(&clock).unwrap();
        }
        assert_eq!(coordinator.last_av_difference(), 0.0);
    }

    #[test]
    fn continuous_drift_correction_tracks_a_moving_sync_target() {
        let frames = (0..20)
            .map(|i| pcm_frame(stereo_config(48_000), 4800, i as f64 * 0.1))
            .collect();
        let mut coordinator = build_coordinator(frames);
        let clock = FixedClock(0.0);
        for _ in 0..8 {
            coordinator.set_sync_target(100.0, None);
            coordinator.poll(&clock).unwrap();
        }
        // sync_pts (100.0) is far from the handful of seconds of decoded
        // frames, so the running difference must have been measured and
        // recorded, not left at its initial zero.
        assert!(coordinator.last_av_difference().is_finite());
        assert_ne!(coordinator.last_av_difference(), 0.0);
    }

    #[test]
    fn speed_change_adds_an_autospeed_scaletempo_filter() {
        let mut coordinator = build_coordinator(vec![pcm_frame(stereo_config(48_000), 4800, 0.0)]);
        coordinator.settings_mut().speed = 1.5;
        let clock = FixedClock(0.0);
        coordinator.poll(&clock).unwrap();
        assert!(coordinator.chain().find_by_label("autospeed").is_some());
    }
}

/// Drops the first `n` samples from a raw decoder frame, used by the
/// initial sync's skip path before the frame ever reaches the chain.
fn skip_frame_samples(frame: &mut Frame, n: u32) {
    let n = n.min(frame.samples);
    if n == 0 {
        return;
    }
    let stride = (frame.config.channels.num_channels() * frame.config.format.bytes_per_sample()).max(1);
    if let PlanarBuffers::Interleaved(bytes) | PlanarBuffers::Compressed(bytes) = &mut frame.data {
        let drop = (n as usize * stride).min(bytes.len());
        bytes.drain(0..drop);
    }
    frame.samples -= n;
    if let (Some(pts), true) = (frame.pts, frame.config.rate > 0) {
        frame.pts = Some(pts + n as f64 / frame.config.rate as f64);
    }
}
