use alloc::vec::Vec;

use audiopipe_core::{AudioConfig, Frame, PlanarBuffers};

/// The coordinator's own output-side buffer: accumulates frames read from
/// the chain's tail until there's enough to hand to the
/// [`crate::output::AudioOutput`], with the skip/prepend/duplicate
/// operations A/V sync needs.
///
/// Always interleaved PCM or a sequence of spdif bursts, matching
/// whatever format the AO was opened with — never planar, since this sits
/// downstream of every filter in the chain.
pub struct AoBuffer {
    config: AudioConfig,
    data: Vec<u8>,
    samples: u32,
}

impl AoBuffer {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            data: Vec::new(),
            samples: 0,
        }
    }

    /// Reconfigures the buffer for a newly (re)opened AO, discarding
    /// whatever was queued for the old format.
    pub fn reinit(&mut self, config: AudioConfig) {
        self.config = config;
        self.data.clear();
        self.samples = 0;
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    fn bytes_per_sample_frame(&self) -> usize {
        self.config.channels.num_channels() * self.config.format.bytes_per_sample()
    }

    /// Appends a frame's worth of samples, capped to at most `max_samples`
    /// more than what is already buffered. Returns how many samples were
    /// actually appended (the rest stays the caller's problem, mirroring
    /// `copy_output`'s `endpts`-driven partial append).
    pub fn append_capped(&mut self, frame: &Frame, max_samples: u32) -> u32 {
        debug_assert_eq!(frame.config, self.config);
        let room = max_samples.saturating_sub(self.samples);
        let take = frame.samples.min(room);
        if take == 0 {
            return 0;
        }
        match &frame.data {
            PlanarBuffers::Interleaved(bytes) | PlanarBuffers::Compressed(bytes) => {
                let stride = self.bytes_per_sample_frame().max(1);
                let take_bytes = (take as usize * stride).min(bytes.len());
                self.data.extend_from_slice(&bytes[..take_bytes]);
            }
            PlanarBuffers::Planar(_) => {
                // The chain always negotiates an interleaved tail output;
                // a planar frame reaching the AO buffer would be a filter
                // bug upstream, not something to silently paper over here.
                debug_assert!(false, "planar frame reached the AO buffer");
            }
        }
        self.samples += take;
        take
    }

    /// Removes the first `n` samples (at most what is buffered).
    pub fn skip(&mut self, n: u32) {
        let n = n.min(self.samples);
        let stride = self.bytes_per_sample_frame().max(1);
        let drop_bytes = (n as usize * stride).min(self.data.len());
        self.data.drain(0..drop_bytes);
        self.samples -= n;
    }

    /// Prepends `n` samples of silence.
    pub fn prepend_silence(&mut self, n: u32) {
        let stride = self.bytes_per_sample_frame().max(1);
        let silence_value = if self.config.format == audiopipe_core::SampleFormat::U8 {
            128u8
        } else {
            0u8
        };
        let mut silence = alloc::vec![silence_value; n as usize * stride];
        silence.extend_from_slice(&self.data);
        self.data = silence;
        self.samples += n;
    }

    /// Duplicates the last `n` buffered samples, appending them to the end
    /// (display-sync drift correction's "duplicate" path).
    pub fn duplicate(&mut self, n: u32) {
        let n = n.min(self.samples);
        if n == 0 {
            return;
        }
        let stride = self.bytes_per_sample_frame().max(1);
        let tail_start = self.data.len() - n as usize * stride;
        let tail = self.data[tail_start..].to_vec();
        self.data.extend_from_slice(&tail);
        self.samples += n;
    }

    /// Borrows up to `samples` worth of bytes from the front, without
    /// consuming them.
    pub fn peek(&self, samples: u32) -> (&[u8], u32) {
        let take = samples.min(self.samples);
        let stride = self.bytes_per_sample_frame().max(1);
        (&self.data[..take as usize * stride], take)
    }
}
