use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::config::AudioConfig;

/// The sample storage backing a [`Frame`].
///
/// Filters that only need interleaved PCM convert lazily; planar storage
/// is kept distinct so a filter chain that starts and ends planar (the
/// common case for a decoder handing off planar float to a resampler)
/// never pays an interleave/deinterleave round trip it doesn't need.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanarBuffers {
    Interleaved(Vec<u8>),
    Planar(SmallVec<[Vec<u8>; 8]>),
    /// An opaque compressed bitstream (spdif passthrough). Filters must
    /// treat this as an unconvertible blob: no resampling, no channel
    /// remapping, no format conversion.
    Compressed(Vec<u8>),
}

impl PlanarBuffers {
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// A chunk of audio moving through the chain: a stream shape, a sample
/// count, an optional presentation timestamp, and the backing storage.
///
/// Frames are moved, not shared: every filter callback that accepts one
/// takes it by value (`Option<Frame>`), so ownership transfer is enforced
/// by the borrow checker instead of by a convention comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub config: AudioConfig,
    pub samples: u32,
    pub pts: Option<f64>,
    pub data: PlanarBuffers,
}

impl Frame {
    pub fn new(config: AudioConfig, samples: u32, pts: Option<f64>, data: PlanarBuffers) -> Self {
        Self {
            config,
            samples,
            pts,
            data,
        }
    }

    /// An empty interleaved frame at the given config, used as a
    /// zero-sample placeholder while a filter accumulates enough input to
    /// emit anything (e.g. scaletempo's internal window).
    pub fn empty(config: AudioConfig) -> Self {
        Self {
            config,
            samples: 0,
            pts: None,
            data: PlanarBuffers::Interleaved(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Presentation timestamp of the first sample *after* this frame,
    /// given this frame's own rate. `None` if this frame has no pts or is
    /// compressed (duration is encoder-defined for spdif).
    pub fn end_pts(&self) -> Option<f64> {
        if self.config.rate == 0 {
            return None;
        }
        self.pts
            .map(|pts| pts + self.samples as f64 / self.config.rate as f64)
    }
}
