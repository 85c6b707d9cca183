//! A [`cpal`]-backed [`AudioOutput`] for the playback coordinator.
//!
//! Adapted from `firewheel-cpal`'s device enumeration and negotiation,
//! but restructured around this crate's pull model: instead of cpal's
//! audio thread pulling a processor callback, [`CpalOutput::play`] pushes
//! already-negotiated PCM into a lock-free ring buffer that the cpal
//! output callback drains on its own schedule.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use audiopipe_core::{AudioConfig, ChannelMap, SampleFormat, Speaker};
use audiopipe_coordinator::{AoEvent, AudioOutput, AudioOutputError, PlayFlags};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Observer, Producer, Split};

const BUILD_STREAM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
/// How much audio the ring buffer can hold, in seconds, ahead of the
/// device. Generous enough that `play` is never rejected by a full
/// buffer under normal `poll` pacing.
const RING_BUFFER_SECS: f64 = 2.0;

/// How to pick and configure the output device. Mirrors
/// `firewheel-cpal`'s `CpalOutputConfig`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpalOutputConfig {
    /// The host to use. `None` uses the system's default audio host.
    pub host: Option<cpal::HostId>,
    /// The name of the output device to use. `None` uses the system's
    /// default output device.
    pub device_name: Option<String>,
    /// Whether to fall back to the default device if the named device
    /// could not be found.
    pub fallback: bool,
}

/// An error occurred while trying to open a CPAL output stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamStartError {
    #[error("the requested audio output device was not found: {0}")]
    OutputDeviceNotFound(String),
    #[error("could not get audio devices: {0}")]
    FailedToGetDevices(#[from] cpal::DevicesError),
    #[error("failed to get default audio output device")]
    DefaultOutputDeviceNotFound,
    #[error("failed to get audio device configs: {0}")]
    FailedToGetConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error("failed to get audio device config: {0}")]
    FailedToGetConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build audio stream: {0}")]
    BuildStreamError(#[from] cpal::BuildStreamError),
    #[error("failed to play audio stream: {0}")]
    PlayStreamError(#[from] cpal::PlayStreamError),
    #[error("device has no supported configuration for {0:?}")]
    NoMatchingConfig(AudioConfig),
    #[error("audiopipe sample format {0} has no cpal equivalent")]
    UnsupportedSampleFormat(SampleFormat),
}

impl From<StreamStartError> for AudioOutputError {
    fn from(err: StreamStartError) -> Self {
        match err {
            StreamStartError::OutputDeviceNotFound(_) | StreamStartError::DefaultOutputDeviceNotFound => {
                AudioOutputError::NoDeviceAvailable
            }
            StreamStartError::NoMatchingConfig(cfg) => AudioOutputError::UnsupportedFormat(cfg),
            other => AudioOutputError::OpenFailed(other.to_string()),
        }
    }
}

/// Opens a CPAL output stream matching `desired` exactly (format,
/// channel count, sample rate), suitable for passing as the `open_output`
/// closure to `PlaybackCoordinator::new`.
///
/// Unlike `firewheel-cpal`'s negotiation, this never substitutes a
/// different channel count or sample rate: the filter chain has already
/// negotiated `desired` as its final output shape, so a silent
/// substitution here would just desync chain and device. If the device
/// can't produce `desired` exactly, the caller gets
/// [`AudioOutputError::UnsupportedFormat`] back and is expected to adjust
/// `desired_output` and renegotiate (the same way the coordinator already
/// retries a spdif format as PCM).
pub fn open(desired: &AudioConfig, config: &CpalOutputConfig) -> Result<CpalOutput, AudioOutputError> {
    open_inner(desired, config).map_err(AudioOutputError::from)
}

fn open_inner(desired: &AudioConfig, config: &CpalOutputConfig) -> Result<CpalOutput, StreamStartError> {
    if desired.format.is_spdif() || desired.format.is_planar() {
        return Err(StreamStartError::NoMatchingConfig(desired.clone()));
    }
    let sample_format = to_cpal_sample_format(desired.format)?;

    let host = match config.host {
        Some(id) => cpal::host_from_id(id).unwrap_or_else(|e| {
            log::warn!(
                "requested audio host {:?} is not available: {}. falling back to default host",
                id,
                e
            );
            cpal::default_host()
        }),
        None => cpal::default_host(),
    };

    let device = find_device(&host, config)?;
    let device_name = device.name().unwrap_or_else(|e| {
        log::warn!("failed to get name of output audio device: {}", e);
        String::from("unknown device")
    });

    let channels = desired.channels.num_channels() as u16;
    let mut matches = false;
    for supported in device.supported_output_configs()? {
        if supported.channels() == channels
            && supported.sample_format() == sample_format
            && supported.min_sample_rate().0 <= desired.rate
            && supported.max_sample_rate().0 >= desired.rate
        {
            matches = true;
            break;
        }
    }
    if !matches {
        return Err(StreamStartError::NoMatchingConfig(desired.clone()));
    }

    let stream_config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(desired.rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let bytes_per_frame = desired.format.bytes_per_sample() * desired.channels.num_channels();
    let ring_capacity = ((RING_BUFFER_SECS * desired.rate as f64) as usize * bytes_per_frame).max(bytes_per_frame);
    let (producer, mut consumer) = ringbuf::HeapRb::<u8>::new(ring_capacity).split();

    let queued_bytes = Arc::new(AtomicI64::new(0));
    let discard = Arc::new(AtomicBool::new(false));
    let reload = Arc::new(AtomicBool::new(false));

    let cb_queued = queued_bytes.clone();
    let cb_discard = discard.clone();
    let cb_reload = reload.clone();

    log::info!(
        "starting cpal output stream on device \"{}\" with {:?}",
        &device_name,
        &stream_config
    );

    let stream = match sample_format {
        cpal::SampleFormat::I16 => build_stream::<i16>(
            &device,
            &stream_config,
            consumer,
            cb_queued,
            cb_discard,
            cb_reload,
        ),
        cpal::SampleFormat::I32 => build_stream::<i32>(
            &device,
            &stream_config,
            consumer,
            cb_queued,
            cb_discard,
            cb_reload,
        ),
        cpal::SampleFormat::F32 => build_stream::<f32>(
            &device,
            &stream_config,
            consumer,
            cb_queued,
            cb_discard,
            cb_reload,
        ),
        cpal::SampleFormat::F64 => build_stream::<f64>(
            &device,
            &stream_config,
            consumer,
            cb_queued,
            cb_discard,
            cb_reload,
        ),
        cpal::SampleFormat::U8 => build_stream::<u8>(
            &device,
            &stream_config,
            consumer,
            cb_queued,
            cb_discard,
            cb_reload,
        ),
        other => return Err(StreamStartError::UnsupportedSampleFormat(from_cpal_sample_format(other))),
    }?;
    stream.play()?;

    Ok(CpalOutput {
        format: desired.clone(),
        producer,
        bytes_per_frame,
        queued_bytes,
        discard,
        reload,
        _stream: stream,
    })
}

fn find_device(host: &cpal::Host, config: &CpalOutputConfig) -> Result<cpal::Device, StreamStartError> {
    if let Some(name) = &config.device_name {
        let found = host
            .output_devices()?
            .find(|d| d.name().map(|n| &n == name).unwrap_or(false));
        if let Some(device) = found {
            return Ok(device);
        }
        if !config.fallback {
            return Err(StreamStartError::OutputDeviceNotFound(name.clone()));
        }
        log::warn!(
            "could not find requested audio output device: {}. falling back to default device",
            name
        );
    }
    host.default_output_device()
        .ok_or(StreamStartError::DefaultOutputDeviceNotFound)
}

/// Builds the cpal output stream for one concrete sample type, wiring its
/// callback to drain the ring buffer (writing silence on underrun) and to
/// honor a pending [`CpalOutput::reset`] by discarding whatever is queued.
fn build_stream<S>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: ringbuf::HeapCons<u8>,
    queued_bytes: Arc<AtomicI64>,
    discard: Arc<AtomicBool>,
    reload: Arc<AtomicBool>,
) -> Result<cpal::Stream, StreamStartError>
where
    S: cpal::SizedSample + 'static,
{
    let stream = device.build_output_stream(
        config,
        move |output: &mut [S], _info: &cpal::OutputCallbackInfo| {
            if discard.swap(false, Ordering::AcqRel) {
                let occupied = consumer.occupied_len();
                consumer.skip(occupied);
                queued_bytes.store(0, Ordering::Release);
            }

            // `output`'s element type is exactly the PCM sample type this
            // stream was negotiated with, so its byte representation is
            // identical to what `play` wrote into the ring buffer.
            let bytes: &mut [u8] = unsafe {
                core::slice::from_raw_parts_mut(
                    output.as_mut_ptr() as *mut u8,
                    core::mem::size_of_val(output),
                )
            };
            let filled = consumer.pop_slice(bytes);
            if filled < bytes.len() {
                bytes[filled..].fill(0);
            }
            queued_bytes.fetch_sub(filled as i64, Ordering::AcqRel);
        },
        move |err| {
            log::error!("cpal output stream error: {}", err);
            reload.store(true, Ordering::Release);
        },
        Some(BUILD_STREAM_TIMEOUT),
    )?;
    Ok(stream)
}

/// The live CPAL output stream. Writes go through a ring buffer the
/// stream's own audio callback drains; this struct never blocks.
pub struct CpalOutput {
    format: AudioConfig,
    producer: ringbuf::HeapProd<u8>,
    bytes_per_frame: usize,
    queued_bytes: Arc<AtomicI64>,
    discard: Arc<AtomicBool>,
    reload: Arc<AtomicBool>,
    _stream: cpal::Stream,
}

// cpal's `Stream` is not `Send` on every backend in principle, but none
// of the desktop backends this crate targets (ALSA, CoreAudio, WASAPI)
// expose a handle that is unsafe to move between threads once built; the
// stream is never touched from inside its own callback after this point.
unsafe impl Send for CpalOutput {}

impl AudioOutput for CpalOutput {
    fn format(&self) -> AudioConfig {
        self.format.clone()
    }

    fn get_space(&self) -> u32 {
        (self.producer.vacant_len() / self.bytes_per_frame.max(1)) as u32
    }

    fn play(&mut self, data: &[u8], samples: u32, _flags: PlayFlags) -> u32 {
        let want = (samples as usize * self.bytes_per_frame).min(data.len());
        let written = self.producer.push_slice(&data[..want]);
        self.queued_bytes.fetch_add(written as i64, Ordering::AcqRel);
        (written / self.bytes_per_frame.max(1)) as u32
    }

    fn reset(&mut self) {
        self.discard.store(true, Ordering::Release);
    }

    fn get_delay(&self) -> f64 {
        let queued = self.queued_bytes.load(Ordering::Acquire).max(0) as f64;
        let bytes_per_sec = self.bytes_per_frame.max(1) as f64 * self.format.rate.max(1) as f64;
        queued / bytes_per_sec
    }

    fn eof_reached(&self) -> bool {
        self.queued_bytes.load(Ordering::Acquire) <= 0
    }

    fn drain(&mut self) {
        // Nothing to do: the cpal callback keeps consuming the ring
        // buffer on its own schedule even with no further `play` calls.
    }

    fn poll_events(&mut self) -> Vec<AoEvent> {
        if self.reload.swap(false, Ordering::AcqRel) {
            vec![AoEvent::Reload]
        } else {
            Vec::new()
        }
    }
}

fn to_cpal_sample_format(format: SampleFormat) -> Result<cpal::SampleFormat, StreamStartError> {
    match format {
        SampleFormat::U8 => Ok(cpal::SampleFormat::U8),
        SampleFormat::S16 => Ok(cpal::SampleFormat::I16),
        SampleFormat::S32 => Ok(cpal::SampleFormat::I32),
        SampleFormat::Float32 => Ok(cpal::SampleFormat::F32),
        SampleFormat::Float64 => Ok(cpal::SampleFormat::F64),
        other => Err(StreamStartError::UnsupportedSampleFormat(other)),
    }
}

fn from_cpal_sample_format(format: cpal::SampleFormat) -> SampleFormat {
    match format {
        cpal::SampleFormat::U8 => SampleFormat::U8,
        cpal::SampleFormat::I16 => SampleFormat::S16,
        cpal::SampleFormat::I32 => SampleFormat::S32,
        cpal::SampleFormat::F32 => SampleFormat::Float32,
        cpal::SampleFormat::F64 => SampleFormat::Float64,
        _ => SampleFormat::Unknown,
    }
}

/// Lists the system's available output devices, in the natural channel
/// count order `firewheel-cpal::available_output_devices` reports.
pub fn available_output_devices() -> Vec<DeviceInfo> {
    let mut devices = Vec::with_capacity(8);
    let host = cpal::default_host();

    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    match host.output_devices() {
        Ok(output_devices) => {
            for device in output_devices {
                let Ok(name) = device.name() else { continue };
                let is_default = default_name.as_deref() == Some(name.as_str());
                let Ok(default_config) = device.default_output_config() else {
                    continue;
                };
                devices.push(DeviceInfo {
                    name,
                    num_channels: default_config.channels(),
                    is_default,
                });
            }
        }
        Err(e) => log::error!("failed to get output audio devices: {}", e),
    }
    devices
}

/// One entry in [`available_output_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub num_channels: u16,
    pub is_default: bool,
}

/// A default stereo speaker layout, convenient for requesting a
/// [`CpalOutput`] before a decoder has reported the real channel map.
pub fn default_stereo_channels() -> ChannelMap {
    ChannelMap::new([Speaker::FrontLeft, Speaker::FrontRight])
}
