//! Speed, volume and balance policy: reconciling the chain's
//! filters with the current [`crate::config::PlaybackSettings`] without
//! ever assuming ownership of a filter the coordinator didn't insert
//! itself, mirroring `update_speed_filters`/`audio_update_volume`/
//! `audio_update_balance` in `player/audio.c`.

use audiopipe_graph::{Arg, Chain, ControlCommand, ControlResult, ReplayGain};

use crate::config::PlaybackSettings;
use crate::error::BalanceError;

const AUTOSPEED_LABEL: &str = "autospeed";
const AUTOVOLUME_LABEL: &str = "autovolume";
const AUTOPAN_LABEL: &str = "autopan";

/// Reconciles the chain's tempo-scaling filter with `settings.speed` and
/// `settings.pitch_correction`.
///
/// Two methods, matching `get_speed_method`:
/// - pitch-preserving: a `scaletempo`-family filter absorbs the speed
///   change in the chain; the output sample rate is untouched.
/// - resampling: the chain's requested output rate itself is scaled,
///   letting `lavrresample` (or whatever sits at the negotiated tail)
///   do the pitch shift as a side effect of the rate change.
///
/// `base_output_rate` is the track's natural output rate before any
/// speed scaling is applied; `chain.output.rate` is mutated and the
/// chain renegotiated when the resample method is in effect.
pub fn update_speed(
    chain: &mut Chain,
    settings: &PlaybackSettings,
    base_output_rate: u32,
) -> Result<(), audiopipe_graph::NegotiationError> {
    if settings.pitch_correction {
        if chain.output.rate != base_output_rate {
            chain.output.rate = base_output_rate;
            audiopipe_graph::reinit(chain)?;
        }
        apply_tempo_speed(chain, settings.speed);
    } else {
        apply_tempo_speed(chain, 1.0);
        let target_rate = ((base_output_rate as f64) * settings.speed).round() as u32;
        if chain.output.rate != target_rate {
            chain.output.rate = target_rate;
            audiopipe_graph::reinit(chain)?;
        }
    }
    Ok(())
}

/// Sends `SetPlaybackSpeed` tail-to-head first, so a user's own tempo
/// filter is preferred over one the coordinator would insert itself
/// (`update_speed_filters`'s compatibility rule). Only inserts
/// `scaletempo` under [`AUTOSPEED_LABEL`] when nothing in the chain
/// claims the command and `speed != 1.0`.
fn apply_tempo_speed(chain: &mut Chain, speed: f64) {
    let accepted = chain.control_any_rev(|| ControlCommand::SetPlaybackSpeed(speed));
    if accepted {
        return;
    }
    if speed == 1.0 {
        let _ = chain.remove_by_label(AUTOSPEED_LABEL);
        return;
    }
    if chain.find_by_label(AUTOSPEED_LABEL).is_none() {
        let args = [Arg {
            key: "speed".into(),
            value: alloc::format!("{speed}"),
        }];
        let _ = chain.add("scaletempo", Some(AUTOSPEED_LABEL.into()), &args);
    }
    let _ = chain.control_by_label(AUTOSPEED_LABEL, || ControlCommand::SetPlaybackSpeed(speed));
}

/// Linear softvol gain from a `0..=100`-ish volume percentage, applying
/// the same cubic taper `audio_update_volume` uses so the quiet end of
/// the slider gets finer control than a plain linear mapping would.
fn softvol_gain(settings: &PlaybackSettings) -> f32 {
    if settings.mute {
        return 0.0;
    }
    let normalized = (settings.softvol_volume / 100.0).max(0.0);
    normalized * normalized * normalized
}

/// dB to a linear amplitude multiplier.
fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Replaygain contribution to the combined gain: track/album gain plus
/// preamp, clipped against the track's peak sample if clipping
/// protection is enabled, matching `compute_replaygain`. Falls back to
/// `settings.rgain_fallback_db` (or unity) when no replaygain metadata
/// is available and a mode is still selected.
fn replaygain_gain(rg: Option<ReplayGain>, settings: &PlaybackSettings) -> f32 {
    if settings.rgain_mode == 0 {
        return 1.0;
    }
    let Some(rg) = rg else {
        return settings
            .rgain_fallback_db
            .map(db_to_linear)
            .unwrap_or(1.0);
    };
    let mut gain = db_to_linear(rg.gain + settings.rgain_preamp_db);
    if settings.rgain_clip && rg.peak > 0.0 {
        let max_gain = 1.0 / rg.peak;
        gain = gain.min(max_gain);
    }
    gain
}

/// Reconciles the chain's volume filter with the combined softvol and
/// replaygain gain. Prefers a user's own `SetVolume`-accepting filter
/// (tail-to-head) before inserting one under [`AUTOVOLUME_LABEL`].
pub fn update_volume(chain: &mut Chain, settings: &PlaybackSettings, replaygain: Option<ReplayGain>) {
    let gain = softvol_gain(settings) * replaygain_gain(replaygain, settings);
    let accepted = chain.control_any_rev(|| ControlCommand::SetVolume(gain));
    if accepted {
        return;
    }
    if gain == 1.0 {
        let _ = chain.remove_by_label(AUTOVOLUME_LABEL);
        return;
    }
    if chain.find_by_label(AUTOVOLUME_LABEL).is_none() {
        let args = [Arg {
            key: "volume".into(),
            value: alloc::format!("{gain}"),
        }];
        let _ = chain.add("volume", Some(AUTOVOLUME_LABEL.into()), &args);
    }
    let _ = chain.control_by_label(AUTOVOLUME_LABEL, || ControlCommand::SetVolume(gain));
}

/// Reconciles stereo balance.
///
/// The original reaches for *any* filter named `pan` and overwrites its
/// matrix, even one the user built for an unrelated downmix — a known
/// bug. This crate resolves that open question by only ever touching a
/// filter it labelled [`AUTOPAN_LABEL`] itself: if the chain already has
/// an unlabelled `pan` filter a user added directly, balance control is
/// reported unavailable instead of clobbering it.
pub fn update_balance(chain: &mut Chain, balance: f32) -> Result<(), BalanceError> {
    if chain.find_by_label(AUTOPAN_LABEL).is_none() {
        if has_foreign_pan_filter(chain) {
            return Err(BalanceError::PanFilterOwnedByUser);
        }
        if balance == 0.0 {
            return Ok(());
        }
        let _ = chain.add("pan", Some(AUTOPAN_LABEL.into()), &[]);
    }
    let _ = chain.control_by_label(AUTOPAN_LABEL, || ControlCommand::SetPanBalance(balance));
    Ok(())
}

fn has_foreign_pan_filter(chain: &Chain) -> bool {
    chain
        .iter()
        .filter(|&id| !chain.is_sentinel(id))
        .any(|id| chain.get(id).name == "pan" && chain.get(id).label.as_deref() != Some(AUTOPAN_LABEL))
}
