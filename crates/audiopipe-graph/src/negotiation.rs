//! The format-negotiation algorithm: per-filter reinit, auto-conversion
//! insertion, the two-pass "move conversion up" chain rebuild, and the
//! spdif-mismatch exception.

use alloc::string::ToString;

use audiopipe_core::AudioConfig;

use crate::chain::{Chain, ChainState, FilterId};
use crate::control::{ControlCommand, ControlResult};
use crate::error::NegotiationError;

fn negotiation_error(chain: &mut Chain, failing: FilterId, reason: &str) -> NegotiationError {
    chain.state = ChainState::Err;
    NegotiationError {
        failing_filter: chain.get(failing).debug_label(),
        reason: reason.to_string(),
        chain_snapshot: chain.render_snapshot(Some(failing)),
    }
}

fn negotiation_error_open(
    chain: &mut Chain,
    near: FilterId,
    err: crate::error::OpenError,
) -> NegotiationError {
    chain.state = ChainState::Err;
    NegotiationError {
        failing_filter: alloc::format!("auto-insert near {}", chain.get(near).debug_label()),
        reason: err.to_string(),
        chain_snapshot: chain.render_snapshot(Some(near)),
    }
}

/// Runs `control(REINIT)` on one filter against its predecessor's current
/// output, recording the negotiated `fmt_in`/`fmt_out` on success.
///
/// `desired_output`, when given, is passed through as a hint for filters
/// (like the resampler) whose chosen output depends on what comes next —
/// this is how a forced predecessor reinit communicates the target format
/// it needs to produce.
fn per_filter_reinit(
    chain: &mut Chain,
    id: FilterId,
    desired_output: Option<&AudioConfig>,
) -> ControlResult {
    let pred = chain
        .prev(id)
        .expect("every non-head filter has a predecessor");
    let mut input = chain.get(pred).fmt_out.clone();
    if !input.is_valid() {
        return ControlResult::Error;
    }
    let original = input.clone();

    let result = chain
        .get_mut(id)
        .filter
        .control(ControlCommand::Reinit {
            input: &mut input,
            desired_output,
        });
    let result = if result == ControlResult::Ok && input != original {
        ControlResult::False
    } else {
        result
    };

    chain.get_mut(id).fmt_in = input;

    if result == ControlResult::Ok {
        let out = chain.get(id).filter.fmt_out();
        if !out.is_valid() {
            return ControlResult::Error;
        }
        chain.get_mut(id).fmt_out = out;
    }

    result
}

/// Per-filter reinit, escalating to auto-conversion insertion on `FALSE`:
/// first try renegotiating the predecessor's output to the desired
/// input, then fall back to inserting an auto `lavrresample` filter.
fn filter_reinit_with_conversion(
    chain: &mut Chain,
    id: FilterId,
) -> Result<ControlResult, NegotiationError> {
    let first = per_filter_reinit(chain, id, None);
    if first != ControlResult::False {
        return Ok(first);
    }

    let desired_in = chain.get(id).fmt_in.clone();
    let pred = chain.prev(id).expect("non-head filter has a predecessor");

    if pred != chain.head_id() && chain.get(pred).fmt_out != desired_in {
        chain.get_mut(pred).fmt_out = desired_in.clone();
        let pred_result = per_filter_reinit(chain, pred, Some(&desired_in));
        if pred_result != ControlResult::Ok {
            return Err(negotiation_error(
                chain,
                pred,
                "predecessor could not be renegotiated to the input this filter requires",
            ));
        }
    }

    if chain.get(pred).fmt_out == desired_in {
        return Ok(per_filter_reinit(chain, id, None));
    }

    let resampler = chain
        .insert(Some(id), "lavrresample", None, true, &[])
        .map_err(|e| negotiation_error_open(chain, id, e))?;
    chain.get_mut(resampler).fmt_out = desired_in.clone();
    let conv_result = per_filter_reinit(chain, resampler, Some(&desired_in));

    match conv_result {
        ControlResult::Ok => Ok(per_filter_reinit(chain, id, None)),
        ControlResult::Detach => {
            chain.remove(resampler);
            Ok(per_filter_reinit(chain, id, None))
        }
        _ => Err(negotiation_error(
            chain,
            resampler,
            "auto-inserted conversion filter rejected the required conversion",
        )),
    }
}

/// Drops every auto-inserted filter (the start of every `do_reinit`
/// pass rebuilds conversions from scratch).
fn remove_auto_inserted(chain: &mut Chain) {
    let victims: alloc::vec::Vec<_> = chain
        .iter()
        .filter(|&id| !chain.is_sentinel(id) && chain.get(id).auto_inserted)
        .collect();
    for id in victims {
        chain.remove(id);
    }
}

/// `af_find_output_conversion` — detects whether the chain (as it stood
/// after the first pass) has exactly one auto-inserted channel-changing
/// filter sitting right before the tail, with at least one other filter
/// ahead of it, such that moving it to the front of the chain would do
/// the same conversion over fewer samples.
fn find_output_conversion(chain: &Chain) -> Option<AudioConfig> {
    let differs_only_in_channels = chain.output.format == chain.input.format
        && chain.output.rate == chain.input.rate
        && chain.output.channels != chain.input.channels;
    if !differs_only_in_channels {
        return None;
    }

    let tail = chain.tail_id();
    let conv = chain.prev(tail)?;
    if chain.is_sentinel(conv) {
        return None;
    }
    let conv_inst = chain.get(conv);
    if !conv_inst.auto_inserted {
        return None;
    }
    if !conv_inst.fmt_in.channels.equals_reordered(&chain.input.channels) {
        return None;
    }
    if !conv_inst
        .fmt_out
        .channels
        .equals_reordered(&chain.output.channels)
    {
        return None;
    }

    for id in chain.iter() {
        if id == conv || chain.is_sentinel(id) {
            continue;
        }
        let inst = chain.get(id);
        if inst.auto_inserted
            && inst.fmt_in.channels.num_channels() != inst.fmt_out.channels.num_channels()
        {
            return None;
        }
    }

    let head = chain.head_id();
    if chain.prev(conv) == Some(head) {
        // conv is adjacent to both sentinels: nothing to move it ahead of.
        return None;
    }

    Some(chain.output.clone())
}

/// One negotiation pass. `second_pass` enables the "move conversion
/// earlier" optimization; a failed second pass is recovered by the
/// caller re-running the first pass, so this function's own errors
/// always leave `chain.state == Err` for the caller to react to.
fn do_reinit(chain: &mut Chain, second_pass: bool) -> Result<(), NegotiationError> {
    let convert_early = if second_pass {
        find_output_conversion(chain)
    } else {
        None
    };

    remove_auto_inserted(chain);
    let ids: alloc::vec::Vec<_> = chain.iter().collect();
    for id in ids {
        chain.get_mut(id).out_queued.clear();
        if !chain.is_sentinel(id) {
            chain.get_mut(id).fmt_in = AudioConfig::null();
            chain.get_mut(id).fmt_out = AudioConfig::null();
        }
        chain.get_mut(id).filter.reset_negotiation_state();
    }
    let input = chain.input.clone();
    let head = chain.head_id();
    chain.get_mut(head).fmt_in = input.clone();
    chain.get_mut(head).fmt_out = input;

    // Seed the tail's pinned output target from the chain's requested
    // output before anything negotiates against it. Without this the
    // tail would start every pass with nothing pinned and silently
    // accept whatever format reaches it, never forcing a conversion.
    let tail = chain.tail_id();
    let output_target = chain.output.clone();
    chain.get_mut(tail).filter.seed_output_target(&output_target);

    // When the early-conversion resampler is inserted, its own reinit
    // happens right here with the target hint it needs to actually pin
    // a conversion instead of detaching as redundant; the walk below
    // must not revisit it; a `Reinit { desired_output: None }` call would
    // see no hint and treat itself as a no-op passthrough. So the walk
    // always starts after it (or after `head` when no such filter was
    // inserted), exactly as it never revisits a resampler the
    // conversion-insertion escalation created mid-walk either.
    let mut cur = chain.next(head);
    if let Some(target) = convert_early {
        let first_real = cur.expect("chain always has at least the tail after head");
        let resampler = chain
            .insert(Some(first_real), "lavrresample", None, true, &[])
            .map_err(|e| negotiation_error_open(chain, first_real, e))?;
        chain.get_mut(resampler).fmt_out = target.clone();
        let result = per_filter_reinit(chain, resampler, Some(&target));
        if !matches!(result, ControlResult::Ok | ControlResult::Detach) {
            return Err(negotiation_error(
                chain,
                resampler,
                "moving the channel conversion earlier in the chain failed",
            ));
        }
        if result == ControlResult::Detach {
            chain.remove(resampler);
        }
        cur = Some(first_real);
    }

    while let Some(id) = cur {
        let next = chain.next(id);
        let is_tail = id == tail;

        if !is_tail {
            let pred = chain.prev(id).expect("non-head filter has a predecessor");
            let pred_is_spdif = chain.get(pred).fmt_out.format.is_spdif();
            if pred_is_spdif && !chain.get(id).filter.handles_compressed() {
                // Spdif-mismatch exception: this filter cannot process a
                // compressed input and nothing can convert spdif to PCM
                // in-chain, so it is simply removed rather than failing
                // negotiation outright.
                chain.remove(id);
                cur = next;
                continue;
            }
        }

        match filter_reinit_with_conversion(chain, id)? {
            ControlResult::Ok => cur = next,
            ControlResult::False => {
                if is_tail {
                    return Err(negotiation_error(
                        chain,
                        id,
                        "requested output config could not be produced",
                    ));
                }
                let pred = chain.prev(id).expect("non-head filter has a predecessor");
                let pred_is_spdif = chain.get(pred).fmt_out.format.is_spdif();
                let self_is_spdif = chain.get(id).fmt_in.format.is_spdif();
                if pred_is_spdif != self_is_spdif {
                    chain.remove(id);
                    cur = next;
                } else {
                    return Err(negotiation_error(
                        chain,
                        id,
                        "filter rejected its negotiated input",
                    ));
                }
            }
            ControlResult::Detach => {
                if is_tail {
                    return Err(negotiation_error(
                        chain,
                        id,
                        "the chain's tail cannot detach itself",
                    ));
                }
                chain.remove(id);
                cur = next;
            }
            other => {
                return Err(negotiation_error(
                    chain,
                    id,
                    match other {
                        ControlResult::Error => "filter control failed",
                        _ => "filter returned an unrecognized control result",
                    },
                ))
            }
        }
    }

    let mut output = chain.output.clone();
    let tail_fmt_in = chain.get(tail).fmt_in.clone();
    output.copy_unset_fields(&tail_fmt_in);
    if output != tail_fmt_in {
        return Err(negotiation_error(
            chain,
            tail,
            "requested output config does not match what the chain actually produces",
        ));
    }
    chain.output = output;
    chain.state = ChainState::Ok;
    Ok(())
}

/// Full chain (re)negotiation: a first pass that builds a valid chain,
/// then an optional second pass that may move a channel conversion
/// earlier to reduce the work done by intermediate filters. The second
/// pass is an optimization, not a correctness requirement — if it fails,
/// the first pass's result is restored and `reinit` still succeeds.
pub fn reinit(chain: &mut Chain) -> Result<(), NegotiationError> {
    do_reinit(chain, false)?;
    if let Err(err) = do_reinit(chain, true) {
        log::debug!("second-pass negotiation optimization failed, reverting: {err}");
        do_reinit(chain, false)?;
    }
    Ok(())
}
