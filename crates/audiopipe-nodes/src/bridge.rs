use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::string::String;

use audiopipe_core::{AudioConfig, Frame};
use audiopipe_graph::{Arg, ControlCommand, ControlResult, Filter, FilterRuntimeError, OpenError};

use crate::args;

/// `lavfi-bridge` — the catch-all destination for any filter name the
/// registry doesn't otherwise know. An unknown name is routed here by
/// [`audiopipe_graph::Registry::resolve`], with the original name and
/// its arguments installed as the bridge's own `name`/`opts` options.
///
/// The external filter library this bridges to is out of scope here —
/// individual filter implementations are treated as opaque units. This
/// stub passes audio through unchanged but negotiates and reports delay
/// like a real external filter would, so the rest of the chain exercises
/// the bridging path end to end.
pub struct BridgeFilter {
    bridged_name: String,
    opts: alloc::vec::Vec<(String, String)>,
    fmt: AudioConfig,
}

pub fn open(args: &[Arg]) -> Result<Box<dyn Filter>, OpenError> {
    let bridged_name = args::find(args, "name")
        .ok_or_else(|| OpenError::BadOptions(String::from("lavfi-bridge requires a \"name\" option")))?
        .into();
    let opts = args
        .iter()
        .filter(|a| a.key == "opts")
        .filter_map(|a| a.value.split_once('='))
        .map(|(k, v)| (String::from(k), String::from(v)))
        .collect();
    Ok(Box::new(BridgeFilter {
        bridged_name,
        opts,
        fmt: AudioConfig::null(),
    }))
}

impl BridgeFilter {
    /// The external filter name this instance was bridged to, stripped
    /// of its `"lavfi-"` prefix. Exposed for diagnostics only.
    pub fn bridged_name(&self) -> &str {
        &self.bridged_name
    }

    pub fn opts(&self) -> &[(String, String)] {
        &self.opts
    }
}

impl Filter for BridgeFilter {
    fn control(&mut self, cmd: ControlCommand<'_>) -> ControlResult {
        match cmd {
            ControlCommand::Reinit { input, .. } => {
                if !input.is_valid() {
                    return ControlResult::Error;
                }
                self.fmt = input.clone();
                ControlResult::Ok
            }
            ControlCommand::Reset => ControlResult::Ok,
            _ => ControlResult::Unknown,
        }
    }

    fn fmt_out(&self) -> AudioConfig {
        self.fmt.clone()
    }

    fn filter_frame(
        &mut self,
        out_queue: &mut VecDeque<Frame>,
        frame: Option<Frame>,
    ) -> Result<(), FilterRuntimeError> {
        if let Some(frame) = frame {
            out_queue.push_back(frame);
        }
        Ok(())
    }
}
