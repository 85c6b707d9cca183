use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::OpenError;
use crate::instance::Filter;

/// One `key=value` filter argument, as parsed from a filter spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub key: String,
    pub value: String,
}

/// A static catalogue entry: a name and a factory that builds the filter's
/// behavior object from its arguments.
///
/// `open` takes the raw args rather than a pre-parsed options struct —
/// option-schema parsing is left to each filter, and this crate (unlike a
/// filter implementation crate) has no business knowing any individual
/// filter's option shape.
pub struct FilterDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub open: fn(args: &[Arg]) -> Result<Box<dyn Filter>, OpenError>,
}

impl core::fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FilterDescriptor").field("name", &self.name).finish()
    }
}

/// One alias mapping a legacy/alternate name to a catalogue entry, e.g.
/// `"force" -> "format"`.
#[derive(Debug, Clone, Copy)]
pub struct Alias {
    pub from: &'static str,
    pub to: &'static str,
}

/// The bridge filter's reserved name, used when an unknown filter name is
/// routed to an external-library passthrough instead of failing outright.
pub const BRIDGE_NAME: &str = "lavfi-bridge";

/// A static, caller-injected catalogue: descriptors plus an alias table.
/// Never global mutable state — a `Chain` is constructed with a `&'static
/// Registry` the same way `firewheel-graph` takes its node catalogue as
/// data rather than reaching for a process-wide singleton.
pub struct Registry {
    pub descriptors: &'static [FilterDescriptor],
    pub aliases: &'static [Alias],
}

impl Registry {
    pub const fn new(
        descriptors: &'static [FilterDescriptor],
        aliases: &'static [Alias],
    ) -> Self {
        Self {
            descriptors,
            aliases,
        }
    }

    fn find_exact(&self, name: &str) -> Option<&'static FilterDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// `find(name)` — exact lookup, falling back to the alias table on
    /// miss.
    pub fn find(&self, name: &str) -> Option<&'static FilterDescriptor> {
        if let Some(d) = self.find_exact(name) {
            return Some(d);
        }
        let resolved = self.aliases.iter().find(|a| a.from == name)?.to;
        self.find_exact(resolved)
    }

    /// Resolves a requested filter name to a descriptor and the argument
    /// list the filter should actually see, routing unknown names to the
    /// bridge filter. A `"lavfi-"` prefix is stripped only if present
    /// (names that don't start with it are passed through verbatim as the
    /// bridge's sub-option).
    ///
    /// Returns `None` only if the bridge filter itself isn't registered.
    pub fn resolve<'a>(
        &self,
        name: &'a str,
        args: &[Arg],
    ) -> Option<(&'static FilterDescriptor, Vec<Arg>)> {
        if let Some(d) = self.find(name) {
            return Some((d, args.to_vec()));
        }
        let bridge = self.find_exact(BRIDGE_NAME)?;
        let bridged_name = name.strip_prefix("lavfi-").unwrap_or(name);
        let mut bridged_args = Vec::with_capacity(args.len() + 1);
        bridged_args.push(Arg {
            key: String::from("name"),
            value: String::from(bridged_name),
        });
        for arg in args {
            bridged_args.push(Arg {
                key: String::from("opts"),
                value: alloc::format!("{}={}", arg.key, arg.value),
            });
        }
        Some((bridge, bridged_args))
    }

    pub fn create(
        &self,
        descriptor: &'static FilterDescriptor,
        args: &[Arg],
    ) -> Result<Box<dyn Filter>, OpenError> {
        (descriptor.open)(args)
    }
}
