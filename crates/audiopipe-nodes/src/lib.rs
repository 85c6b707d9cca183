#![cfg_attr(not(feature = "std"), no_std)]

//! The built-in filter catalogue: `format`, `lavrresample`, `volume`,
//! `pan`, `scaletempo`, `lavcac3enc`, and the `lavfi-bridge` fallback,
//! plus the optional `rubberband` tempo filter.
//!
//! [`builtin_registry`] is the `&'static Registry` a [`audiopipe_graph::Chain`]
//! is constructed with; nothing here is reachable as process-wide mutable
//! state.

extern crate alloc;

mod args;
mod bridge;
mod dsp;
mod format;
mod lavcac3enc;
mod lavrresample;
mod pan;
#[cfg(feature = "rubberband")]
mod rubberband;
mod scaletempo;
mod volume;

pub use bridge::BridgeFilter;
pub use format::FormatFilter;
pub use lavcac3enc::Lavcac3encFilter;
pub use lavrresample::ResampleFilter;
pub use pan::PanFilter;
#[cfg(feature = "rubberband")]
pub use rubberband::RubberbandFilter;
pub use scaletempo::ScaletempoFilter;
pub use volume::VolumeFilter;

use audiopipe_graph::{Alias, FilterDescriptor, Registry, BRIDGE_NAME};

static DESCRIPTORS: &[FilterDescriptor] = &[
    FilterDescriptor {
        name: "format",
        description: "forces a sample format conversion",
        open: format::open,
    },
    FilterDescriptor {
        name: "lavrresample",
        description: "format, rate, and channel layout converter",
        open: lavrresample::open,
    },
    FilterDescriptor {
        name: "volume",
        description: "linear gain control",
        open: volume::open,
    },
    FilterDescriptor {
        name: "pan",
        description: "per-channel mix matrix and stereo balance",
        open: pan::open,
    },
    FilterDescriptor {
        name: "scaletempo",
        description: "pitch-preserving playback speed control",
        open: scaletempo::open,
    },
    FilterDescriptor {
        name: "lavcac3enc",
        description: "wraps PCM into an AC3 spdif passthrough stream",
        open: lavcac3enc::open,
    },
    #[cfg(feature = "rubberband")]
    FilterDescriptor {
        name: "rubberband",
        description: "alternative pitch-preserving playback speed control",
        open: rubberband::open,
    },
    FilterDescriptor {
        name: BRIDGE_NAME,
        description: "passthrough bridge to an external filter library",
        open: bridge::open,
    },
];

static ALIASES: &[Alias] = &[Alias {
    from: "force",
    to: "format",
}];

static REGISTRY: Registry = Registry::new(DESCRIPTORS, ALIASES);

/// The registry of every filter this crate ships, for injection into
/// [`audiopipe_graph::Chain::new`]. Never global mutable state — this is
/// a `&'static` reference to a value built once at compile time.
pub fn builtin_registry() -> &'static Registry {
    &REGISTRY
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_catalogue_name_resolves() {
        for d in DESCRIPTORS {
            assert!(builtin_registry().find(d.name).is_some());
        }
    }

    #[test]
    fn force_aliases_to_format() {
        let resolved = builtin_registry().find("force").unwrap();
        assert_eq!(resolved.name, "format");
    }

    #[test]
    fn unknown_name_resolves_to_bridge() {
        let (descriptor, args) = builtin_registry()
            .resolve("lavfi-custom-thing", &[audiopipe_graph::Arg {
                key: alloc::string::String::from("x"),
                value: alloc::string::String::from("1"),
            }])
            .unwrap();
        assert_eq!(descriptor.name, BRIDGE_NAME);
        assert!(args.iter().any(|a| a.key == "name" && a.value == "custom-thing"));
    }
}
