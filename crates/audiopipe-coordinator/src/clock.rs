/// A monotonic time source, in seconds, supplied by the host event loop.
///
/// Kept as a trait rather than reaching for `std::time::Instant` directly
/// so the coordinator's open-resume deadline logic (`ao_resume_time` in
/// `player/audio.c`) stays testable with a fake clock and works the same
/// whether the host is a CLI player or a `no_std` embedded target with its
/// own notion of "now".
pub trait Clock {
    fn now_secs(&self) -> f64;
}
