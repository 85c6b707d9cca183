use smallvec::SmallVec;

/// A single loudspeaker position, in the same enumeration the wire format
/// and the built-in `pan`/`lavrresample` filters index into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Speaker {
    FrontLeft,
    FrontRight,
    FrontCenter,
    Lfe,
    BackLeft,
    BackRight,
    SideLeft,
    SideRight,
    /// A position the decoder reported that this crate has no name for.
    /// Carried through unchanged so round-tripping a chain never loses
    /// channels, but filters that index speakers by name skip these.
    Unknown(u8),
}

/// Most channel layouts fit in a small number of speakers; `SmallVec`
/// avoids a heap allocation for the overwhelming majority of configs
/// (mono through 7.1) the same way `firewheel-core`'s channel types stay
/// inline for its common cases.
const INLINE_SPEAKERS: usize = 8;

/// An ordered list of speaker positions. Order matters for interleaved PCM
/// layout, which is why equality here is strict and position-sensitive;
/// [`ChannelMap::equals_reordered`] is the separate, looser comparison used
/// by the negotiation algorithm's "channel conversion" detection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMap(SmallVec<[Speaker; INLINE_SPEAKERS]>);

impl ChannelMap {
    pub fn new(speakers: impl IntoIterator<Item = Speaker>) -> Self {
        Self(speakers.into_iter().collect())
    }

    pub fn mono() -> Self {
        Self::new([Speaker::FrontCenter])
    }

    pub fn stereo() -> Self {
        Self::new([Speaker::FrontLeft, Speaker::FrontRight])
    }

    pub fn num_channels(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.0
    }

    /// `mp_chmap_equals_reordered` — true if both maps contain the same
    /// speakers with the same multiplicity, ignoring order. Two maps of
    /// different lengths are never reordered-equal.
    pub fn equals_reordered(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut remaining: SmallVec<[Speaker; INLINE_SPEAKERS]> = other.0.clone();
        for speaker in &self.0 {
            match remaining.iter().position(|s| s == speaker) {
                Some(idx) => {
                    remaining.swap_remove(idx);
                }
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strict_equality_is_order_sensitive() {
        let lr = ChannelMap::new([Speaker::FrontLeft, Speaker::FrontRight]);
        let rl = ChannelMap::new([Speaker::FrontRight, Speaker::FrontLeft]);
        assert_ne!(lr, rl);
        assert!(lr.equals_reordered(&rl));
    }

    #[test]
    fn reordered_equality_requires_same_length() {
        let stereo = ChannelMap::stereo();
        let mono = ChannelMap::mono();
        assert!(!stereo.equals_reordered(&mono));
    }

    #[test]
    fn reordered_equality_respects_multiplicity() {
        let a = ChannelMap::new([Speaker::FrontLeft, Speaker::FrontLeft]);
        let b = ChannelMap::new([Speaker::FrontLeft, Speaker::FrontRight]);
        assert!(!a.equals_reordered(&b));
    }
}
