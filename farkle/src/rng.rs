//! Seedable sources of bounded random integers, used to roll dice.

use crate::NUM_FACES;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoroshiro64Star;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A seedable generator of bounded non-negative integers.
///
/// Every call to [`RandomSource::next`] advances the internal state by exactly
/// one step, so two sources with the same seed and the same sequence of draw
/// requests produce the same values.
pub trait RandomSource {
    /// Reseed the generator. A seed of `0` is a no-op and keeps the current
    /// state.
    fn seed(&mut self, seed: u32);

    /// Return an integer in `[0, limit)`. `limit` must be positive.
    fn next(&mut self, limit: u32) -> u32;

    /// Roll a single fair die, returning a face in `1..=6`.
    #[inline]
    fn roll_die(&mut self) -> u8 {
        (self.next(NUM_FACES as u32) + 1) as u8
    }
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    #[inline]
    fn seed(&mut self, seed: u32) {
        (**self).seed(seed)
    }

    #[inline]
    fn next(&mut self, limit: u32) -> u32 {
        (**self).next(limit)
    }
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    #[inline]
    fn seed(&mut self, seed: u32) {
        (**self).seed(seed)
    }

    #[inline]
    fn next(&mut self, limit: u32) -> u32 {
        (**self).next(limit)
    }
}

//////////
// Lfsr //
//////////

/// The classic xorshift-style shift register generator over a 32-bit state.
///
/// ```text
/// s ^= s >> 7;
/// s ^= s << 9;
/// s ^= s >> 13;
/// ```
///
/// A zero state is a fixed point: an unseeded `Lfsr` rolls nothing but 1's.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Lfsr {
    state: u32,
}

impl Lfsr {
    pub fn new(seed: u32) -> Self {
        let mut lfsr = Self::default();
        lfsr.seed(seed);
        lfsr
    }

    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance the register one step and return the new state.
    #[inline]
    pub fn step(&mut self) -> u32 {
        let mut s = self.state;
        s ^= s >> 7;
        s ^= s << 9;
        s ^= s >> 13;
        self.state = s;
        s
    }
}

impl RandomSource for Lfsr {
    fn seed(&mut self, seed: u32) {
        if seed != 0 {
            self.state = seed;
        }
    }

    #[inline]
    fn next(&mut self, limit: u32) -> u32 {
        debug_assert!(limit > 0);
        self.step() % limit
    }
}

////////////
// Seeded //
////////////

/// Adapts any seedable [`rand`] generator into a [`RandomSource`].
#[derive(Clone, Debug)]
pub struct Seeded<R>(R);

impl<R: Rng + SeedableRng> Seeded<R> {
    pub fn new(seed: u32) -> Self {
        Self(R::seed_from_u64(seed as u64))
    }
}

impl<R: Rng + SeedableRng> RandomSource for Seeded<R> {
    fn seed(&mut self, seed: u32) {
        if seed != 0 {
            self.0 = R::seed_from_u64(seed as u64);
        }
    }

    #[inline]
    fn next(&mut self, limit: u32) -> u32 {
        debug_assert!(limit > 0);
        self.0.gen_range(0..limit)
    }
}

pub type Xoshiro = Seeded<Xoroshiro64Star>;

/////////////
// RngKind //
/////////////

/// The generators selectable from the command line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RngKind {
    #[default]
    Lfsr,
    Xoshiro,
}

impl RngKind {
    pub fn build(self, seed: u32) -> Box<dyn RandomSource> {
        match self {
            Self::Lfsr => Box::new(Lfsr::new(seed)),
            Self::Xoshiro => Box::new(Xoshiro::new(seed)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lfsr => "lfsr",
            Self::Xoshiro => "xoshiro",
        }
    }
}

impl FromStr for RngKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lfsr" => Ok(Self::Lfsr),
            "xoshiro" => Ok(Self::Xoshiro),
            _ => Err(format!(
                "unrecognized generator: '{}' (expected 'lfsr' or 'xoshiro')",
                s
            )),
        }
    }
}

impl fmt::Display for RngKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a seed written in decimal (`1234`) or hexadecimal (`0x4d2`).
pub fn parse_seed(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let res = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    res.map_err(|err| format!("'{}' is not a decimal or hexadecimal seed: {}", s, err))
}

////////////////
// FixedRolls //
////////////////

cfg_test! {
    use std::collections::VecDeque;

    /// A scripted die roller that replays a fixed sequence of faces.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct FixedRolls(VecDeque<u8>);

    impl FixedRolls {
        pub(crate) fn new(faces: &[u8]) -> Self {
            assert!(faces.iter().all(|face| (1..=NUM_FACES).contains(face)));
            Self(faces.iter().copied().collect())
        }

        pub(crate) fn is_exhausted(&self) -> bool {
            self.0.is_empty()
        }
    }

    impl RandomSource for FixedRolls {
        fn seed(&mut self, _seed: u32) {}

        fn next(&mut self, limit: u32) -> u32 {
            assert_eq!(NUM_FACES as u32, limit);
            let face = self.0.pop_front().expect("ran out of scripted rolls");
            (face - 1) as u32
        }
    }
}

///////////
// Tests //
///////////
