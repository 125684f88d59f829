//! # farkle
//!
//! A dice-scoring and turn-resolution engine for the dice game Farkle, plus a
//! small console front-end for 1 to 4 local players : )
//!
//! ## Rules
//!
//! https://www.dicegamedepot.com/farkle-rules/
//!
//! Each turn starts by rolling six dice. A roll with no scoring dice is a
//! "farkle" (bust) and forfeits the turn. Otherwise the player sets aside at
//! least one scoring die, then either banks the turn total or rolls the rest.
//! Setting aside every die ("hot dice") earns a fresh roll of all six.
//!
//! ## Scoring
//!
//! * a straight (one of each face in a single six dice roll): 1500
//! * each set of three 1's: 1000, each left-over 1: 100
//! * each set of three 5's: 500, each left-over 5: 50
//! * each set of three 2's, 3's, 4's, or 6's: 200, 300, 400, or 600

#[macro_use]
mod macros;

mod multiset;
pub mod agent;
pub mod cli;
pub mod console;
pub mod dice;
pub mod game;
pub mod rng;
pub mod stats;
pub mod turn;

/// Number of faces on a die.
pub const NUM_FACES: u8 = 6;

/// Number of dice rolled at the start of a turn, and after hot dice.
pub const MAX_DICE: u8 = 6;

///////////////////
// Combinatorics //
///////////////////

/// The number of factorials to precompute in our static lookup table. Note this
/// number is chosen so as not to overflow a u32.
pub(crate) const NUM_FACTORIALS: usize = 13;

/// A precomputed lookup table of factorials from `0 <= n < NUM_FACTORIALS`.
/// `FACTORIAL_LT[n] = n!`.
const FACTORIAL_LT: [u32; NUM_FACTORIALS] = precompute_factorials();

const fn precompute_factorials() -> [u32; NUM_FACTORIALS] {
    let mut factorials: [u32; NUM_FACTORIALS] = [1; NUM_FACTORIALS];

    // need ghetto for-loop in const fn...
    let mut idx = 1;
    loop {
        if idx >= NUM_FACTORIALS {
            break;
        }
        factorials[idx] = (idx as u32) * factorials[idx - 1];
        idx += 1;
    }

    factorials
}

pub(crate) const fn factorial(n: u32) -> u32 {
    FACTORIAL_LT[n as usize]
}

/// count `n choose k` without replacement.
#[cfg(test)]
pub(crate) const fn num_combinations(n: u32, k: u32) -> u32 {
    factorial(n) / (factorial(k) * factorial(n - k))
}

/// count `n choose k` with replacement. also known as `n multichoose k`.
#[cfg(test)]
#[inline]
pub(crate) const fn num_multisets(n: u32, k: u32) -> u32 {
    num_combinations(n + k - 1, k)
}

///////////////
// Bit Hacks //
///////////////

/// Sum all bytes in `x`. The total must fit in a byte (i.e., `< 256`).
#[inline]
pub(crate) fn u64_sum_all_bytes(x: u64) -> u64 {
    // if x = [b0, b1, .., b7] bytes, then multiplying by 0x0101_0101_0101_0101
    // yields z = [b0, b0 + b1, .., b0 + b1 + .. + b7] in each byte, without any
    // carries, so long as every prefix sum stays below 256.
    //
    // the most-significant byte then holds the full horizontal sum.
    x.wrapping_mul(0x0101_0101_0101_0101) >> 56
}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn factorial_ref(n: u32) -> u32 {
        (1..=n).product()
    }

    #[test]
    fn test_factorial_lt() {
        for n in 0..NUM_FACTORIALS as u32 {
            assert_eq!(factorial_ref(n), factorial(n));
        }
    }

    #[test]
    fn test_num_multisets() {
        // number of distinct rolls of n six-sided dice
        assert_eq!(1, num_multisets(6, 0));
        assert_eq!(6, num_multisets(6, 1));
        assert_eq!(21, num_multisets(6, 2));
        assert_eq!(56, num_multisets(6, 3));
        assert_eq!(462, num_multisets(6, 6));
    }

    fn niters(n: u32) -> ProptestConfig {
        ProptestConfig::with_cases(n)
    }

    fn u64_sum_all_bytes_ref(x: u64) -> u64 {
        x.to_le_bytes().into_iter().map(|b| b as u64).sum()
    }

    #[test]
    fn test_u64_sum_all_bytes() {
        proptest!(niters(2000), |(x in any::<u64>())| {
            // keep every byte < 32 so the sum fits in a byte
            let x = x & 0x1f1f_1f1f_1f1f_1f1f;
            prop_assert_eq!(u64_sum_all_bytes_ref(x), u64_sum_all_bytes(x));
        });
    }
}
