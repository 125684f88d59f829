use crate::{factorial, multiset::MultisetU8x8, rng::RandomSource, MAX_DICE, NUM_FACES};
use claim::debug_assert_le;
#[cfg(test)]
use proptest::{
    arbitrary::Arbitrary,
    strategy::{BoxedStrategy, Strategy},
};
use serde::{Deserialize, Serialize};
use std::{cmp, fmt, iter::FusedIterator, str::FromStr};
use thiserror::Error;

////////////
// Errors //
////////////

/// Why a digit sequence could not be turned into dice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("invalid die face {0}: faces must be in the range [1, 6]")]
    InvalidFace(u8),
    #[error("not enough {face}'s: wanted {requested}, only {available} available")]
    InsufficientDice {
        face: u8,
        requested: usize,
        available: usize,
    },
    #[error("too many dice: {0} (at most 255)")]
    TooManyDice(usize),
}

/// The most dice a single [`DiceSet`] can hold.
pub const MAX_SET_LEN: usize = u8::MAX as usize;

/// Failure to read dice out of their textual digit-sequence form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseDiceError {
    #[error("'{0}' is not a digit")]
    NotADigit(char),
    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Parse the textual form of a dice selection into its face digits, in the
/// order written.
///
/// The text is read like a non-negative decimal integer: surrounding
/// whitespace and brackets are ignored, as are `,` separators, and leading
/// zeros are dropped, so `"0"` and `""` are both the empty sequence. Digits
/// are _not_ range checked here; see [`DiceSet::decode`].
pub fn parse_faces(s: &str) -> Result<Vec<u8>, ParseDiceError> {
    let s = s.trim();
    let s = s.trim_start_matches('[');
    let s = s.trim_end_matches(']');

    let digits = s
        .chars()
        .filter(|c| *c != ',')
        .map(|c| {
            c.to_digit(10)
                .map(|digit| digit as u8)
                .ok_or(ParseDiceError::NotADigit(c))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first_nonzero = digits
        .iter()
        .position(|&digit| digit != 0)
        .unwrap_or(digits.len());

    Ok(digits[first_nonzero..].to_vec())
}

/////////////
// DiceSet //
/////////////

/// A multiset of six-sided die faces. The count of each face is packed as a
/// byte into a u64. Visually,
///
/// `XX 66 55 44 33 22 11 XX`, where `XX`s are unused bytes and `NN` is the
/// byte holding the number of dice showing face `N`.
///
/// The total number of dice is always the sum of the face counts, and the
/// order dice were rolled in is not recorded: two sets with equal counts are
/// the same set.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DiceSet(MultisetU8x8);

/// The result of pulling a selection out of a set of rolled dice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Split {
    /// The dice set aside for score.
    pub kept: DiceSet,
    /// The dice still available to roll.
    pub remaining: DiceSet,
}

impl DiceSet {
    /// A new empty set of dice.
    #[inline]
    pub const fn new() -> Self {
        Self(MultisetU8x8::new())
    }

    /// Build a set from the counts of faces `1..=6`.
    #[inline]
    pub const fn from_counts(cs: [u8; 6]) -> Self {
        Self(MultisetU8x8::from_counts([
            0, cs[0], cs[1], cs[2], cs[3], cs[4], cs[5], 0,
        ]))
    }

    /// Roll `ndice` fair dice, drawing one value per die from `rng`.
    pub fn roll<R: RandomSource + ?Sized>(ndice: u8, rng: &mut R) -> Self {
        let dice = Self(MultisetU8x8::from_iter_flat(
            (0..ndice).map(|_| rng.roll_die()),
        ));
        debug_assert_eq!(ndice, dice.len());
        dice
    }

    /// Decode a sequence of face digits, one die per digit.
    ///
    /// Fails with [`DiceError::InvalidFace`] if any digit is `0` or above `6`.
    /// The empty sequence decodes to the empty set.
    pub fn decode(faces: &[u8]) -> Result<Self, DiceError> {
        let counts = tally_faces(faces)?;
        if faces.len() > MAX_SET_LEN {
            return Err(DiceError::TooManyDice(faces.len()));
        }
        Ok(Self::from_counts(counts.map(|count| count as u8)))
    }

    /// Decode the decimal digits of `value`, most-significant digit first.
    /// `0` has no digits and decodes to the empty set.
    #[cfg(test)]
    pub(crate) fn decode_int(value: u32) -> Result<Self, DiceError> {
        if value == 0 {
            return Ok(Self::new());
        }
        let digits = value
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect::<Vec<_>>();
        Self::decode(&digits)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// The number of dice in this set.
    #[inline]
    pub fn len(self) -> u8 {
        self.0.len()
    }

    #[inline]
    pub fn get_count(self, face: u8) -> u8 {
        debug_assert!((1..=NUM_FACES).contains(&face));
        self.0.get_count(face)
    }

    #[inline]
    pub fn is_superset_of(self, other: Self) -> bool {
        self.0.is_superset_of(other.0)
    }

    /// The faces in this set, sorted ascending.
    pub fn to_faces(self) -> Vec<u8> {
        self.0.into_iter_flat().collect()
    }

    /// Pull the dice named by `choice` (a sequence of face digits) out of this
    /// set.
    ///
    /// Fails with [`DiceError::InvalidFace`] on a digit outside `1..=6`, or
    /// [`DiceError::InsufficientDice`] if `choice` names more of a face than
    /// this set holds. `self` is never modified; on success the caller gets
    /// both halves of the split.
    pub fn select(self, choice: &[u8]) -> Result<Split, DiceError> {
        let counts = tally_faces(choice)?;

        for face in 1..=NUM_FACES {
            let requested = counts[(face - 1) as usize];
            let available = self.get_count(face) as usize;
            if requested > available {
                return Err(DiceError::InsufficientDice {
                    face,
                    requested,
                    available,
                });
            }
        }

        // every count is bounded by ours now, so this can't overflow
        let kept = Self::from_counts(counts.map(|count| count as u8));
        let remaining = Self(self.0 - kept.0);
        debug_assert_eq!(self.len(), kept.len() + remaining.len());

        Ok(Split { kept, remaining })
    }

    /// One die of each face, in a single set of exactly six dice.
    #[inline]
    pub fn is_straight(self) -> bool {
        self == Self::from_counts([1, 1, 1, 1, 1, 1])
    }

    /// Returns the score of a set of dice. Non-scoring dice mixed in are simply
    /// worth nothing.
    pub fn score(self) -> u32 {
        if self.is_empty() {
            return 0;
        }

        // a straight supersedes everything else
        if self.is_straight() {
            return STRAIGHT_SCORE;
        }

        (1..=NUM_FACES)
            .map(|face| face_score(face, self.get_count(face)))
            .sum()
    }

    /// Return true if this set has no scoring dice, also called a "bust" (or
    /// a "farkle").
    ///
    /// This is checked directly against the scoring rules rather than going
    /// through [`DiceSet::score`]; the two must always agree for non-empty
    /// sets.
    pub fn is_bust(self) -> bool {
        if self.is_straight() {
            return false;
        }

        let c = |face| self.get_count(face);

        let any_scoring = c(1) >= 1
            || c(5) >= 1
            || c(2) >= 3
            || c(3) >= 3
            || c(4) >= 3
            || c(6) >= 3;

        !any_scoring
    }

    /// Break the score of this set into its scoring combinations. The points
    /// of all the combinations add up to [`DiceSet::score`].
    pub fn combos(self) -> Vec<Combo> {
        if self.is_straight() {
            return vec![Combo::Straight];
        }

        let mut combos = Vec::new();
        for face in 1..=NUM_FACES {
            let count = self.get_count(face);

            if count >= 3 {
                combos.push(Combo::Sets {
                    face,
                    nsets: count / 3,
                });
            }

            if single_score(face) > 0 {
                let singles = if count >= 3 { count % 3 } else { count };
                if singles > 0 {
                    combos.push(Combo::Singles {
                        face,
                        count: singles,
                    });
                }
            }
        }
        combos
    }

    /// The largest subset of this set that still scores everything this set
    /// does, i.e., every die that counts towards [`DiceSet::score`].
    pub fn scoring_dice(self) -> Self {
        self.combos()
            .into_iter()
            .fold(Self::new(), |acc, combo| Self(acc.0 + combo.dice().0))
    }

    /// Return the probability of rolling exactly this set of dice with
    /// `self.len()` fair dice.
    ///
    /// let n = number of dice in the set
    ///     P = n! / (6^n * ∏_{i∈[1,6]} c_i!)
    ///         where c_i is the count of the i'th face in the set
    ///
    /// Only meaningful for at most [`MAX_DICE`] dice.
    pub(crate) fn p_roll(self) -> f64 {
        let n = self.len();
        debug_assert_le!(n, MAX_DICE);

        let prod: u32 = (1..=NUM_FACES)
            .map(|face| factorial(self.get_count(face) as u32))
            .product();

        let m = 6_u32.pow(n as u32);

        (factorial(n as u32) as f64) / ((prod * m) as f64)
    }

    /// An `Iterator` over every distinct set of `ndice` dice.
    pub fn all_multisets(ndice: u8) -> AllDiceMultisetsIter {
        AllDiceMultisetsIter::new(ndice)
    }
}

/// Count each face in a digit sequence, rejecting digits that aren't faces.
fn tally_faces(faces: &[u8]) -> Result<[usize; 6], DiceError> {
    let mut counts = [0_usize; 6];
    for &face in faces {
        if !(1..=NUM_FACES).contains(&face) {
            return Err(DiceError::InvalidFace(face));
        }
        counts[(face - 1) as usize] += 1;
    }
    Ok(counts)
}

/// The probability that rolling `ndice` fair dice is a bust. `None` for more
/// than [`MAX_DICE`] dice.
pub fn p_bust(ndice: u8) -> Option<f64> {
    if ndice > MAX_DICE {
        return None;
    }
    let p: f64 = DiceSet::all_multisets(ndice)
        .filter(|dice| dice.is_bust())
        .map(DiceSet::p_roll)
        .sum();
    Some(p)
}

/// The expected score of rolling `ndice` fair dice and keeping all of them.
/// `None` for more than [`MAX_DICE`] dice.
pub fn expected_roll_score(ndice: u8) -> Option<f64> {
    if ndice > MAX_DICE {
        return None;
    }
    let e: f64 = DiceSet::all_multisets(ndice)
        .map(|dice| dice.p_roll() * (dice.score() as f64))
        .sum();
    Some(e)
}

///////////////////
// Scoring rules //
///////////////////

pub const STRAIGHT_SCORE: u32 = 1500;

/// Score for a set of three dice showing `face`.
#[inline]
const fn set_score(face: u8) -> u32 {
    match face {
        1 => 1000,
        face => (face as u32) * 100,
    }
}

/// Score for a single die showing `face`, outside of any set.
#[inline]
const fn single_score(face: u8) -> u32 {
    match face {
        1 => 100,
        5 => 50,
        _ => 0,
    }
}

/// Score for `count` dice showing `face`.
#[inline]
const fn face_score(face: u8, count: u8) -> u32 {
    let count = count as u32;
    if count >= 3 {
        set_score(face) * (count / 3) + single_score(face) * (count % 3)
    } else {
        single_score(face) * count
    }
}

/// A single scoring combination within a set of dice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Combo {
    /// One of each face, 1 through 6.
    Straight,
    /// `nsets` sets of three dice showing `face`.
    Sets { face: u8, nsets: u8 },
    /// Loose 1's or 5's that aren't part of a set.
    Singles { face: u8, count: u8 },
}

impl Combo {
    pub fn points(self) -> u32 {
        match self {
            Self::Straight => STRAIGHT_SCORE,
            Self::Sets { face, nsets } => set_score(face) * (nsets as u32),
            Self::Singles { face, count } => single_score(face) * (count as u32),
        }
    }

    /// The dice making up this combination.
    pub fn dice(self) -> DiceSet {
        match self {
            Self::Straight => DiceSet::from_counts([1; 6]),
            Self::Sets { face, nsets } => DiceSet(MultisetU8x8::from_count(face, 3 * nsets)),
            Self::Singles { face, count } => DiceSet(MultisetU8x8::from_count(face, count)),
        }
    }

    pub fn name(self) -> String {
        match self {
            Self::Straight => "straight".to_owned(),
            Self::Sets { face, nsets: 1 } => format!("three {}'s", face),
            Self::Sets { face, nsets } => format!("{} sets of three {}'s", nsets, face),
            Self::Singles { face, count: 1 } => format!("single {}", face),
            Self::Singles { face, count } => format!("{} single {}'s", count, face),
        }
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Renders the dice as their faces sorted ascending, e.g. `112556`.
impl fmt::Display for DiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for face in self.to_faces() {
            write!(f, "{}", face)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.to_faces()).fmt(f)
    }
}

impl cmp::Ord for DiceSet {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl cmp::PartialOrd for DiceSet {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse a digit sequence like `"455566"` (or `"[4,5,5,5,6,6]"`) into dice.
impl FromStr for DiceSet {
    type Err = ParseDiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let faces = parse_faces(s)?;
        Ok(Self::decode(&faces)?)
    }
}

impl From<DiceSet> for String {
    fn from(dice: DiceSet) -> Self {
        dice.to_string()
    }
}

impl TryFrom<String> for DiceSet {
    type Error = ParseDiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

impl FromIterator<u8> for DiceSet {
    /// Collect faces into a set. Faces must be in `1..=6`.
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = u8>,
    {
        Self(MultisetU8x8::from_iter_flat(iter.into_iter().inspect(
            |face| debug_assert!((1..=NUM_FACES).contains(face)),
        )))
    }
}

#[cfg(test)]
#[rustfmt::skip]
impl Arbitrary for DiceSet {
    type Parameters = ();
    type Strategy = BoxedStrategy<DiceSet>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        static ROLLS_SET: [u8; 36] = [
            1, 1, 1, 1, 1, 1,
            2, 2, 2, 2, 2, 2,
            3, 3, 3, 3, 3, 3,
            4, 4, 4, 4, 4, 4,
            5, 5, 5, 5, 5, 5,
            6, 6, 6, 6, 6, 6,
        ];

        proptest::sample::subsequence(ROLLS_SET.as_ref(), 0..=6)
            .prop_map(DiceSet::from_iter)
            .boxed()
    }
}

//////////////////////////
// AllDiceMultisetsIter //
//////////////////////////

/// An `Iterator` over combinations (with replacement) of _all_ dice roll outcomes.
pub struct AllDiceMultisetsIter {
    /// the _next_ combination we'll output (unless we're done).
    counts: MultisetU8x8,
    /// total number of dice rolls per combination.
    total_dice: u8,
    /// set to `true` when we're done generating.
    done: bool,
}

impl AllDiceMultisetsIter {
    fn new(total_dice: u8) -> Self {
        // initialize with our the very first combination: [1, 1, .., 1]
        let mut counts = MultisetU8x8::new();
        counts.set_count(1, total_dice);

        Self {
            counts,
            total_dice,
            done: false,
        }
    }
}

impl Iterator for AllDiceMultisetsIter {
    type Item = DiceSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // this is the combination we're about to output
        let current = DiceSet(self.counts);

        // we're done when we finally reach [6, 6, .., 6]
        if self.counts.get_count(NUM_FACES) == self.total_dice {
            self.done = true;
        } else {
            // patch self.counts to be the _next_ combination we'll output
            for i in 1..NUM_FACES {
                let count_i = self.counts.get_count(i);
                if count_i > 0 {
                    self.counts.set_count(i + 1, self.counts.get_count(i + 1) + 1);
                    for j in 2..=i {
                        self.counts.set_count(j, 0);
                    }
                    self.counts.set_count(1, count_i - 1);
                    break;
                }
            }
        }

        Some(current)
    }
}

impl FusedIterator for AllDiceMultisetsIter {}

///////////
// Tests //
///////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::{num_multisets, rng::FixedRolls};
    use approx::assert_relative_eq;
    use claim::{assert_ok, assert_ok_eq};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn dice(s: &str) -> DiceSet {
        DiceSet::from_str(s).unwrap()
    }

    #[test]
    fn test_decode() {
        let straight = assert_ok!(DiceSet::decode(&[1, 2, 3, 4, 5, 6]));
        assert_eq!(6, straight.len());
        for face in 1..=6 {
            assert_eq!(1, straight.get_count(face));
        }

        let dice = assert_ok!(DiceSet::decode(&[1, 1, 1, 2, 3]));
        assert_eq!(5, dice.len());
        assert_eq!(3, dice.get_count(1));
        assert_eq!(1, dice.get_count(2));
        assert_eq!(1, dice.get_count(3));

        assert_ok_eq!(DiceSet::decode(&[]), DiceSet::new());
        assert_eq!(Err(DiceError::InvalidFace(0)), DiceSet::decode(&[1, 0, 2]));
        assert_eq!(Err(DiceError::InvalidFace(7)), DiceSet::decode(&[6, 7]));

        let lots = vec![1; MAX_SET_LEN];
        assert_eq!(MAX_SET_LEN as u8, assert_ok!(DiceSet::decode(&lots)).get_count(1));
        assert_eq!(Err(DiceError::TooManyDice(256)), DiceSet::decode(&[1; 256]));
    }

    #[test]
    fn test_decode_int() {
        assert_ok_eq!(DiceSet::decode_int(0), DiceSet::new());
        assert_ok_eq!(DiceSet::decode_int(455566), DiceSet::from_counts([0, 0, 0, 1, 3, 2]));
        assert_ok_eq!(DiceSet::decode_int(11123), DiceSet::from_counts([3, 1, 1, 0, 0, 0]));
        assert_eq!(Err(DiceError::InvalidFace(0)), DiceSet::decode_int(105));
        assert_eq!(Err(DiceError::InvalidFace(9)), DiceSet::decode_int(19));
    }

    #[test]
    fn test_parse_faces() {
        assert_ok_eq!(parse_faces("155"), vec![1, 5, 5]);
        assert_ok_eq!(parse_faces(" 0015\n"), vec![1, 5]);
        assert_ok_eq!(parse_faces("[1,5,5]"), vec![1, 5, 5]);
        assert_ok_eq!(parse_faces("0"), Vec::<u8>::new());
        assert_ok_eq!(parse_faces(""), Vec::<u8>::new());
        // range checking happens when decoding
        assert_ok_eq!(parse_faces("1079"), vec![1, 0, 7, 9]);
        assert_eq!(Err(ParseDiceError::NotADigit('x')), parse_faces("1x5"));
        assert_eq!(Err(ParseDiceError::NotADigit('-')), parse_faces("-15"));
    }

    #[test]
    fn test_dice_set_from_str() {
        assert_eq!(DiceSet::from_counts([1, 1, 1, 1, 1, 1]), dice("123456"));
        assert_eq!(DiceSet::from_counts([1, 1, 1, 1, 1, 1]), dice("654321"));
        assert_eq!(DiceSet::new(), dice("0"));
        assert_eq!(
            Err(ParseDiceError::Dice(DiceError::InvalidFace(7))),
            DiceSet::from_str("1237")
        );
    }

    #[test]
    fn test_display_sorted() {
        assert_eq!("112556", dice("651251").to_string());
        assert_eq!("", DiceSet::new().to_string());
    }

    #[test]
    fn test_roll() {
        let mut rng = FixedRolls::new(&[6, 1, 5, 1, 3]);
        let rolled = DiceSet::roll(5, &mut rng);
        assert_eq!(dice("11356"), rolled);
        assert!(rng.is_exhausted());

        let mut rng = FixedRolls::new(&[]);
        assert_eq!(DiceSet::new(), DiceSet::roll(0, &mut rng));
    }

    #[test]
    fn test_score() {
        assert_eq!(0, DiceSet::new().score());
        assert_eq!(100, dice("1").score());
        assert_eq!(150, dice("51").score());
        assert_eq!(0, dice("223").score());
        assert_eq!(0, dice("44").score());
        assert_eq!(1500, dice("654321").score());
        assert_eq!(250, dice("115322").score());
        assert_eq!(1050, dice("115312").score());
        assert_eq!(1000, dice("11123").score());
        assert_eq!(500, dice("455566").score());
        assert_eq!(550, dice("455556").score());
        assert_eq!(400, dice("444").score());
        assert_eq!(400, dice("4444").score());
        assert_eq!(800, dice("444444").score());
        assert_eq!(1100, dice("1111").score());
        assert_eq!(1200, dice("11111").score());
        assert_eq!(2000, dice("111111").score());
        assert_eq!(600, dice("55555").score());
        assert_eq!(1000, dice("555555").score());
        assert_eq!(1200, dice("222111").score());
        // five of the six faces is not a straight
        assert_eq!(150, dice("12345").score());
    }

    #[test]
    fn test_is_bust() {
        assert!(DiceSet::new().is_bust());
        assert!(dice("2").is_bust());
        assert!(dice("223346").is_bust());
        assert!(dice("224466").is_bust());
        assert!(!dice("1").is_bust());
        assert!(!dice("5").is_bust());
        assert!(!dice("333").is_bust());
        assert!(!dice("123456").is_bust());
        assert!(!dice("226663").is_bust());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn test_prop_bust_iff_zero_score(dice in any::<DiceSet>()) {
            prop_assume!(!dice.is_empty());
            prop_assert_eq!(dice.is_bust(), dice.score() == 0);
        }

        #[test]
        fn test_prop_combos_sum_to_score(dice in any::<DiceSet>()) {
            let points: u32 = dice.combos().into_iter().map(Combo::points).sum();
            prop_assert_eq!(dice.score(), points);
        }

        #[test]
        fn test_prop_scoring_dice(dice in any::<DiceSet>()) {
            let scoring = dice.scoring_dice();
            prop_assert!(dice.is_superset_of(scoring));
            prop_assert_eq!(dice.score(), scoring.score());
            prop_assert_eq!(scoring, scoring.scoring_dice());
        }

        #[test]
        fn test_prop_select_partitions(
            dice in any::<DiceSet>(),
            choice in proptest::collection::vec(1_u8..=6, 0..=6),
        ) {
            match dice.select(&choice) {
                Ok(Split { kept, remaining }) => {
                    prop_assert_eq!(choice.len() as u8, kept.len());
                    prop_assert_eq!(dice.len(), kept.len() + remaining.len());
                    prop_assert_eq!(DiceSet::decode(&choice).unwrap(), kept);
                    for face in 1..=6 {
                        prop_assert_eq!(
                            dice.get_count(face),
                            kept.get_count(face) + remaining.get_count(face)
                        );
                    }
                }
                Err(DiceError::InsufficientDice { .. }) => {
                    prop_assert!(!dice.is_superset_of(DiceSet::decode(&choice).unwrap()));
                }
                Err(err) => prop_assert!(false, "unexpected error: {}", err),
            }
        }
    }

    #[test]
    fn test_select() {
        let available = DiceSet::from_counts([2, 0, 0, 0, 1, 0]);

        assert_eq!(
            Err(DiceError::InsufficientDice {
                face: 6,
                requested: 2,
                available: 0,
            }),
            available.select(&[6, 6])
        );
        assert_eq!(Err(DiceError::InvalidFace(8)), available.select(&[1, 8]));
        assert_eq!(
            Err(DiceError::InsufficientDice {
                face: 1,
                requested: 3,
                available: 2,
            }),
            available.select(&[1, 1, 1])
        );

        // failed selections don't disturb the available dice
        assert_eq!(DiceSet::from_counts([2, 0, 0, 0, 1, 0]), available);
        let split = assert_ok!(available.select(&[1, 5]));
        assert_eq!(dice("15"), split.kept);
        assert_eq!(dice("1"), split.remaining);

        // selecting nothing keeps nothing
        let split = assert_ok!(available.select(&[]));
        assert!(split.kept.is_empty());
        assert_eq!(available, split.remaining);

        // a huge selection is just short on dice, not a corrupted count
        assert_eq!(
            Err(DiceError::InsufficientDice {
                face: 1,
                requested: 300,
                available: 2,
            }),
            available.select(&[1; 300])
        );

        // selecting everything leaves nothing
        let split = assert_ok!(available.select(&[5, 1, 1]));
        assert_eq!(available, split.kept);
        assert!(split.remaining.is_empty());
    }

    #[test]
    fn test_combos() {
        assert_eq!(vec![Combo::Straight], dice("123456").combos());
        assert_eq!(
            vec![
                Combo::Sets { face: 5, nsets: 1 },
                Combo::Singles { face: 5, count: 1 },
            ],
            dice("455556").combos(),
        );
        assert_eq!(
            vec![
                Combo::Singles { face: 1, count: 2 },
                Combo::Sets { face: 3, nsets: 1 },
            ],
            dice("113334").combos(),
        );
        assert_eq!(
            vec![Combo::Sets { face: 2, nsets: 2 }],
            dice("222222").combos(),
        );
        assert!(dice("2346").combos().is_empty());

        assert_eq!("three 5's", Combo::Sets { face: 5, nsets: 1 }.to_string());
        assert_eq!("2 single 1's", Combo::Singles { face: 1, count: 2 }.to_string());
    }

    #[test]
    fn test_scoring_dice() {
        assert_eq!(dice("5555"), dice("455556").scoring_dice());
        assert_eq!(dice("555"), dice("455566").scoring_dice());
        assert_eq!(dice("123456"), dice("123456").scoring_dice());
        assert_eq!(dice("222"), dice("22223").scoring_dice());
        assert_eq!(DiceSet::new(), dice("2346").scoring_dice());
    }

    fn all_dice_multisets_ref(ndice: u8) -> Vec<DiceSet> {
        fn rec(cb: &mut impl FnMut(DiceSet), faces: &mut Vec<u8>, current_face: u8, ndice: u8) {
            if ndice == 0 {
                cb(faces.iter().copied().collect());
                return;
            }
            for face in current_face..=6 {
                faces.push(face);
                rec(cb, faces, face, ndice - 1);
                faces.pop();
            }
        }

        let mut out = Vec::new();
        rec(&mut |dice| out.push(dice), &mut Vec::new(), 1, ndice);
        out.sort_unstable();
        out
    }

    #[test]
    fn test_all_dice_multisets_iter() {
        for k in 0..=6 {
            let mut combs = DiceSet::all_multisets(k as u8).collect::<Vec<_>>();
            combs.sort_unstable();

            // outputs expected number of elements
            assert_eq!(num_multisets(6, k) as usize, combs.len());

            // no duplicates
            let combs_set = HashSet::<DiceSet>::from_iter(combs.clone().into_iter());
            assert_eq!(num_multisets(6, k) as usize, combs_set.len());

            // matches recursive implementation
            let combs_ref = all_dice_multisets_ref(k as u8);
            assert_eq!(combs, combs_ref);
        }
    }

    #[test]
    fn test_p_roll() {
        assert_relative_eq!(1.0, DiceSet::new().p_roll());
        assert_relative_eq!(1.0 / 6.0, dice("3").p_roll());
        assert_relative_eq!(720.0 / 46656.0, dice("123456").p_roll());
        assert_relative_eq!(1.0 / 46656.0, dice("111111").p_roll());

        // the pmf over all rolls of n dice sums to one
        for ndice in 0..=6 {
            let total: f64 = DiceSet::all_multisets(ndice).map(DiceSet::p_roll).sum();
            assert_relative_eq!(1.0, total, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_p_bust() {
        assert_relative_eq!(1.0, p_bust(0).unwrap());
        assert_relative_eq!(4.0 / 6.0, p_bust(1).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(16.0 / 36.0, p_bust(2).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(60.0 / 216.0, p_bust(3).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(204.0 / 1296.0, p_bust(4).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(600.0 / 7776.0, p_bust(5).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(1440.0 / 46656.0, p_bust(6).unwrap(), epsilon = 1e-12);
        assert_eq!(None, p_bust(7));
        assert_eq!(None, p_bust(u8::MAX));
    }

    #[test]
    fn test_expected_roll_score() {
        assert_relative_eq!(0.0, expected_roll_score(0).unwrap());
        assert_relative_eq!(25.0, expected_roll_score(1).unwrap(), epsilon = 1e-9);
        assert_relative_eq!(50.0, expected_roll_score(2).unwrap(), epsilon = 1e-9);
        assert_relative_eq!(3125.0 / 36.0, expected_roll_score(3).unwrap(), epsilon = 1e-9);
        assert_relative_eq!(284875.0 / 864.0, expected_roll_score(6).unwrap(), epsilon = 1e-9);
        assert_eq!(None, expected_roll_score(7));
    }

    #[test]
    fn test_serde_as_digits() {
        let dice = dice("455566");
        let json = serde_json::to_string(&dice).unwrap();
        assert_eq!("\"455566\"", json);
        assert_eq!(dice, serde_json::from_str::<DiceSet>(&json).unwrap());
    }
}
