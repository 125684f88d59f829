use crate::u64_sum_all_bytes;
#[cfg(test)]
use proptest::{
    arbitrary::{any, Arbitrary},
    strategy::{BoxedStrategy, Strategy},
};
use std::{
    cmp, fmt,
    hash::{Hash, Hasher},
    ops,
};

/// A compressed representation of a multiset (a set with potential duplicates
/// of the same item), that can store up to 8 entries with individual counts
/// in the range `0..=255`.
///
/// `MultisetU8x8` is laid out like `0x7766_5544_3322_1100`, where each byte
/// `XX` is the number of items at index `0 <= X < 8` in the multiset.
///
/// The total number of items across all entries must also stay below 256, so
/// that `len` can sum the bytes without carrying into the next lane.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, Default)]
pub struct MultisetU8x8(u64);

impl MultisetU8x8 {
    /// A new empty set of counts.
    #[inline]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn from_counts(cs: [u8; 8]) -> Self {
        Self(u64::from_le_bytes(cs))
    }

    #[inline]
    pub const fn from_count(idx: u8, count: u8) -> Self {
        Self((count as u64) << (8 * (idx as u64)))
    }

    #[inline]
    pub const fn into_counts(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::new()
    }

    #[inline]
    pub fn len(self) -> u8 {
        // the length of a multiset is the sum of the counts of each element.
        // each count is a byte packed into a u64, so the length is just the
        // horizontal sum of all the bytes.
        u64_sum_all_bytes(self.0) as u8
    }

    #[inline]
    pub const fn get_count(self, idx: u8) -> u8 {
        (self.0 >> (8 * (idx as u64)) & 0xff) as u8
    }

    #[inline]
    pub fn set_count(&mut self, idx: u8, count: u8) {
        debug_assert!((0..8).contains(&idx));

        self.0 = (self.0 & !(0xff << (8 * (idx as u64)))) | ((count as u64) << (8 * (idx as u64)));
    }

    pub fn is_superset_of(self, other: Self) -> bool {
        (0..8).all(|idx| self.get_count(idx) >= other.get_count(idx))
    }

    pub fn into_iter_flat(self) -> impl Iterator<Item = u8> {
        (0..8).flat_map(move |idx| std::iter::repeat(idx).take(self.get_count(idx) as usize))
    }

    pub fn from_iter_flat(iter: impl Iterator<Item = u8>) -> Self {
        iter.map(|idx| Self::from_count(idx, 1))
            .fold(Self::new(), |acc, single| acc + single)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn into_iter(self) -> impl Iterator<Item = (u8, u8)> {
        self.into_counts()
            .into_iter()
            .enumerate()
            .map(|(idx, count)| (idx as u8, count))
    }
}

impl FromIterator<(u8, u8)> for MultisetU8x8 {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (u8, u8)>,
    {
        iter.into_iter().fold(Self::new(), |acc, (idx, count)| {
            acc + MultisetU8x8::from_count(idx, count)
        })
    }
}

impl fmt::Debug for MultisetU8x8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.into_iter().filter(|(_idx, count)| count > &0);
        f.debug_map().entries(entries).finish()
    }
}

impl ops::Add for MultisetU8x8 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl ops::AddAssign for MultisetU8x8 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0.add_assign(rhs.0)
    }
}

/// Lane-wise difference. Callers must check `is_superset_of` first, otherwise
/// a borrow leaks into the neighbouring count.
impl ops::Sub for MultisetU8x8 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        debug_assert!(self.is_superset_of(rhs));
        Self(self.0 - rhs.0)
    }
}

impl ops::SubAssign for MultisetU8x8 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        debug_assert!(self.is_superset_of(rhs));
        self.0.sub_assign(rhs.0)
    }
}

impl cmp::PartialEq for MultisetU8x8 {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_u64().eq(&other.as_u64())
    }
}

impl cmp::Ord for MultisetU8x8 {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.into_iter_flat().cmp(other.into_iter_flat())
    }
}

impl cmp::PartialOrd for MultisetU8x8 {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for MultisetU8x8 {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.as_u64())
    }
}

#[cfg(test)]
impl Arbitrary for MultisetU8x8 {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        // keep each lane < 16, so even the sum of two sets stays below 256
        any::<[u8; 8]>()
            .prop_map(|counts| Self::from_counts(counts.map(|count| count & 0x0f)))
            .boxed()
    }
}
