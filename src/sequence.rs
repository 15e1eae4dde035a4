//! Ordered Sequence
//!
//! A singly linked chain of nodes, each holding an optional element and an
//! optional link to the rest of the chain. Every edit consumes the input
//! sequence and returns the successor value; the input must be treated as
//! spent once passed in. This is what keeps a sequence usable both as the
//! in-memory mirror's data and as the shape written to durable storage:
//! no edit ever leaves a half-mutated chain behind.
//!
//! Two in-memory representations are equivalent: the normalized form, where
//! every element node links to an explicit (possibly empty) tail node, and a
//! lazy form whose last element node omits the trailing empty marker.
//! Public operations accept either and return normalized chains. Equality
//! and iteration never distinguish the two.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Error for operations that require a predicate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no element matched the predicate")
    }
}

impl std::error::Error for NotFound {}

/// An ordered sequence with by-value edit operations.
///
/// All "first match" operations scan head to tail and act on the first
/// satisfying element; later duplicates are never considered.
#[derive(Debug, Clone)]
pub struct Sequence<T> {
    head: Option<T>,
    tail: Option<Box<Sequence<T>>>,
}

impl<T> Sequence<T> {
    /// The canonical empty sequence.
    pub fn empty() -> Self {
        Sequence {
            head: None,
            tail: None,
        }
    }

    /// A one-element sequence.
    fn single(elt: T) -> Self {
        Self::cons(elt, Self::empty())
    }

    /// Links `elt` in front of `tail`. Always produces an explicit tail,
    /// so chains built through `cons` are normalized.
    fn cons(elt: T, tail: Sequence<T>) -> Self {
        Sequence {
            head: Some(elt),
            tail: Some(Box::new(tail)),
        }
    }

    /// Splits into the head element and the remaining chain. A missing tail
    /// link (lazy form) unwraps to the canonical empty sequence.
    fn into_parts(self) -> (Option<T>, Sequence<T>) {
        let Sequence { head, tail } = self;
        let tail = tail.map(|b| *b).unwrap_or_else(Sequence::empty);
        (head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of elements. O(length).
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter { cur: Some(self) }
    }

    /// True when every element node carries an explicit tail link and the
    /// chain ends in the canonical empty node.
    pub fn is_normalized(&self) -> bool {
        let mut cur = self;
        loop {
            match (&cur.head, &cur.tail) {
                (None, None) => return true,
                (None, Some(_)) | (Some(_), None) => return false,
                (Some(_), Some(next)) => cur = next,
            }
        }
    }

    /// Rewrites the chain into the normalized form: explicit tail links
    /// everywhere, terminated by the canonical empty node. A node with no
    /// element truncates the chain at that point.
    pub fn normalize(self) -> Self {
        let (head, tail) = self.into_parts();
        match head {
            None => Self::empty(),
            Some(h) => Self::cons(h, tail.normalize()),
        }
    }

    /// O(1) prepend.
    pub fn insert_front(self, elt: T) -> Self {
        Self::cons(elt, self)
    }

    /// Appends at the tail. O(length).
    pub fn insert_back(self, elt: T) -> Self {
        let (head, tail) = self.into_parts();
        match head {
            None => Self::single(elt),
            Some(h) => Self::cons(h, tail.insert_back(elt)),
        }
    }

    /// Inserts `elt` immediately before the first element matching `pred`.
    /// The position is advisory: with no match the sequence is unchanged.
    pub fn insert_before<P>(self, elt: T, pred: P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        self.insert_before_ref(elt, &pred)
    }

    fn insert_before_ref<P>(self, elt: T, pred: &P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        let (head, tail) = self.into_parts();
        match head {
            None => Self::empty(),
            Some(h) if pred(&h) => Self::cons(elt, Self::cons(h, tail)),
            Some(h) => Self::cons(h, tail.insert_before_ref(elt, pred)),
        }
    }

    /// Inserts `elt` immediately after the first element matching `pred`.
    /// No-op when nothing matches.
    pub fn insert_after<P>(self, elt: T, pred: P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        self.insert_after_ref(elt, &pred)
    }

    fn insert_after_ref<P>(self, elt: T, pred: &P) -> Self
    where
        P: Fn(&T) -> bool,
    {
        let (head, tail) = self.into_parts();
        match head {
            None => Self::empty(),
            Some(h) if pred(&h) => Self::cons(h, Self::cons(elt, tail)),
            Some(h) => Self::cons(h, tail.insert_after_ref(elt, pred)),
        }
    }

    /// First element matching `pred`, or `NotFound`.
    pub fn find<P>(&self, pred: P) -> Result<&T, NotFound>
    where
        P: Fn(&T) -> bool,
    {
        self.iter().find(|elt| pred(elt)).ok_or(NotFound)
    }

    /// Removes and returns the first element matching `pred` together with
    /// the resulting sequence. With no match the element slot is `None` and
    /// the sequence comes back unchanged; callers that require presence must
    /// check before treating the extraction as successful.
    pub fn extract<P>(self, pred: P) -> (Option<T>, Self)
    where
        P: Fn(&T) -> bool,
    {
        self.extract_ref(&pred)
    }

    fn extract_ref<P>(self, pred: &P) -> (Option<T>, Self)
    where
        P: Fn(&T) -> bool,
    {
        let (head, tail) = self.into_parts();
        match head {
            None => (None, Self::empty()),
            Some(h) if pred(&h) => (Some(h), tail),
            Some(h) => {
                let (extracted, rest) = tail.extract_ref(pred);
                (extracted, Self::cons(h, rest))
            }
        }
    }

    /// Extracts the element matching `elt_pred` and reinserts it immediately
    /// before the element matching `sib_pred` in the post-extraction chain.
    /// Fails without dropping or duplicating anything if either predicate
    /// matches no element.
    pub fn move_before<P, Q>(self, elt_pred: P, sib_pred: Q) -> Result<Self, NotFound>
    where
        P: Fn(&T) -> bool,
        Q: Fn(&T) -> bool,
    {
        let (extracted, rest) = self.extract(elt_pred);
        let elt = extracted.ok_or(NotFound)?;
        rest.find(&sib_pred)?;
        Ok(rest.insert_before(elt, sib_pred))
    }

    /// As [`Sequence::move_before`], reinserting after the sibling instead.
    pub fn move_after<P, Q>(self, elt_pred: P, sib_pred: Q) -> Result<Self, NotFound>
    where
        P: Fn(&T) -> bool,
        Q: Fn(&T) -> bool,
    {
        let (extracted, rest) = self.extract(elt_pred);
        let elt = extracted.ok_or(NotFound)?;
        rest.find(&sib_pred)?;
        Ok(rest.insert_after(elt, sib_pred))
    }

    /// Extracts the first match and prepends it.
    pub fn move_to_front<P>(self, pred: P) -> Result<Self, NotFound>
    where
        P: Fn(&T) -> bool,
    {
        let (extracted, rest) = self.extract(pred);
        let elt = extracted.ok_or(NotFound)?;
        Ok(rest.insert_front(elt))
    }

    /// Replaces the first element matching `pred` with `f(element)`. All
    /// other elements, and the order, are untouched. No-op when nothing
    /// matches.
    pub fn map_matching<P, F>(self, pred: P, f: F) -> Self
    where
        P: Fn(&T) -> bool,
        F: FnOnce(T) -> T,
    {
        self.map_matching_ref(&pred, f)
    }

    fn map_matching_ref<P, F>(self, pred: &P, f: F) -> Self
    where
        P: Fn(&T) -> bool,
        F: FnOnce(T) -> T,
    {
        let (head, tail) = self.into_parts();
        match head {
            None => Self::empty(),
            Some(h) if pred(&h) => Self::cons(f(h), tail),
            Some(h) => Self::cons(h, tail.map_matching_ref(pred, f)),
        }
    }

    /// Drains the chain into a vector, head first.
    pub fn to_vec(self) -> Vec<T> {
        let mut out = Vec::new();
        let mut cur = self;
        loop {
            let (head, tail) = cur.into_parts();
            match head {
                Some(h) => {
                    out.push(h);
                    cur = tail;
                }
                None => return out,
            }
        }
    }

    /// Builds a normalized chain preserving the vector's order. Inverse of
    /// [`Sequence::to_vec`] up to element equality.
    pub fn from_vec(elts: Vec<T>) -> Self {
        let mut seq = Self::empty();
        for elt in elts.into_iter().rev() {
            seq = Self::cons(elt, seq);
        }
        seq
    }
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: PartialEq> PartialEq for Sequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Sequence<T> {}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    cur: Option<&'a Sequence<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.cur?;
        match &node.head {
            Some(elt) => {
                self.cur = node.tail.as_deref();
                Some(elt)
            }
            None => {
                self.cur = None;
                None
            }
        }
    }
}

// Chains serialize as flat arrays. Writing the node structure verbatim
// would nest one JSON object per element, which deep lists cannot
// deserialize within serde_json's recursion limit.
impl<T: Serialize> Serialize for Sequence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sequence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_vec(Vec::<T>::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(elts: &[i32]) -> Sequence<i32> {
        Sequence::from_vec(elts.to_vec())
    }

    /// Last element node with the trailing empty marker omitted.
    fn lazy_single(elt: i32) -> Sequence<i32> {
        Sequence {
            head: Some(elt),
            tail: None,
        }
    }

    #[test]
    fn test_empty_is_empty() {
        let s: Sequence<i32> = Sequence::empty();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert!(s.is_normalized());
    }

    #[test]
    fn test_insert_front_and_back() {
        let s = Sequence::empty().insert_back(2).insert_front(1).insert_back(3);
        assert_eq!(s.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_round_trip() {
        for elts in [vec![], vec![1], vec![1, 2, 3, 4, 5]] {
            assert_eq!(Sequence::from_vec(elts.clone()).to_vec(), elts);
        }
    }

    #[test]
    fn test_insert_before_first_match_only() {
        let s = seq(&[1, 2, 2, 3]).insert_before(9, |&e| e == 2);
        assert_eq!(s.to_vec(), vec![1, 9, 2, 2, 3]);
    }

    #[test]
    fn test_insert_before_no_match_is_noop() {
        let s = seq(&[1, 2, 3]).insert_before(9, |&e| e == 7);
        assert_eq!(s.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_after() {
        let s = seq(&[1, 2, 3]).insert_after(9, |&e| e == 2);
        assert_eq!(s.to_vec(), vec![1, 2, 9, 3]);

        let s = seq(&[1, 2, 3]).insert_after(9, |&e| e == 3);
        assert_eq!(s.to_vec(), vec![1, 2, 3, 9]);

        let s = seq(&[1, 2, 3]).insert_after(9, |&e| e == 7);
        assert_eq!(s.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_find() {
        let s = seq(&[1, 2, 3]);
        assert_eq!(s.find(|&e| e == 2), Ok(&2));
        assert_eq!(s.find(|&e| e == 7), Err(NotFound));
    }

    #[test]
    fn test_extract_first_match() {
        let (elt, rest) = seq(&[1, 2, 2, 3]).extract(|&e| e == 2);
        assert_eq!(elt, Some(2));
        assert_eq!(rest.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_extract_no_match_leaves_sequence_unchanged() {
        let (elt, rest) = seq(&[1, 2, 3]).extract(|&e| e == 7);
        assert_eq!(elt, None);
        assert_eq!(rest.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_extract_inverse() {
        let s = seq(&[1, 2, 3]);
        let (elt, rest) = s.clone().insert_front(9).extract(|&e| e == 9);
        assert_eq!(elt, Some(9));
        assert_eq!(rest, s);
    }

    #[test]
    fn test_move_before() {
        let s = seq(&[1, 2, 3, 4]).move_before(|&e| e == 4, |&e| e == 2).unwrap();
        assert_eq!(s.to_vec(), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_move_before_adjacent_uses_post_extraction_order() {
        // Extracting 2 first, the sibling 3 is found in [1, 3]: 2 lands
        // directly before 3, leaving the order unchanged.
        let s = seq(&[1, 2, 3]).move_before(|&e| e == 2, |&e| e == 3).unwrap();
        assert_eq!(s.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_move_before_missing_element_or_sibling_fails() {
        assert_eq!(
            seq(&[1, 2, 3]).move_before(|&e| e == 7, |&e| e == 2),
            Err(NotFound)
        );
        assert_eq!(
            seq(&[1, 2, 3]).move_before(|&e| e == 2, |&e| e == 7),
            Err(NotFound)
        );
        // The sibling lookup runs post-extraction: an element cannot be
        // moved before itself.
        assert_eq!(
            seq(&[1, 2, 3]).move_before(|&e| e == 2, |&e| e == 2),
            Err(NotFound)
        );
    }

    #[test]
    fn test_move_after() {
        let s = seq(&[1, 2, 3, 4]).move_after(|&e| e == 1, |&e| e == 3).unwrap();
        assert_eq!(s.to_vec(), vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_move_to_front() {
        let s = seq(&[1, 2, 3]).move_to_front(|&e| e == 3).unwrap();
        assert_eq!(s.to_vec(), vec![3, 1, 2]);
        assert_eq!(seq(&[1, 2]).move_to_front(|&e| e == 7), Err(NotFound));
    }

    #[test]
    fn test_moves_preserve_membership_and_length() {
        let before = seq(&[1, 2, 3, 4, 5]);
        let after = before.clone().move_before(|&e| e == 5, |&e| e == 2).unwrap();
        assert_eq!(after.len(), before.len());
        let mut a = after.to_vec();
        let mut b = before.to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_map_matching_replaces_first_only() {
        let s = seq(&[1, 2, 2, 3]).map_matching(|&e| e == 2, |e| e * 10);
        assert_eq!(s.to_vec(), vec![1, 20, 2, 3]);

        let s = seq(&[1, 2, 3]).map_matching(|&e| e == 7, |e| e * 10);
        assert_eq!(s.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_lazy_and_normalized_forms_are_equal() {
        let lazy = lazy_single(1);
        let normalized = seq(&[1]);
        assert!(!lazy.is_normalized());
        assert!(normalized.is_normalized());
        assert_eq!(lazy, normalized);
        assert_eq!(lazy.len(), 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = lazy_single(1).normalize();
        assert!(once.is_normalized());
        let twice = once.clone().normalize();
        assert!(twice.is_normalized());
        assert_eq!(once, twice);
        assert_eq!(once.to_vec(), vec![1]);
    }

    #[test]
    fn test_operations_return_normalized_chains() {
        assert!(seq(&[1, 2]).insert_back(3).is_normalized());
        assert!(seq(&[1, 2]).insert_before(9, |&e| e == 2).is_normalized());
        assert!(seq(&[1, 2]).extract(|&e| e == 1).1.is_normalized());
        assert!(seq(&[1, 2, 3])
            .move_before(|&e| e == 3, |&e| e == 1)
            .unwrap()
            .is_normalized());
        // Traversing operations normalize lazy input as a side effect.
        assert!(lazy_single(1).insert_back(2).is_normalized());
    }

    #[test]
    fn test_serde_flat_array() {
        let s = seq(&[1, 2, 3]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Sequence<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
        assert!(back.is_normalized());
    }

    #[test]
    fn test_serde_deep_chain() {
        let elts: Vec<i32> = (0..2000).collect();
        let s = Sequence::from_vec(elts.clone());
        let json = serde_json::to_string(&s).unwrap();
        let back: Sequence<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_vec(), elts);
    }
}
