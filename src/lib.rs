#![warn(missing_docs)]
#![doc(test(no_crate_inject))]
#![doc(test(attr(deny(unused, future_incompatible))))]

//! This crate mines High Utility Generators (HUGs) from a transaction database where every item
//! occurrence carries a utility, such as price times quantity.
//!
//! A HUG is an itemset whose total utility across the transactions containing it reaches a
//! minimum threshold, and which is minimal for its support: no proper subset occurs in exactly the
//! same number of transactions.
//!
//! The search is level-wise over the lattice of itemsets. An [`ItemsetRegistry`] holds one
//! [`Layer`] per itemset length. Each layer is evaluated against a [`Dataset`], itemsets whose
//! transaction-weighted utilization falls below the threshold are pruned, and the survivors are
//! joined pairwise to produce the next layer. Occurrence sets and per-transaction utilities for
//! longer itemsets are derived from the already-computed lists of their shorter subsets, so the
//! raw transactions are only scanned for single items.
//!
//! ```
//! use hug_miner::{ItemsetRegistry, Label, TransactionTable};
//!
//! let mut table = TransactionTable::new();
//! table.add_transaction(vec![(1u8, 5), (2, 1)]).unwrap();
//! table.add_transaction(vec![(1, 5)]).unwrap();
//! table.add_transaction(vec![(1, 5), (2, 1)]).unwrap();
//!
//! let mut registry = ItemsetRegistry::with_items(table.items(), None);
//! let hugs = registry.mine(&table, 10).unwrap();
//!
//! assert_eq!(hugs.len(), 1);
//! assert_eq!(hugs[0].label, Label::new(&[1]));
//! assert_eq!(hugs[0].utility, 15);
//! assert_eq!(hugs[0].support, 3);
//! assert_eq!(hugs[0].twu, 17);
//! ```

pub use sorted_iter;

use lasso::{LargeSpur, MicroSpur, MiniSpur, Spur};
use smallvec::SmallVec;
use sorted_iter::assume::AssumeSortedByItemExt;
use sorted_iter::sorted_iterator::SortedByItem;
use sorted_iter::SortedIterator;
use std::iter;

mod combinations;
mod config;
mod dataset;
mod error;
mod input;
mod itemset;
mod registry;

pub use combinations::Combinations;
pub use config::MiningConfig;
pub use dataset::{Dataset, Transaction, TransactionTable};
pub use error::{ConfigError, InputError, MineError, UtilityOverflow};
pub use input::read_transactions;
pub use itemset::{Itemset, Stage};
pub use registry::{Hug, ItemsetRegistry, Layer, MiningSummary};

/// Identifies a transaction. Transactions are numbered from 1.
pub type TransactionId = usize;

/// Utility of an item, itemset, or transaction.
pub type Utility = i64;

/// Types which can be used as items in a [`Label`].
pub trait ItemId: Sized + Copy + std::hash::Hash + Ord + std::fmt::Debug {
    /// SmallVec contains two `usize` fields which overlap with the inline vector, so labels will
    /// have minimum size if this array occupies the same number of bytes.
    ///
    /// It can be declared like this for any implementation, or you can have the [`item_id!`]
    /// macro do it for you.
    ///
    /// ```ignore
    /// use std::mem::size_of;
    /// type SmallArray = [Self; 2 * size_of::<usize>() / size_of::<Self>()];
    /// ```
    type SmallArray: smallvec::Array<Item = Self> + Clone + std::fmt::Debug + std::hash::Hash + Ord;
}

/// Generates implementations of the [`ItemId`] trait which set the associated `SmallArray` type
/// to the biggest array that will fit within a [`SmallVec`][smallvec::SmallVec]'s minimum size.
///
/// It also generates a test with the given `$testname` that checks that the generated definition
/// is as small as the smallest `SmallVec`.
///
/// For example, this library provides implementations for the basic integer types using this
/// declaration:
///
/// ```ignore
/// item_id![unsigned_id_size, u8, u16, u32, u64, usize];
/// ```
#[macro_export]
macro_rules! item_id {
    ($testname:ident, $($t:ty),*) => {
        $(
            impl $crate::ItemId for $t {
                type SmallArray = [
                    Self;
                    2 * ::std::mem::size_of::<usize>() / ::std::mem::size_of::<Self>()
                ];
            }
        )*

        #[cfg(test)]
        #[test]
        fn $testname() {
            use $crate::Label;
            use smallvec::SmallVec;
            use std::mem::size_of;
            $(
                assert_eq!(
                    size_of::<Label<$t>>(),
                    size_of::<SmallVec<[(); 0]>>()
                );
            )*
        }
    };
}

item_id![lasso_id_size, LargeSpur, Spur, MiniSpur, MicroSpur];
item_id![unsigned_id_size, u8, u16, u32, u64, usize];
item_id![signed_id_size, i8, i16, i32, i64, isize];

/// The items of an itemset, in ascending canonical order and without duplicates.
///
/// Two itemsets are the same pattern exactly when their labels are equal. This implementation
/// avoids heap allocations for labels shorter than the length of [`ItemId::SmallArray`].
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label<I: ItemId>(SmallVec<I::SmallArray>);

impl<I: ItemId> Label<I> {
    /// Creates a label containing the specified items.
    ///
    /// It's okay if the provided slice contains duplicates or is out of order.
    pub fn new(ids: &[I]) -> Self {
        let mut v = SmallVec::from_slice(ids);
        v.sort_unstable();
        v.dedup();
        Label(v)
    }

    /// Builds a label from a prefix followed by two more items, all of which are already known to
    /// be in ascending order.
    pub(crate) fn extend_sorted(prefix: &[I], a: I, b: I) -> Self {
        let mut v = SmallVec::with_capacity(prefix.len() + 2);
        v.extend_from_slice(prefix);
        v.push(a);
        v.push(b);
        debug_assert!(v.windows(2).all(|w| w[0] < w[1]));
        Label(v)
    }

    /// The number of items in the label.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the label has no items.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The items in ascending order.
    pub fn as_slice(&self) -> &[I] {
        &self.0
    }

    /// The greatest item in the label.
    pub fn last(&self) -> Option<I> {
        self.0.last().copied()
    }

    /// Returns an iterator over the items which appear in this label.
    ///
    /// ```
    /// use hug_miner::Label;
    ///
    /// let abc = Label::new(&[2, 3, 1]);
    /// let mut it = abc.iter();
    /// assert_eq!(it.next(), Some(1));
    /// assert_eq!(it.next(), Some(2));
    /// assert_eq!(it.next(), Some(3));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = I> + SortedByItem + Clone + '_ {
        self.0.iter().copied().assume_sorted_by_item()
    }

    /// Returns `true` if `other` contains every item that `self` does.
    ///
    /// ```
    /// use hug_miner::Label;
    /// let nil = Label::new(&[]);
    /// let one = Label::new(&[1]);
    /// let ab = Label::new(&[1, 2]);
    ///
    /// assert!(nil.is_subset(&one));
    /// assert!(one.is_subset(&one));
    /// assert!(one.is_subset(&ab));
    /// assert!(!ab.is_subset(&one));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().intersection(other.iter()).eq(self.iter())
    }

    /// Returns `true` if `self` contains every item that `other` does.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// The label with its last two items removed: the prefix shared by the two subsets returned
    /// from [`Label::parents`].
    ///
    /// ```
    /// use hug_miner::Label;
    ///
    /// assert_eq!(Label::new(&[1, 2, 3, 4]).prefix(), Label::new(&[1, 2]));
    /// assert_eq!(Label::new(&[1, 2]).prefix(), Label::new(&[]));
    /// ```
    pub fn prefix(&self) -> Self {
        let keep = self.len().saturating_sub(2);
        Label(SmallVec::from_slice(&self.0[..keep]))
    }

    /// The two subsets which were joined to produce this label: the label without its last item,
    /// and the label without its second-to-last item. Returns `None` for labels shorter than two.
    ///
    /// ```
    /// use hug_miner::Label;
    ///
    /// let (s1, s2) = Label::new(&[1, 2, 3]).parents().unwrap();
    /// assert_eq!(s1, Label::new(&[1, 2]));
    /// assert_eq!(s2, Label::new(&[1, 3]));
    /// ```
    pub fn parents(&self) -> Option<(Self, Self)> {
        let len = self.len();
        if len < 2 {
            return None;
        }
        let prefix = &self.0[..len - 2];
        let mut s1 = SmallVec::with_capacity(len - 1);
        s1.extend_from_slice(prefix);
        s1.push(self.0[len - 2]);
        let mut s2 = SmallVec::with_capacity(len - 1);
        s2.extend_from_slice(prefix);
        s2.push(self.0[len - 1]);
        Some((Label(s1), Label(s2)))
    }

    /// Returns the label made of the items at the given positions, which must be ascending.
    pub fn select(&self, positions: &[usize]) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        Label(positions.iter().map(|&p| self.0[p]).collect())
    }

    /// Returns an iterator over every subset of this label that has exactly `k` items, in
    /// lexicographic order of item positions.
    ///
    /// ```
    /// use hug_miner::Label;
    ///
    /// let abc = Label::new(&[1, 2, 3]);
    /// let subsets: Vec<_> = abc.subsets(2).collect();
    /// assert_eq!(
    ///     subsets,
    ///     vec![Label::new(&[1, 2]), Label::new(&[1, 3]), Label::new(&[2, 3])]
    /// );
    /// ```
    pub fn subsets(&self, k: usize) -> impl Iterator<Item = Self> + '_ {
        Combinations::new(self.len(), k).map(move |positions| self.select(&positions))
    }
}

impl<I: ItemId> std::fmt::Debug for Label<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<I: ItemId> iter::FromIterator<I> for Label<I> {
    /// Creates a label containing the specified items.
    ///
    /// It's okay if the provided iterator contains duplicates.
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut v = SmallVec::from_iter(iter);
        v.sort_unstable();
        v.dedup();
        Label(v)
    }
}
