use crate::{ItemId, TransactionId, Utility, UtilityOverflow};

/// Read-only queries the miner makes against a transaction database.
///
/// Transactions are numbered from 1 through [`transaction_count`][Dataset::transaction_count].
pub trait Dataset<I> {
    /// Total number of transactions.
    fn transaction_count(&self) -> usize;

    /// Whether the given transaction contains `item`.
    fn contains_item(&self, item: I, tid: TransactionId) -> bool;

    /// Utility contributed by `item` within the given transaction. Only meaningful when the
    /// transaction contains the item.
    fn item_utility(&self, item: I, tid: TransactionId) -> Utility;

    /// Sum of the utilities of every item in the given transaction.
    fn transaction_total_utility(&self, tid: TransactionId) -> Utility;
}

impl<I, D: Dataset<I> + ?Sized> Dataset<I> for &D {
    fn transaction_count(&self) -> usize {
        (**self).transaction_count()
    }

    fn contains_item(&self, item: I, tid: TransactionId) -> bool {
        (**self).contains_item(item, tid)
    }

    fn item_utility(&self, item: I, tid: TransactionId) -> Utility {
        (**self).item_utility(item, tid)
    }

    fn transaction_total_utility(&self, tid: TransactionId) -> Utility {
        (**self).transaction_total_utility(tid)
    }
}

/// One transaction: the items it contains with their utilities, sorted by item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction<I> {
    entries: Vec<(I, Utility)>,
    total: Utility,
}

impl<I: ItemId> Transaction<I> {
    /// The items and their utilities, in ascending item order.
    pub fn entries(&self) -> &[(I, Utility)] {
        &self.entries
    }

    /// The transaction utility.
    pub fn total(&self) -> Utility {
        self.total
    }

    /// Utility of `item` in this transaction, if present.
    pub fn utility_of(&self, item: I) -> Option<Utility> {
        self.entries
            .binary_search_by(|(probe, _)| probe.cmp(&item))
            .ok()
            .map(|idx| self.entries[idx].1)
    }
}

/// An in-memory transaction database.
///
/// ```
/// use hug_miner::{Dataset, TransactionTable};
///
/// let mut table = TransactionTable::new();
/// let first = table.add_transaction(vec![(3u32, 2), (1, 4), (3, 1)]).unwrap();
/// let second = table.add_transaction(vec![(2, 7)]).unwrap();
///
/// assert_eq!((first, second), (1, 2));
/// assert_eq!(table.transaction_count(), 2);
/// assert!(table.contains_item(3, 1));
/// assert!(!table.contains_item(3, 2));
/// assert_eq!(table.item_utility(3, 1), 3);
/// assert_eq!(table.transaction_total_utility(1), 7);
/// assert_eq!(table.items(), vec![1, 2, 3]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionTable<I> {
    transactions: Vec<Transaction<I>>,
}

impl<I: ItemId> TransactionTable<I> {
    /// Creates an empty table.
    pub fn new() -> Self {
        TransactionTable {
            transactions: Vec::new(),
        }
    }

    /// Appends a transaction and returns its id.
    ///
    /// If an item is listed more than once, its utilities are added together. The table is left
    /// unchanged if any of the sums overflows.
    pub fn add_transaction<T>(&mut self, entries: T) -> Result<TransactionId, UtilityOverflow>
    where
        T: IntoIterator<Item = (I, Utility)>,
    {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let mut merged: Vec<(I, Utility)> = Vec::with_capacity(entries.len());
        for (item, utility) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == item => {
                    last.1 = last.1.checked_add(utility).ok_or(UtilityOverflow)?;
                }
                _ => merged.push((item, utility)),
            }
        }
        let total = merged
            .iter()
            .try_fold(0, |total: Utility, &(_, utility)| total.checked_add(utility))
            .ok_or(UtilityOverflow)?;
        self.transactions.push(Transaction {
            entries: merged,
            total,
        });
        Ok(self.transactions.len())
    }

    /// Looks up a transaction by id.
    pub fn transaction(&self, tid: TransactionId) -> Option<&Transaction<I>> {
        tid.checked_sub(1).and_then(|idx| self.transactions.get(idx))
    }

    /// Every distinct item appearing in any transaction, in ascending order.
    pub fn items(&self) -> Vec<I> {
        let mut items: Vec<I> = self
            .transactions
            .iter()
            .flat_map(|t| t.entries.iter().map(|(item, _)| *item))
            .collect();
        items.sort_unstable();
        items.dedup();
        items
    }

    /// Shrinks the capacity of the table as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.transactions.shrink_to_fit();
    }
}

impl<I: ItemId> Dataset<I> for TransactionTable<I> {
    fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    fn contains_item(&self, item: I, tid: TransactionId) -> bool {
        self.transaction(tid)
            .map_or(false, |t| t.utility_of(item).is_some())
    }

    fn item_utility(&self, item: I, tid: TransactionId) -> Utility {
        self.transaction(tid)
            .and_then(|t| t.utility_of(item))
            .unwrap_or(0)
    }

    fn transaction_total_utility(&self, tid: TransactionId) -> Utility {
        self.transaction(tid).map_or(0, Transaction::total)
    }
}
