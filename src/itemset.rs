use crate::{Dataset, ItemId, Label, MineError, TransactionId, Utility};
use sorted_iter::assume::{AssumeSortedByItemExt, AssumeSortedByKeyExt};
use sorted_iter::sorted_iterator::SortedByItem;
use sorted_iter::sorted_pair_iterator::SortedByKey;
use sorted_iter::{SortedIterator, SortedPairIterator};

/// How far an [`Itemset`] has progressed through evaluation.
///
/// Itemsets only ever move forward through these stages. An itemset whose TWU falls below the
/// threshold after [`Counted`][Stage::Counted] is removed from the registry instead of advancing.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Stage {
    /// Registered as a candidate; nothing has been computed yet.
    Created,
    /// Occurrence set, support, and TWU are known.
    Counted,
    /// Per-transaction utilities and total utility are known.
    Measured,
    /// Not a high utility generator. It stays registered because longer itemsets may still need
    /// its utility list.
    Rejected,
    /// Reported as a high utility generator.
    Emitted,
}

/// A candidate pattern together with the statistics derived for it.
///
/// The occurrence set is kept in ascending transaction order, and the per-transaction utilities
/// are stored parallel to it, so both can be merged with the lists of other itemsets in a single
/// pass.
#[derive(Clone, Debug)]
pub struct Itemset<I: ItemId> {
    label: Label<I>,
    stage: Stage,
    support: usize,
    utility: Utility,
    twu: Utility,
    occurrences: Vec<TransactionId>,
    utilities: Vec<Utility>,
}

impl<I: ItemId> Itemset<I> {
    /// Creates a fresh candidate with no statistics.
    pub fn new(label: Label<I>) -> Self {
        Itemset {
            label,
            stage: Stage::Created,
            support: 0,
            utility: 0,
            twu: 0,
            occurrences: Vec::new(),
            utilities: Vec::new(),
        }
    }

    /// The items making up this pattern.
    pub fn label(&self) -> &Label<I> {
        &self.label
    }

    /// Current evaluation stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of transactions containing every item of the label.
    pub fn support(&self) -> usize {
        self.support
    }

    /// Total utility of the pattern over the transactions containing it.
    pub fn utility(&self) -> Utility {
        self.utility
    }

    /// Transaction-weighted utilization: the summed transaction utility of every transaction
    /// containing the pattern. Never less than [`utility`][Itemset::utility].
    pub fn twu(&self) -> Utility {
        self.twu
    }

    /// Ids of the transactions containing the pattern, ascending.
    pub fn occurrences(&self) -> impl Iterator<Item = TransactionId> + SortedByItem + Clone + '_ {
        self.occurrences.iter().copied().assume_sorted_by_item()
    }

    /// Pairs of transaction id and the utility the pattern contributes to that transaction,
    /// ascending by id. Empty until the itemset has been measured.
    pub fn utility_list(
        &self,
    ) -> impl Iterator<Item = (TransactionId, Utility)> + SortedByKey + '_ {
        self.occurrences
            .iter()
            .copied()
            .zip(self.utilities.iter().copied())
            .assume_sorted_by_key()
    }

    /// Utility the pattern contributes to one transaction, if it has been measured and occurs
    /// there.
    pub fn utility_in(&self, tid: TransactionId) -> Option<Utility> {
        let idx = self.occurrences.binary_search(&tid).ok()?;
        self.utilities.get(idx).copied()
    }

    /// Builds the occurrence set of a single-item pattern by asking the dataset about every
    /// transaction.
    pub(crate) fn scan_occurrences<D: Dataset<I>>(&mut self, dataset: &D) {
        debug_assert_eq!(self.label.len(), 1);
        let item = self.label.as_slice()[0];
        let occurrences = (1..=dataset.transaction_count())
            .filter(|&tid| dataset.contains_item(item, tid))
            .collect();
        self.set_occurrences(occurrences);
    }

    /// Builds the occurrence set of a longer pattern from the two subsets it was joined from: a
    /// transaction contains this pattern exactly when it contains both of them.
    pub(crate) fn join_occurrences(&mut self, s1: &Itemset<I>, s2: &Itemset<I>) {
        let occurrences = s1.occurrences().intersection(s2.occurrences()).collect();
        self.set_occurrences(occurrences);
    }

    fn set_occurrences(&mut self, occurrences: Vec<TransactionId>) {
        debug_assert_eq!(self.stage, Stage::Created, "{:?} counted twice", self.label);
        self.occurrences = occurrences;
        self.support = self.occurrences.len();
    }

    /// Sums the transaction utilities over the occurrence set.
    pub(crate) fn compute_twu<D: Dataset<I>>(&mut self, dataset: &D) -> Result<(), MineError> {
        debug_assert_eq!(self.stage, Stage::Created);
        self.twu = self
            .occurrences
            .iter()
            .try_fold(0, |twu: Utility, &tid| {
                twu.checked_add(dataset.transaction_total_utility(tid))
            })
            .ok_or_else(|| self.overflow())?;
        self.stage = Stage::Counted;
        Ok(())
    }

    /// Utility list of a single-item pattern, read straight from the dataset.
    pub(crate) fn measure_item<D: Dataset<I>>(&mut self, dataset: &D) -> Result<(), MineError> {
        let item = self.label.as_slice()[0];
        let utilities = self
            .occurrences
            .iter()
            .map(|&tid| dataset.item_utility(item, tid))
            .collect();
        self.set_utilities(utilities)
    }

    /// Utility list of a two-item pattern: the sum of both items' utilities in each transaction.
    pub(crate) fn measure_pair(
        &mut self,
        s1: &Itemset<I>,
        s2: &Itemset<I>,
    ) -> Result<(), MineError> {
        let utilities = self
            .occurrences()
            .pairs()
            .join(s1.utility_list())
            .join(s2.utility_list())
            .map(|(_, (((), u1), u2))| u1.checked_add(u2))
            .collect::<Option<_>>()
            .ok_or_else(|| self.overflow())?;
        self.set_utilities(utilities)
    }

    /// Utility list of a pattern of three or more items.
    ///
    /// Both subsets include the shared prefix, so its utility is subtracted once:
    /// `u(ABC, t) = u(AB, t) + u(AC, t) - u(A, t)`.
    pub(crate) fn measure_extension(
        &mut self,
        s1: &Itemset<I>,
        s2: &Itemset<I>,
        prefix: &Itemset<I>,
    ) -> Result<(), MineError> {
        let utilities = self
            .occurrences()
            .pairs()
            .join(s1.utility_list())
            .join(s2.utility_list())
            .join(prefix.utility_list())
            .map(|(_, ((((), u1), u2), up))| u1.checked_add(u2)?.checked_sub(up))
            .collect::<Option<_>>()
            .ok_or_else(|| self.overflow())?;
        self.set_utilities(utilities)
    }

    fn set_utilities(&mut self, utilities: Vec<Utility>) -> Result<(), MineError> {
        debug_assert_eq!(self.stage, Stage::Counted);
        // Every subset occurs wherever this pattern does, so the joins drop nothing.
        debug_assert_eq!(utilities.len(), self.occurrences.len());
        self.utility = utilities
            .iter()
            .try_fold(0, |sum: Utility, &utility| sum.checked_add(utility))
            .ok_or_else(|| self.overflow())?;
        self.utilities = utilities;
        self.stage = Stage::Measured;
        Ok(())
    }

    fn overflow(&self) -> MineError {
        MineError::UtilityOverflow {
            label: format!("{:?}", self.label),
            layer: self.label.len(),
        }
    }

    /// Decides whether this measured itemset is a high utility generator.
    ///
    /// `shorter` should yield itemsets from the layer one shorter than this one. Because support
    /// can only shrink as a pattern grows, if any proper subset had the same support then so
    /// would one of the immediate subsets, so those are the only ones worth checking.
    pub fn is_generator<'a, S>(&self, min_util: Utility, shorter: S) -> bool
    where
        I: 'a,
        S: IntoIterator<Item = &'a Itemset<I>>,
    {
        if self.utility < min_util {
            return false;
        }
        !shorter
            .into_iter()
            .any(|other| other.support == self.support && other.label.is_subset(&self.label))
    }

    pub(crate) fn set_verdict(&mut self, emitted: bool) {
        debug_assert_eq!(self.stage, Stage::Measured);
        self.stage = if emitted {
            Stage::Emitted
        } else {
            Stage::Rejected
        };
    }
}
