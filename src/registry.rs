use crate::{Dataset, ItemId, Itemset, Label, MineError, Stage, Utility};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::iter;
use tracing::{debug, trace};

/// All live itemsets of one length, in the order they were registered.
///
/// Removing an itemset leaves a hole behind so that positions handed out by [`first`][Layer::first]
/// and [`next_after`][Layer::next_after] stay valid while a layer is being walked. Holes are
/// dropped by [`compact`][Layer::compact].
///
/// ```
/// use hug_miner::{Label, Layer};
///
/// let mut layer = Layer::new();
/// for item in [1u8, 2, 3] {
///     layer.insert(Label::new(&[item]));
/// }
///
/// let after_two = layer.remove(&Label::new(&[2])).unwrap();
/// assert_eq!(layer.at(after_two.unwrap()).unwrap().label(), &Label::new(&[3]));
/// assert_eq!(layer.remove(&Label::new(&[3])), Ok(None));
/// assert!(layer.remove(&Label::new(&[3])).is_err());
/// assert_eq!(layer.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Layer<I: ItemId> {
    slots: Vec<Option<Itemset<I>>>,
    positions: HashMap<Label<I>, usize>,
}

impl<I: ItemId> Default for Layer<I> {
    fn default() -> Self {
        Layer::new()
    }
}

impl<I: ItemId> Layer<I> {
    /// Creates an empty layer.
    pub fn new() -> Self {
        Layer {
            slots: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Number of live itemsets.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no itemsets are live.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Appends a fresh candidate with the given label. Returns `false`, leaving the layer
    /// unchanged, if that label is already present.
    pub fn insert(&mut self, label: Label<I>) -> bool {
        match self.positions.entry(label) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                let pos = self.slots.len();
                self.slots.push(Some(Itemset::new(entry.key().clone())));
                entry.insert(pos);
                true
            }
        }
    }

    /// Looks up an itemset by label.
    pub fn get(&self, label: &Label<I>) -> Option<&Itemset<I>> {
        let pos = *self.positions.get(label)?;
        self.slots[pos].as_ref()
    }

    /// Returns `true` if an itemset with this label is live.
    pub fn contains(&self, label: &Label<I>) -> bool {
        self.positions.contains_key(label)
    }

    /// Position of the first live itemset.
    pub fn first(&self) -> Option<usize> {
        self.next_from(0)
    }

    /// Position of the first live itemset after `pos`.
    pub fn next_after(&self, pos: usize) -> Option<usize> {
        self.next_from(pos + 1)
    }

    fn next_from(&self, start: usize) -> Option<usize> {
        (start..self.slots.len()).find(|&pos| self.slots[pos].is_some())
    }

    /// The itemset at a position, if it is live.
    pub fn at(&self, pos: usize) -> Option<&Itemset<I>> {
        self.slots.get(pos)?.as_ref()
    }

    pub(crate) fn at_mut(&mut self, pos: usize) -> Option<&mut Itemset<I>> {
        self.slots.get_mut(pos)?.as_mut()
    }

    /// Removes an itemset and returns the position of the live itemset following it, so a walk
    /// over the layer can carry on from there.
    pub fn remove(&mut self, label: &Label<I>) -> Result<Option<usize>, MineError> {
        let pos = self
            .positions
            .remove(label)
            .ok_or_else(|| MineError::ItemsetNotFound {
                label: format!("{:?}", label),
                layer: label.len(),
            })?;
        self.slots[pos] = None;
        Ok(self.next_after(pos))
    }

    /// Iterates over the live itemsets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Itemset<I>> + '_ {
        self.slots.iter().flatten()
    }

    /// Drops the holes left by removals. Positions obtained earlier are invalidated.
    pub fn compact(&mut self) {
        self.slots.retain(Option::is_some);
        self.slots.shrink_to_fit();
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(itemset) = slot {
                self.positions.insert(itemset.label().clone(), pos);
            }
        }
        self.positions.shrink_to_fit();
    }
}

/// A high utility generator reported by [`ItemsetRegistry::mine_all`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Hug<I: ItemId> {
    /// The items of the pattern.
    pub label: Label<I>,
    /// Total utility over the transactions containing the pattern.
    pub utility: Utility,
    /// Number of transactions containing the pattern.
    pub support: usize,
    /// Transaction-weighted utilization of the pattern.
    pub twu: Utility,
}

impl<I: ItemId> From<&Itemset<I>> for Hug<I> {
    fn from(itemset: &Itemset<I>) -> Self {
        Hug {
            label: itemset.label().clone(),
            utility: itemset.utility(),
            support: itemset.support(),
            twu: itemset.twu(),
        }
    }
}

/// Counters describing one mining run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct MiningSummary {
    /// Layers that had at least one candidate to evaluate.
    pub layers: usize,
    /// Candidates whose occurrence set and TWU were computed.
    pub evaluated: usize,
    /// Candidates removed because their TWU was below the threshold.
    pub pruned: usize,
    /// Candidates that survived pruning but were not generators or lacked utility.
    pub rejected: usize,
    /// High utility generators reported.
    pub emitted: usize,
    /// Candidates registered by joining survivors, not counting the initial single items.
    pub generated: usize,
}

/// Owns every live itemset, one [`Layer`] per length from 1 through the maximum length, and
/// drives the level-wise search.
///
/// A candidate of length `k + 1` is only registered while all of its length-`k` subsets are still
/// present, so every subset a candidate's statistics are derived from is guaranteed to be there
/// when that candidate is evaluated.
#[derive(Clone, Debug)]
pub struct ItemsetRegistry<I: ItemId> {
    layers: Vec<Layer<I>>,
}

impl<I: ItemId> ItemsetRegistry<I> {
    /// Creates a registry with empty layers for itemsets of length 1 through `max_length`.
    pub fn new(max_length: usize) -> Self {
        ItemsetRegistry {
            layers: iter::repeat_with(Layer::new).take(max_length).collect(),
        }
    }

    /// Creates a registry seeded with one single-item candidate per distinct item, in ascending
    /// item order.
    ///
    /// The maximum length is the number of distinct items, capped by `max_length` if given.
    pub fn with_items<T>(items: T, max_length: Option<usize>) -> Self
    where
        T: IntoIterator<Item = I>,
    {
        let mut items: Vec<I> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();

        let len = max_length.map_or(items.len(), |max| max.min(items.len()));
        let mut registry = ItemsetRegistry::new(len);
        for item in items {
            registry.register(Label::new(&[item]));
        }
        registry
    }

    /// The longest itemset this registry will hold.
    pub fn max_length(&self) -> usize {
        self.layers.len()
    }

    /// The layer holding itemsets of length `len`.
    pub fn layer(&self, len: usize) -> Option<&Layer<I>> {
        self.layers.get(len.checked_sub(1)?)
    }

    /// Looks up a live itemset by label.
    pub fn get(&self, label: &Label<I>) -> Option<&Itemset<I>> {
        self.layer(label.len())?.get(label)
    }

    /// Iterates over every live itemset, shortest first.
    pub fn iter(&self) -> impl Iterator<Item = &Itemset<I>> + '_ {
        self.layers.iter().flat_map(Layer::iter)
    }

    /// Adds a fresh candidate at the end of its layer.
    ///
    /// Returns `false` if the label is empty, longer than [`max_length`][Self::max_length], or
    /// already registered.
    pub fn register(&mut self, label: Label<I>) -> bool {
        match label
            .len()
            .checked_sub(1)
            .and_then(|idx| self.layers.get_mut(idx))
        {
            Some(layer) => layer.insert(label),
            None => false,
        }
    }

    /// Removes an itemset and returns the position of its successor within the same layer.
    pub fn remove(&mut self, label: &Label<I>) -> Result<Option<usize>, MineError> {
        match label
            .len()
            .checked_sub(1)
            .and_then(|idx| self.layers.get_mut(idx))
        {
            Some(layer) => layer.remove(label),
            None => Err(MineError::ItemsetNotFound {
                label: format!("{:?}", label),
                layer: label.len(),
            }),
        }
    }

    /// Returns `true` if every subset of `label` with one item fewer is currently registered.
    ///
    /// Single-item labels have no such subsets to check.
    ///
    /// ```
    /// use hug_miner::{ItemsetRegistry, Label};
    ///
    /// let mut registry = ItemsetRegistry::with_items(vec![1u8, 2, 3], None);
    /// registry.register(Label::new(&[1, 2]));
    /// registry.register(Label::new(&[1, 3]));
    /// assert!(!registry.all_subsets_survive(&Label::new(&[1, 2, 3])));
    ///
    /// registry.register(Label::new(&[2, 3]));
    /// assert!(registry.all_subsets_survive(&Label::new(&[1, 2, 3])));
    /// ```
    pub fn all_subsets_survive(&self, label: &Label<I>) -> bool {
        let k = match label.len().checked_sub(1) {
            Some(0) | None => return true,
            Some(k) => k,
        };
        match self.layer(k) {
            Some(layer) => label.subsets(k).all(|subset| layer.contains(&subset)),
            None => false,
        }
    }

    /// Registers candidates of length `k + 1` by joining every pair of live length-`k` itemsets
    /// that agree on all but their last item. Returns how many were registered.
    ///
    /// Pairs are visited in registration order. Candidates for length 2 are always registered;
    /// longer ones only if [`all_subsets_survive`][Self::all_subsets_survive].
    pub fn generate_next_layer(&mut self, k: usize) -> usize {
        if k == 0 || k >= self.layers.len() {
            return 0;
        }

        let candidates = {
            let source = &self.layers[k - 1];

            // Group each itemset's last item under its prefix, keeping registration order, so an
            // itemset's join partners are exactly the entries after it in its own group.
            let mut groups: HashMap<&[I], Vec<I>> = HashMap::new();
            for itemset in source.iter() {
                if let Some((last, prefix)) = itemset.label().as_slice().split_last() {
                    groups.entry(prefix).or_insert_with(Vec::new).push(*last);
                }
            }

            let mut visited: HashMap<&[I], usize> = HashMap::with_capacity(groups.len());
            let mut candidates = Vec::new();
            for itemset in source.iter() {
                let (a, prefix) = match itemset.label().as_slice().split_last() {
                    Some((last, prefix)) => (*last, prefix),
                    None => continue,
                };
                let partners = match groups.get(prefix) {
                    Some(partners) => partners,
                    None => continue,
                };
                let offset = visited.entry(prefix).or_insert(0);
                *offset += 1;

                for &b in partners[*offset..].iter() {
                    let candidate = if a < b {
                        Label::extend_sorted(prefix, a, b)
                    } else {
                        Label::extend_sorted(prefix, b, a)
                    };
                    if k == 1 || self.all_subsets_survive(&candidate) {
                        candidates.push(candidate);
                    }
                }
            }
            candidates
        };

        let mut registered = 0;
        for candidate in candidates {
            if self.register(candidate) {
                registered += 1;
            }
        }
        registered
    }

    /// Runs the level-wise search, passing each high utility generator to `emit` as soon as it
    /// is found.
    ///
    /// Layers are processed shortest first. Within a layer, each candidate's occurrence set and
    /// TWU are computed; candidates with TWU below `min_util` are removed. Survivors get a
    /// utility list and are emitted if their utility reaches `min_util` and no immediate subset
    /// has the same support. The survivors of each layer are then joined into the next one.
    ///
    /// A registry holds the state of exactly one run. Build a new one to mine again.
    ///
    /// # Errors
    ///
    /// Returns [`MineError::AlreadyMined`] if the registry already holds evaluated itemsets, and
    /// [`MineError::UtilityOverflow`] if a TWU or utility does not fit in a [`Utility`]. Any other
    /// [`MineError`] means a subset needed for a derivation is missing. That only happens if
    /// candidates were registered by hand without the subsets they depend on.
    pub fn mine_all<D, F>(
        &mut self,
        dataset: &D,
        min_util: Utility,
        mut emit: F,
    ) -> Result<MiningSummary, MineError>
    where
        D: Dataset<I>,
        F: FnMut(Hug<I>),
    {
        if self.iter().any(|itemset| itemset.stage() != Stage::Created) {
            return Err(MineError::AlreadyMined);
        }
        let mut summary = MiningSummary::default();

        for k in 1..=self.layers.len() {
            if self.layers[k - 1].is_empty() {
                debug!(layer = k, "no candidates left, stopping");
                break;
            }
            summary.layers += 1;
            self.evaluate_layer(k, dataset, min_util, &mut emit, &mut summary)?;

            if k < self.layers.len() {
                let generated = self.generate_next_layer(k);
                summary.generated += generated;
                debug!(layer = k + 1, generated, "generated candidates");
            }
        }

        Ok(summary)
    }

    /// Runs [`mine_all`][Self::mine_all] and collects the results.
    pub fn mine<D: Dataset<I>>(
        &mut self,
        dataset: &D,
        min_util: Utility,
    ) -> Result<Vec<Hug<I>>, MineError> {
        let mut hugs = Vec::new();
        self.mine_all(dataset, min_util, |hug| hugs.push(hug))?;
        Ok(hugs)
    }

    fn evaluate_layer<D, F>(
        &mut self,
        k: usize,
        dataset: &D,
        min_util: Utility,
        emit: &mut F,
        summary: &mut MiningSummary,
    ) -> Result<(), MineError>
    where
        D: Dataset<I>,
        F: FnMut(Hug<I>),
    {
        let (shorter, rest) = self.layers.split_at_mut(k - 1);
        let shorter: &[Layer<I>] = shorter;
        let layer = &mut rest[0];
        debug!(layer = k, candidates = layer.len(), "evaluating layer");

        let mut cursor = layer.first();
        while let Some(pos) = cursor {
            let itemset = match layer.at_mut(pos) {
                Some(itemset) => itemset,
                None => break,
            };
            summary.evaluated += 1;

            count(itemset, shorter, dataset)?;
            if itemset.twu() < min_util {
                trace!(label = ?itemset.label(), twu = itemset.twu(), "pruned");
                summary.pruned += 1;
                let label = itemset.label().clone();
                cursor = layer.remove(&label)?;
                continue;
            }

            measure(itemset, shorter, dataset)?;
            let emitted = match shorter.last() {
                Some(parents) => itemset.is_generator(
                    min_util,
                    itemset
                        .label()
                        .subsets(k - 1)
                        .filter_map(|subset| parents.get(&subset)),
                ),
                None => itemset.is_generator(min_util, iter::empty()),
            };
            itemset.set_verdict(emitted);

            if emitted {
                trace!(label = ?itemset.label(), utility = itemset.utility(), "emitted");
                summary.emitted += 1;
                emit(Hug::from(&*itemset));
            } else {
                trace!(label = ?itemset.label(), utility = itemset.utility(), "rejected");
                summary.rejected += 1;
            }
            cursor = layer.next_after(pos);
        }

        layer.compact();
        debug!(layer = k, survivors = layer.len(), "layer complete");
        Ok(())
    }
}

fn lookup<'a, I: ItemId>(
    shorter: &'a [Layer<I>],
    label: &Label<I>,
) -> Result<&'a Itemset<I>, MineError> {
    label
        .len()
        .checked_sub(1)
        .and_then(|idx| shorter.get(idx))
        .and_then(|layer| layer.get(label))
        .ok_or_else(|| MineError::SubsetNotFound {
            label: format!("{:?}", label),
            layer: label.len(),
        })
}

/// Occurrence set, support, and TWU.
fn count<I: ItemId, D: Dataset<I>>(
    itemset: &mut Itemset<I>,
    shorter: &[Layer<I>],
    dataset: &D,
) -> Result<(), MineError> {
    match itemset.label().parents() {
        None => itemset.scan_occurrences(dataset),
        Some((s1, s2)) => {
            let s1 = lookup(shorter, &s1)?;
            let s2 = lookup(shorter, &s2)?;
            itemset.join_occurrences(s1, s2);
        }
    }
    itemset.compute_twu(dataset)
}

/// Utility list and total utility.
fn measure<I: ItemId, D: Dataset<I>>(
    itemset: &mut Itemset<I>,
    shorter: &[Layer<I>],
    dataset: &D,
) -> Result<(), MineError> {
    match itemset.label().parents() {
        None => itemset.measure_item(dataset),
        Some((s1, s2)) => {
            let s1 = lookup(shorter, &s1)?;
            let s2 = lookup(shorter, &s2)?;
            if itemset.label().len() == 2 {
                itemset.measure_pair(s1, s2)
            } else {
                let prefix = lookup(shorter, &itemset.label().prefix())?;
                itemset.measure_extension(s1, s2, prefix)
            }
        }
    }
}
