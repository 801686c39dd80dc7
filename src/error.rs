use crate::Utility;
use thiserror::Error;

/// Errors that abort a mining run.
///
/// The missing-itemset variants are invariant violations. They cannot happen as long as the
/// registry is only modified through its own generation and pruning sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MineError {
    /// A shorter itemset needed to derive a candidate's statistics is missing from the registry.
    #[error("subset {label} of length {layer} is not in the registry")]
    SubsetNotFound {
        /// The missing subset, rendered with `Debug`.
        label: String,
        /// Length of the missing subset.
        layer: usize,
    },

    /// Removal was requested for an itemset that is not in its layer.
    #[error("itemset {label} is not in layer {layer}")]
    ItemsetNotFound {
        /// The missing itemset, rendered with `Debug`.
        label: String,
        /// Length of the missing itemset.
        layer: usize,
    },

    /// The TWU or utility of an itemset does not fit in a [`Utility`].
    #[error("utility of {label} overflows")]
    UtilityOverflow {
        /// The itemset, rendered with `Debug`.
        label: String,
        /// Length of the itemset.
        layer: usize,
    },

    /// The registry already holds the results of a run.
    #[error("registry was already mined")]
    AlreadyMined,
}

/// The utilities of a transaction do not sum to a value that fits in a [`Utility`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("transaction utility overflows")]
pub struct UtilityOverflow;

/// Errors from reading a transaction database.
#[derive(Error, Debug)]
pub enum InputError {
    /// Reading the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field was not valid UTF-8.
    #[error("line {line}: {source}")]
    Utf8 {
        /// Line on which the field ended.
        line: u64,
        /// The decoding failure.
        source: std::str::Utf8Error,
    },

    /// A record did not have the `items:total:utilities` shape.
    #[error("line {line}: expected 3 colon-separated fields, found {found}")]
    FieldCount {
        /// Line of the record.
        line: u64,
        /// Number of fields present.
        found: usize,
    },

    /// A record listed no items.
    #[error("line {line}: transaction has no items")]
    EmptyTransaction {
        /// Line of the record.
        line: u64,
    },

    /// The item and utility lists had different lengths.
    #[error("line {line}: {items} items but {utilities} utilities")]
    LengthMismatch {
        /// Line of the record.
        line: u64,
        /// Number of items listed.
        items: usize,
        /// Number of utilities listed.
        utilities: usize,
    },

    /// A number failed to parse.
    #[error("line {line}: invalid number {value:?}")]
    InvalidNumber {
        /// Line of the record.
        line: u64,
        /// The offending text.
        value: String,
    },

    /// An item had negative utility.
    #[error("line {line}: negative utility {utility}")]
    NegativeUtility {
        /// Line of the record.
        line: u64,
        /// The offending utility.
        utility: Utility,
    },

    /// The declared transaction utility did not match the sum of its item utilities.
    #[error("line {line}: transaction utility is {declared} but items sum to {computed}")]
    TotalMismatch {
        /// Line of the record.
        line: u64,
        /// Value of the middle field.
        declared: Utility,
        /// Sum of the item utilities.
        computed: Utility,
    },

    /// A transaction utility, or the utility of the whole database, does not fit in a
    /// [`Utility`].
    #[error("line {line}: utility overflows")]
    UtilityOverflow {
        /// Line of the record.
        line: u64,
    },
}

/// Errors from validating a [`MiningConfig`][crate::MiningConfig].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The minimum utility threshold must be positive.
    #[error("minimum utility must be positive, got {0}")]
    NonPositiveThreshold(Utility),

    /// There were no items to mine.
    #[error("no items to mine")]
    NoItems,

    /// A maximum itemset length of zero leaves nothing to mine.
    #[error("maximum itemset length must be at least 1")]
    ZeroMaxLength,
}
