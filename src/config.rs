use crate::{ConfigError, ItemId, ItemsetRegistry, Utility};

/// Parameters for one mining run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiningConfig {
    /// Minimum utility an itemset needs to be reported.
    pub min_util: Utility,
    /// Longest itemset to consider. Defaults to the number of distinct items.
    pub max_length: Option<usize>,
}

impl MiningConfig {
    /// Creates a configuration with the given threshold and no length limit.
    pub fn new(min_util: Utility) -> Self {
        MiningConfig {
            min_util,
            max_length: None,
        }
    }

    /// Limits the length of itemsets considered.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Checks the configuration and creates a registry seeded with the given items.
    ///
    /// ```
    /// use hug_miner::{ConfigError, MiningConfig};
    ///
    /// let registry = MiningConfig::new(10).with_max_length(2).registry(vec![3u16, 1, 2]).unwrap();
    /// assert_eq!(registry.max_length(), 2);
    /// assert_eq!(registry.layer(1).unwrap().len(), 3);
    ///
    /// assert_eq!(
    ///     MiningConfig::new(0).registry(vec![1u16]).unwrap_err(),
    ///     ConfigError::NonPositiveThreshold(0)
    /// );
    /// ```
    pub fn registry<I, T>(&self, items: T) -> Result<ItemsetRegistry<I>, ConfigError>
    where
        I: ItemId,
        T: IntoIterator<Item = I>,
    {
        if self.min_util <= 0 {
            return Err(ConfigError::NonPositiveThreshold(self.min_util));
        }
        if self.max_length == Some(0) {
            return Err(ConfigError::ZeroMaxLength);
        }
        let registry = ItemsetRegistry::with_items(items, self.max_length);
        if registry.max_length() == 0 {
            return Err(ConfigError::NoItems);
        }
        Ok(registry)
    }
}
