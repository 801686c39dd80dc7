//! Compares the level-wise miner against exhaustive enumeration on small random databases.

use hug_miner::{Hug, ItemsetRegistry, Label, TransactionTable, Utility};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

type Database = Vec<BTreeMap<u8, Utility>>;

fn arb_database() -> impl Strategy<Value = Database> {
    prop::collection::vec(prop::collection::btree_map(0u8..5, 1i64..10, 1..=5), 1..8)
}

fn build(database: &Database) -> TransactionTable<u8> {
    let mut table = TransactionTable::new();
    for transaction in database {
        table
            .add_transaction(transaction.iter().map(|(&item, &utility)| (item, utility)))
            .unwrap();
    }
    table
}

#[derive(Debug)]
struct Exact {
    support: usize,
    utility: Utility,
    twu: Utility,
    per_transaction: HashMap<usize, Utility>,
}

/// Statistics for every non-empty combination of the items present in the database.
fn enumerate(database: &Database) -> HashMap<Label<u8>, Exact> {
    let items: Vec<u8> = database
        .iter()
        .flat_map(|t| t.keys().copied())
        .collect::<Label<u8>>()
        .iter()
        .collect();

    let mut all = HashMap::new();
    for mask in 1u32..(1 << items.len()) {
        let label: Label<u8> = items
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, &item)| item)
            .collect();

        let mut exact = Exact {
            support: 0,
            utility: 0,
            twu: 0,
            per_transaction: HashMap::new(),
        };
        for (idx, transaction) in database.iter().enumerate() {
            if label.iter().all(|item| transaction.contains_key(&item)) {
                let utility: Utility = label.iter().map(|item| transaction[&item]).sum();
                exact.support += 1;
                exact.utility += utility;
                exact.twu += transaction.values().sum::<Utility>();
                exact.per_transaction.insert(idx + 1, utility);
            }
        }
        all.insert(label, exact);
    }
    all
}

fn expected_hugs(all: &HashMap<Label<u8>, Exact>, min_util: Utility) -> HashSet<Hug<u8>> {
    all.iter()
        .filter(|(label, exact)| {
            let k = label.len();
            exact.twu >= min_util
                && exact.utility >= min_util
                && (k == 1
                    || label
                        .subsets(k - 1)
                        .all(|subset| all[&subset].support != exact.support))
        })
        .map(|(label, exact)| Hug {
            label: label.clone(),
            utility: exact.utility,
            support: exact.support,
            twu: exact.twu,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn matches_exhaustive_search(database in arb_database(), min_util in 1i64..80) {
        let table = build(&database);
        let all = enumerate(&database);

        let mut registry = ItemsetRegistry::with_items(table.items(), None);
        let hugs = registry.mine(&table, min_util).unwrap();

        let found: HashSet<Hug<u8>> = hugs.iter().cloned().collect();
        prop_assert_eq!(found.len(), hugs.len());
        prop_assert_eq!(found, expected_hugs(&all, min_util));

        // Exactly the itemsets whose TWU reaches the threshold survive.
        let survivors: HashSet<Label<u8>> =
            registry.iter().map(|itemset| itemset.label().clone()).collect();
        let expected: HashSet<Label<u8>> = all
            .iter()
            .filter(|(_, exact)| exact.twu >= min_util)
            .map(|(label, _)| label.clone())
            .collect();
        prop_assert_eq!(survivors, expected);

        for itemset in registry.iter() {
            let exact = &all[itemset.label()];
            prop_assert_eq!(itemset.support(), exact.support);
            prop_assert_eq!(itemset.twu(), exact.twu);
            prop_assert_eq!(itemset.utility(), exact.utility);
            prop_assert!(itemset.twu() >= itemset.utility());
            for (tid, utility) in itemset.utility_list() {
                prop_assert_eq!(Some(&utility), exact.per_transaction.get(&tid));
            }
        }
    }

    #[test]
    fn layers_are_processed_shortest_first(database in arb_database(), min_util in 1i64..40) {
        let table = build(&database);
        let mut registry = ItemsetRegistry::with_items(table.items(), None);
        let hugs = registry.mine(&table, min_util).unwrap();

        for pair in hugs.windows(2) {
            prop_assert!(pair[0].label.len() <= pair[1].label.len());
        }
    }
}
