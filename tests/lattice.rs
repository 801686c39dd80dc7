use hug_miner::{
    read_transactions, Dataset, Hug, ItemsetRegistry, Label, MineError, MiningConfig, Stage,
    TransactionTable, Utility, UtilityOverflow,
};
use std::collections::HashSet;

fn table(transactions: &[&[(u8, Utility)]]) -> TransactionTable<u8> {
    let mut table = TransactionTable::new();
    for transaction in transactions {
        table.add_transaction(transaction.iter().copied()).unwrap();
    }
    table
}

fn hug(items: &[u8], utility: Utility, support: usize, twu: Utility) -> Hug<u8> {
    Hug {
        label: Label::new(items),
        utility,
        support,
        twu,
    }
}

/// Four items over four transactions; every itemset with any support has TWU of at least 5.
fn grocery() -> TransactionTable<u8> {
    table(&[
        &[(1, 1), (2, 2), (3, 3)],
        &[(1, 2), (3, 2)],
        &[(1, 1), (2, 1), (3, 1), (4, 5)],
        &[(2, 4), (3, 1)],
    ])
}

fn mined(table: &TransactionTable<u8>, min_util: Utility) -> (ItemsetRegistry<u8>, Vec<Hug<u8>>) {
    let mut registry = MiningConfig::new(min_util).registry(table.items()).unwrap();
    let hugs = registry.mine(table, min_util).unwrap();
    (registry, hugs)
}

#[test]
fn single_item_above_threshold() {
    let data = table(&[&[(1, 5), (2, 1)], &[(1, 5)], &[(1, 5), (2, 1)]]);
    let (registry, hugs) = mined(&data, 10);

    assert_eq!(hugs, vec![hug(&[1], 15, 3, 17)]);

    // Item 2 clears the TWU bound but not the utility threshold, so it stays registered.
    let b = registry.get(&Label::new(&[2])).unwrap();
    assert_eq!(b.stage(), Stage::Rejected);
    assert_eq!(b.utility(), 2);
    assert_eq!(b.twu(), 12);
}

#[test]
fn superset_with_equal_support_is_not_a_generator() {
    let data = table(&[&[(1, 3), (2, 4)], &[(1, 3), (2, 4)]]);
    let (registry, hugs) = mined(&data, 5);

    assert_eq!(hugs, vec![hug(&[1], 6, 2, 14), hug(&[2], 8, 2, 14)]);

    let ab = registry.get(&Label::new(&[1, 2])).unwrap();
    assert_eq!(ab.support(), 2);
    assert_eq!(ab.utility(), 14);
    assert_eq!(ab.stage(), Stage::Rejected);
}

#[test]
fn threshold_above_every_twu_prunes_everything() {
    let data = table(&[&[(1, 5), (2, 1)], &[(1, 5)], &[(1, 5), (2, 1)]]);
    let mut registry = MiningConfig::new(18).registry(data.items()).unwrap();
    let mut hugs = Vec::new();
    let summary = registry.mine_all(&data, 18, |hug| hugs.push(hug)).unwrap();

    assert!(hugs.is_empty());
    assert_eq!(summary.layers, 1);
    assert_eq!(summary.pruned, 2);
    assert_eq!(summary.generated, 0);
    assert!(registry.layer(1).unwrap().is_empty());
    assert!(registry.layer(2).unwrap().is_empty());
}

#[test]
fn grocery_generators() {
    let data = grocery();
    let mut registry = ItemsetRegistry::with_items(data.items(), None);
    let mut hugs = Vec::new();
    let summary = registry.mine_all(&data, 5, |hug| hugs.push(hug)).unwrap();

    assert_eq!(
        hugs,
        vec![
            hug(&[2], 7, 3, 19),
            hug(&[3], 7, 4, 23),
            hug(&[4], 5, 1, 8),
            hug(&[1, 2], 5, 2, 14),
        ]
    );
    assert_eq!(summary.layers, 4);
    assert_eq!(summary.evaluated, 15);
    assert_eq!(summary.pruned, 0);
    assert_eq!(summary.emitted, 4);
    assert_eq!(summary.rejected, 11);
    assert_eq!(summary.generated, 11);
}

#[test]
fn utility_lists_use_inclusion_exclusion() {
    let data = grocery();
    let (registry, _) = mined(&data, 1);

    let abc = registry.get(&Label::new(&[1, 2, 3])).unwrap();
    assert_eq!(abc.occurrences().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(abc.utility_list().collect::<Vec<_>>(), vec![(1, 6), (3, 3)]);
    assert_eq!(abc.utility(), 9);

    let abcd = registry.get(&Label::new(&[1, 2, 3, 4])).unwrap();
    assert_eq!(abcd.utility_list().collect::<Vec<_>>(), vec![(3, 8)]);

    let mut checked = 0;
    for itemset in registry.iter().filter(|itemset| itemset.label().len() >= 3) {
        let (s1, s2) = itemset.label().parents().unwrap();
        let s1 = registry.get(&s1).unwrap();
        let s2 = registry.get(&s2).unwrap();
        let prefix = registry.get(&itemset.label().prefix()).unwrap();
        for (tid, utility) in itemset.utility_list() {
            assert_eq!(
                utility,
                s1.utility_in(tid).unwrap() + s2.utility_in(tid).unwrap()
                    - prefix.utility_in(tid).unwrap()
            );
            checked += 1;
        }
        let total: Utility = itemset.utility_list().map(|(_, utility)| utility).sum();
        assert_eq!(total, itemset.utility());
    }
    assert!(checked > 0);
}

#[test]
fn registry_keeps_closure_after_pruning() {
    let data = grocery();
    let (registry, hugs) = mined(&data, 10);

    assert!(hugs.is_empty());
    assert!(registry.get(&Label::new(&[4])).is_none());
    assert!(registry.get(&Label::new(&[1, 4])).is_none());
    assert!(registry.get(&Label::new(&[1, 2, 3])).is_some());

    for itemset in registry.iter() {
        assert!(registry.all_subsets_survive(itemset.label()));
        assert!(itemset.twu() >= 10);
    }
}

#[test]
fn statistics_are_monotone() {
    let data = grocery();
    let (registry, _) = mined(&data, 1);

    for itemset in registry.iter() {
        assert!(itemset.twu() >= itemset.utility(), "{:?}", itemset.label());
        let k = itemset.label().len();
        if k < 2 {
            continue;
        }
        for subset in itemset.label().subsets(k - 1) {
            let subset = registry.get(&subset).unwrap();
            assert!(subset.support() >= itemset.support());
            assert!(subset.twu() >= itemset.twu());
        }
    }
}

#[test]
fn emitted_itemsets_are_minimal() {
    let data = grocery();
    let (registry, hugs) = mined(&data, 5);

    for hug in hugs.iter() {
        for other in registry.iter() {
            if other.label() != &hug.label && other.label().is_subset(&hug.label) {
                assert_ne!(other.support(), hug.support, "{:?} vs {:?}", other.label(), hug.label);
            }
        }
    }
}

#[test]
fn mining_twice_gives_the_same_result() {
    let data = grocery();
    for min_util in 1..25 {
        let (_, first) = mined(&data, min_util);
        let (_, second) = mined(&data, min_util);
        assert_eq!(
            first.into_iter().collect::<HashSet<_>>(),
            second.into_iter().collect::<HashSet<_>>()
        );
    }
}

#[test]
fn max_length_stops_growth() {
    let data = grocery();
    let mut registry = MiningConfig::new(1)
        .with_max_length(2)
        .registry(data.items())
        .unwrap();
    let hugs = registry.mine(&data, 1).unwrap();

    assert_eq!(registry.max_length(), 2);
    assert!(registry.layer(3).is_none());
    assert!(hugs.iter().all(|hug| hug.label.len() <= 2));
}

#[test]
fn missing_subset_aborts() {
    let data = table(&[&[(1, 5), (2, 5)]]);
    let mut registry = ItemsetRegistry::new(2);
    registry.register(Label::new(&[1]));
    registry.register(Label::new(&[1, 2]));

    match registry.mine(&data, 1) {
        Err(MineError::SubsetNotFound { layer: 1, label }) => assert_eq!(label, "{2}"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn removing_an_absent_itemset_fails() {
    let mut registry = ItemsetRegistry::<u8>::with_items(vec![1, 2], None);
    let next = registry.remove(&Label::new(&[1])).unwrap().unwrap();
    let layer = registry.layer(1).unwrap();
    assert_eq!(layer.at(next).unwrap().label(), &Label::new(&[2]));
    assert_eq!(layer.len(), 1);

    assert!(matches!(
        registry.remove(&Label::new(&[1])),
        Err(MineError::ItemsetNotFound { layer: 1, .. })
    ));
    assert!(matches!(
        registry.remove(&Label::new(&[1, 2, 3])),
        Err(MineError::ItemsetNotFound { layer: 3, .. })
    ));
}

#[test]
fn text_input_end_to_end() {
    let input = "\
a b c:6:1 2 3
a c:4:2 2
a b c d:8:1 1 1 5
b c:5:4 1
";
    let (names, data) = read_transactions::<_, lasso::Spur>(input.as_bytes()).unwrap();
    let mut registry = MiningConfig::new(5).registry(data.items()).unwrap();
    let hugs = registry.mine(&data, 5).unwrap();

    let found: Vec<(Vec<&str>, Utility)> = hugs
        .iter()
        .map(|hug| {
            let items = hug.label.iter().map(|item| names.resolve(&item)).collect();
            (items, hug.utility)
        })
        .collect();
    assert_eq!(
        found,
        vec![
            (vec!["b"], 7),
            (vec!["c"], 7),
            (vec!["d"], 5),
            (vec!["a", "b"], 5),
        ]
    );
}

#[test]
fn oversized_transactions_are_refused() {
    let mut data = TransactionTable::<u8>::new();
    assert_eq!(
        data.add_transaction(vec![(1, Utility::MAX), (1, 1)]),
        Err(UtilityOverflow)
    );
    assert_eq!(
        data.add_transaction(vec![(1, Utility::MAX), (2, 1)]),
        Err(UtilityOverflow)
    );
    assert_eq!(data.transaction_count(), 0);
    assert_eq!(data.add_transaction(vec![(1, Utility::MAX)]), Ok(1));
}

#[test]
fn twu_overflow_aborts() {
    let half = Utility::MAX / 2 + 1;
    let data = table(&[&[(1, half)], &[(1, half)]]);
    let mut registry = ItemsetRegistry::with_items(data.items(), None);

    match registry.mine(&data, 1) {
        Err(MineError::UtilityOverflow { layer: 1, label }) => assert_eq!(label, "{1}"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn registry_mines_only_once() {
    let data = grocery();
    let (mut registry, hugs) = mined(&data, 5);

    assert_eq!(registry.mine(&data, 5), Err(MineError::AlreadyMined));
    let emitted: Vec<_> = registry
        .iter()
        .filter(|itemset| itemset.stage() == Stage::Emitted)
        .collect();
    assert_eq!(emitted.len(), hugs.len());
}
