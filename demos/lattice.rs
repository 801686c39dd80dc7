use hug_miner::{ItemsetRegistry, Label, Stage, TransactionTable};
use std::error::Error;
use std::fmt;

fn fmt_label<W: fmt::Write>(out: &mut W, label: &Label<u8>) -> fmt::Result {
    for item in label.iter() {
        out.write_char((b'A' + item).into())?;
    }
    Ok(())
}

/// Prints the itemsets that survived pruning as a Graphviz graph, with each itemset linked to the
/// one-shorter subsets it was built from. High utility generators are drawn in bold.
fn main() -> Result<(), Box<dyn Error>> {
    let min_util = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let mut table = TransactionTable::<u8>::new();
    table.add_transaction(vec![(0, 1), (1, 2), (2, 3)])?;
    table.add_transaction(vec![(0, 2), (2, 2)])?;
    table.add_transaction(vec![(0, 1), (1, 1), (2, 1), (3, 5)])?;
    table.add_transaction(vec![(1, 4), (2, 1)])?;

    let mut registry = ItemsetRegistry::with_items(table.items(), None);
    let summary = registry.mine_all(&table, min_util, |_| {})?;

    let mut edges = 0;
    println!("graph {{ node [shape=plaintext];");
    for itemset in registry.iter() {
        let mut name = String::new();
        fmt_label(&mut name, itemset.label())?;

        let style = if itemset.stage() == Stage::Emitted {
            ", fontname=\"bold\""
        } else {
            ""
        };
        println!(
            "\"{}\" [label=\"{}\\nu={} s={} twu={}\"{}];",
            name,
            name,
            itemset.utility(),
            itemset.support(),
            itemset.twu(),
            style
        );

        let k = itemset.label().len();
        if k > 1 {
            for subset in itemset.label().subsets(k - 1) {
                let mut parent = String::new();
                fmt_label(&mut parent, &subset)?;
                println!("\"{}\" -- \"{}\";", parent, name);
                edges += 1;
            }
        }
    }
    println!(
        "}} // {} layers, {} itemsets, {} edges, {} generators",
        summary.layers,
        registry.iter().count(),
        edges,
        summary.emitted
    );

    Ok(())
}
