use crate::{InputError, ItemId, TransactionTable, Utility};
use csv_core::{ReadFieldResult, ReaderBuilder};
use lasso::{Rodeo, RodeoResolver};
use std::io;
use std::str;

/// Reads a transaction database in the `items:total:utilities` text format.
///
/// Each line holds one transaction as three colon-separated fields: the whitespace-separated item
/// names, the transaction utility, and the whitespace-separated utility of each item in the same
/// order. Lines starting with `#` and blank lines are skipped. Item names are interned, and the
/// returned resolver maps the keys used in the table back to the names.
///
/// ```
/// use hug_miner::{read_transactions, Dataset};
///
/// let input = "# items:total:utilities\nbread milk:7:3 4\nmilk:2:2\n";
/// let (names, table) = read_transactions::<_, lasso::Spur>(input.as_bytes()).unwrap();
///
/// assert_eq!(table.transaction_count(), 2);
/// assert_eq!(table.transaction_total_utility(1), 7);
/// let items: Vec<&str> = table.items().iter().map(|key| names.resolve(key)).collect();
/// assert_eq!(items, vec!["bread", "milk"]);
/// ```
pub fn read_transactions<R, K>(
    mut input: R,
) -> Result<(RodeoResolver<K>, TransactionTable<K>), InputError>
where
    R: io::Read,
    K: ItemId + Default + lasso::Key,
{
    let mut inputbuf = [0; 16384];
    let mut fieldbuf = vec![0; 1024];
    let mut fieldlen = 0;
    let mut record = Vec::with_capacity(3);
    let mut record_line = 1;
    let mut table = TransactionTable::new();
    let mut database_utility: Utility = 0;
    let mut rodeo = Rodeo::new();
    let mut reader = ReaderBuilder::new()
        .delimiter(b':')
        .quoting(false)
        .comment(Some(b'#'))
        .build();

    loop {
        let read = input.read(&mut inputbuf)?;
        let mut bytes = &inputbuf[..read];
        loop {
            let (result, nin, nout) = reader.read_field(bytes, &mut fieldbuf[fieldlen..]);
            bytes = &bytes[nin..];
            fieldlen += nout;
            match result {
                ReadFieldResult::InputEmpty => break,
                ReadFieldResult::OutputFull => {
                    // Item lists have no length limit, so grow rather than reject.
                    let len = fieldbuf.len();
                    fieldbuf.resize(len * 2, 0);
                }
                ReadFieldResult::Field { record_end } => {
                    if record.is_empty() {
                        record_line = reader.line();
                    }
                    let field = str::from_utf8(&fieldbuf[..fieldlen]).map_err(|source| {
                        InputError::Utf8 {
                            line: reader.line(),
                            source,
                        }
                    })?;
                    record.push(field.to_owned());
                    fieldlen = 0;

                    if record_end {
                        let utility = parse_record(&record, record_line, &mut rodeo, &mut table)?;
                        // Every TWU and utility the miner computes is bounded by this sum.
                        database_utility = database_utility.checked_add(utility).ok_or(
                            InputError::UtilityOverflow { line: record_line },
                        )?;
                        record.clear();
                    }
                }
                ReadFieldResult::End => {
                    table.shrink_to_fit();
                    return Ok((rodeo.into_resolver(), table));
                }
            }
        }
    }
}

/// Adds one record to the table and returns its transaction utility.
fn parse_record<K>(
    record: &[String],
    line: u64,
    rodeo: &mut Rodeo<K>,
    table: &mut TransactionTable<K>,
) -> Result<Utility, InputError>
where
    K: ItemId + lasso::Key,
{
    if let [only] = record {
        if only.trim().is_empty() {
            return Ok(0);
        }
    }
    let (items, total, utilities) = match record {
        [items, total, utilities] => (items, total, utilities),
        _ => {
            return Err(InputError::FieldCount {
                line,
                found: record.len(),
            })
        }
    };

    let items: Vec<&str> = items.split_whitespace().collect();
    if items.is_empty() {
        return Err(InputError::EmptyTransaction { line });
    }

    let utilities = utilities
        .split_whitespace()
        .map(|value| parse_utility(value, line))
        .collect::<Result<Vec<_>, _>>()?;
    if utilities.len() != items.len() {
        return Err(InputError::LengthMismatch {
            line,
            items: items.len(),
            utilities: utilities.len(),
        });
    }
    if let Some(&utility) = utilities.iter().find(|&&utility| utility < 0) {
        return Err(InputError::NegativeUtility { line, utility });
    }

    let declared = parse_utility(total.trim(), line)?;
    let computed = utilities
        .iter()
        .try_fold(0, |sum: Utility, &utility| sum.checked_add(utility))
        .ok_or(InputError::UtilityOverflow { line })?;
    if declared != computed {
        return Err(InputError::TotalMismatch {
            line,
            declared,
            computed,
        });
    }

    table
        .add_transaction(
            items
                .into_iter()
                .map(|name| rodeo.get_or_intern(name))
                .zip(utilities),
        )
        .map_err(|_| InputError::UtilityOverflow { line })?;
    Ok(computed)
}

fn parse_utility(value: &str, line: u64) -> Result<Utility, InputError> {
    value.parse().map_err(|_| InputError::InvalidNumber {
        line,
        value: value.to_owned(),
    })
}
