//! Sorting and totals.

use crate::error::AggregateResult;
use crate::models::{Record, Table};

/// Sort records chronologically and wrap them in a [`Table`].
///
/// The sort is stable: records sharing a date keep their source order.
/// Records without a date go last. Fails only when the total overflows.
pub fn aggregate(mut records: Vec<Record>) -> AggregateResult<Table> {
    records.sort_by_key(|r| (r.date.is_none(), r.date));
    Table::from_sorted(records)
}
