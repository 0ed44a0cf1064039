// src/report/groups.rs

use super::{no_calls_message, round2, ReportTable};
use crate::error::Result;
use crate::schema::columns::{CARRIER, CARRIER_REGION, RESULT};
use crate::table::{Cell, Table};
use std::collections::{BTreeMap, BTreeSet};

pub const SUBTOTAL: &str = "Итог";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedCall {
    pub region: String,
    pub carrier: String,
    pub result: String,
}

pub fn calls_from_table(table: &Table) -> Result<Vec<GroupedCall>> {
    let region = table.column_index(CARRIER_REGION)?;
    let carrier = table.column_index(CARRIER)?;
    let result = table.column_index(RESULT)?;
    Ok(table
        .rows()
        .iter()
        .filter(|r| !r[result].is_empty())
        .map(|r| GroupedCall {
            region: r[region].to_string(),
            carrier: r[carrier].to_string(),
            result: r[result].to_string(),
        })
        .collect())
}

fn to_cells(values: &[f64]) -> impl Iterator<Item = Cell> + '_ {
    values.iter().map(|v| Cell::Number(round2(*v)))
}

fn flush(rows: &mut Vec<Vec<Cell>>, region: &str, sums: &mut [f64]) {
    let mut row = vec![Cell::from(region), Cell::from(SUBTOTAL)];
    row.extend(to_cells(sums));
    rows.push(row);
    sums.iter_mut().for_each(|s| *s = 0.0);
}

/// Share (in percent) of each result's calls that went through each carrier,
/// with a subtotal after every region and a grand total at the bottom.
pub fn build(calls: &[GroupedCall], date: &str) -> ReportTable {
    if calls.is_empty() {
        return ReportTable::message(no_calls_message(date));
    }

    let results: Vec<&str> = calls
        .iter()
        .map(|c| c.result.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut counts: BTreeMap<(&str, &str), BTreeMap<&str, usize>> = BTreeMap::new();
    let mut column_totals: BTreeMap<&str, usize> = BTreeMap::new();
    for c in calls {
        *counts
            .entry((c.region.as_str(), c.carrier.as_str()))
            .or_default()
            .entry(c.result.as_str())
            .or_default() += 1;
        *column_totals.entry(c.result.as_str()).or_default() += 1;
    }

    let percent = |per_result: &BTreeMap<&str, usize>| -> Vec<f64> {
        results
            .iter()
            .map(|r| {
                let n = per_result.get(r).copied().unwrap_or(0);
                n as f64 / column_totals[r] as f64 * 100.0
            })
            .collect()
    };
    let mut header = vec![Cell::from(CARRIER_REGION), Cell::from(CARRIER)];
    header.extend(results.iter().map(|r| Cell::from(*r)));
    let mut rows = vec![header];

    let mut grand = vec![0.0; results.len()];
    let mut region_sum = vec![0.0; results.len()];
    let mut current: Option<&str> = None;

    for ((region, carrier), per_result) in &counts {
        if let Some(prev) = current.filter(|prev| prev != region) {
            flush(&mut rows, prev, &mut region_sum);
        }
        current = Some(*region);

        let values = percent(per_result);
        for (i, v) in values.iter().enumerate() {
            region_sum[i] += v;
            grand[i] += v;
        }
        let mut row = vec![Cell::from(*region), Cell::from(*carrier)];
        row.extend(to_cells(&values));
        rows.push(row);
    }
    if let Some(prev) = current {
        flush(&mut rows, prev, &mut region_sum);
    }

    let mut total = vec![Cell::from(SUBTOTAL), Cell::Empty];
    total.extend(to_cells(&grand));
    rows.push(total);

    let mut column_widths = vec![30.0, 30.0];
    column_widths.resize(2 + results.len(), 14.0);

    ReportTable {
        rows,
        header_rows: 1,
        column_widths,
        ..ReportTable::default()
    }
}
