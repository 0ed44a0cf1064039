// src/report/breakdown.rs

use super::{no_calls_message, ReportTable};
use crate::error::Result;
use crate::schema::columns::{CHANNEL, RESULT};
use crate::table::{Cell, Table};
use std::collections::BTreeMap;

/// Channel name used when the call log has none.
pub const NO_CHANNEL: &str = "no_name";

/// Row collecting results that are not in the category list.
pub const OTHER: &str = "Прочее";

/// Result categories of the outgoing-calls report, in report order.
pub const RESULTS: &[&str] = &[
    "Успешное интервью",
    "Отказ от участия",
    "Прерванное интервью",
    "Перезвонить позже",
    "Не отвечает",
    "Занято",
    "Автоответчик",
    "Не целевой респондент",
    "Номер не существует",
    "Сбой связи",
];

const YELLOW: u32 = 0xFFFF00;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub result: String,
    pub channel: Option<String>,
}

pub fn outcomes_from_table(table: &Table) -> Result<Vec<CallOutcome>> {
    let result = table.column_index(RESULT)?;
    let channel = table.column_index(CHANNEL)?;
    Ok(table
        .rows()
        .iter()
        .map(|r| CallOutcome {
            result: r[result].to_string(),
            channel: match &r[channel] {
                Cell::Empty => None,
                c => Some(c.to_string()),
            },
        })
        .collect())
}

fn share(count: usize, total: usize) -> Cell {
    Cell::Number(count as f64 / total as f64)
}

/// Channel × result matrix of counts and per-channel shares, with totals.
pub fn build(outcomes: &[CallOutcome], categories: &[&str], date: &str) -> ReportTable {
    if outcomes.is_empty() {
        return ReportTable::message(no_calls_message(date));
    }

    // result -> channel -> count, and channel -> count
    let mut matrix: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut channels: BTreeMap<&str, usize> = BTreeMap::new();
    for o in outcomes {
        let channel = o.channel.as_deref().unwrap_or(NO_CHANNEL);
        let result = if categories.contains(&o.result.as_str()) {
            o.result.as_str()
        } else {
            OTHER
        };
        *matrix.entry(result).or_default().entry(channel).or_default() += 1;
        *channels.entry(channel).or_default() += 1;
    }
    let grand_total: usize = channels.values().sum();

    let mut header = vec![Cell::from(CHANNEL)];
    for channel in channels.keys() {
        header.push(Cell::from(*channel));
        header.push(Cell::Empty);
    }
    header.push(Cell::from("Total"));
    header.push(Cell::Empty);

    let mut sub_header = vec![Cell::Empty];
    for _ in 0..=channels.len() {
        sub_header.push(Cell::from("Количество"));
        sub_header.push(Cell::from("Процент"));
    }

    let mut rows = vec![header, sub_header, vec![Cell::from(RESULT)]];

    let mut labels: Vec<&str> = categories.to_vec();
    if matrix.contains_key(OTHER) {
        labels.push(OTHER);
    }
    for label in labels {
        let per_channel = matrix.get(label);
        let mut row = vec![Cell::from(label)];
        let mut across = 0;
        for (channel, channel_total) in &channels {
            let n = per_channel.and_then(|m| m.get(channel)).copied().unwrap_or(0);
            across += n;
            row.push(Cell::from(n));
            row.push(share(n, *channel_total));
        }
        row.push(Cell::from(across));
        row.push(share(across, grand_total));
        rows.push(row);
    }

    let mut total = vec![Cell::from("Total")];
    for channel_total in channels.values() {
        total.push(Cell::from(*channel_total));
        total.push(Cell::Number(1.0));
    }
    total.push(Cell::from(grand_total));
    total.push(Cell::Number(1.0));
    rows.push(total);

    let width = 1 + 2 * (channels.len() + 1);
    let mut column_widths = vec![50.0];
    column_widths.resize(width, 10.0);

    ReportTable {
        rows,
        header_rows: 3,
        header_fill: Some(YELLOW),
        percent_columns: (2..width).step_by(2).collect(),
        column_widths,
        centered: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(result: &str, channel: Option<&str>) -> CallOutcome {
        CallOutcome {
            result: result.into(),
            channel: channel.map(Into::into),
        }
    }

    fn sample() -> Vec<CallOutcome> {
        vec![
            call(RESULTS[0], Some("CATI")),
            call(RESULTS[1], Some("CATI")),
            call(RESULTS[1], Some("CATI")),
            call(RESULTS[4], Some("Робот")),
            call(RESULTS[0], None),
        ]
    }

    fn number(cell: &Cell) -> f64 {
        cell.as_f64().unwrap()
    }

    #[test]
    fn test_empty_input_is_single_message_row() {
        let report = build(&[], RESULTS, "2025-09-09");
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0], vec![Cell::from("За 2025-09-09 не было звонков")]);
    }

    #[test]
    fn test_channels_sorted_with_placeholder() {
        let report = build(&sample(), RESULTS, "2025-09-09");
        let header: Vec<String> = report.rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec![CHANNEL, "CATI", "", "no_name", "", "Робот", "", "Total", ""]
        );
        assert_eq!(report.percent_columns, vec![2, 4, 6, 8]);
        // header rows + categories + total
        assert_eq!(report.rows.len(), 3 + RESULTS.len() + 1);
    }

    #[test]
    fn test_channel_shares_sum_to_one() {
        let mut calls = sample();
        calls.push(call("Что-то новое", Some("CATI")));
        let report = build(&calls, RESULTS, "2025-09-09");
        let body = &report.rows[3..report.rows.len() - 1];
        assert_eq!(body.last().unwrap()[0], Cell::from(OTHER));
        for col in report.percent_columns.iter().copied() {
            let sum: f64 = body.iter().map(|r| number(&r[col])).sum();
            assert!((sum - 1.0).abs() < 1e-9, "column {col} sums to {sum}");
        }
    }

    #[test]
    fn test_total_row_is_exactly_one() {
        let report = build(&sample(), RESULTS, "2025-09-09");
        let total = report.rows.last().unwrap();
        assert_eq!(total[0], Cell::from("Total"));
        for col in report.percent_columns.iter().copied() {
            assert_eq!(total[col], Cell::Number(1.0));
        }
        assert_eq!(total[total.len() - 2], Cell::from(5usize));
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(
            build(&sample(), RESULTS, "d"),
            build(&sample(), RESULTS, "d")
        );
    }

    #[test]
    fn test_outcomes_from_table_maps_blank_channel_to_none() {
        let table = Table::new(
            vec![RESULT.into(), CHANNEL.into()],
            vec![vec![Cell::from("Занято"), Cell::Empty]],
        );
        assert_eq!(outcomes_from_table(&table).unwrap(), vec![call("Занято", None)]);
    }
}
