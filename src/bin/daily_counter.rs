//! Prints yesterday's value from a project's public daily-counters page.

use anyhow::{Context, Result};
use chrono::Utc;
use ssreports::{
    fetch::{counters::parse_count, CounterPage, CounterSource},
    logging::init_tracing,
    period::{self, counter_label, yesterday_in_msk, COUNTERS_URL},
    tasks::DAILY_COUNTER_ARGS,
    Error,
};
use std::process;
use tracing::warn;

fn main() -> Result<()> {
    init_tracing();

    let invocation = match period::from_process_args(&DAILY_COUNTER_ARGS) {
        Ok(invocation) => invocation,
        Err(Error::Usage(usage)) => {
            println!("{usage}");
            process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };
    let url = invocation
        .value(COUNTERS_URL.name, &DAILY_COUNTER_ARGS)
        .context("counters page URL missing")?;

    let label = counter_label(yesterday_in_msk(Utc::now()));
    let page = CounterPage::new(url)?;
    match page.counter_value(&label)? {
        Some(value) => {
            let count = parse_count(&label, &value)?;
            println!("{label}: {count}");
        }
        None => warn!(%label, "no counter for this day yet"),
    }
    Ok(())
}
