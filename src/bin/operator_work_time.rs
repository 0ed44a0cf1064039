use anyhow::{Context, Result};
use ssreports::{
    config::Settings,
    fetch::{CounterPage, SurveyStudioClient},
    logging::init_tracing,
    period::{self, COUNTERS_URL, TOKEN},
    schema::Registry,
    sink::{AppendOutcome, GoogleSheetsClient},
    tasks::{
        self,
        work_time::{CloudSheet, WorkTimeOutcome, WorkTimeTask},
        CATCH_UP_PAUSE, WORK_TIME_ARGS,
    },
    Error,
};
use std::process;
use tracing::{info, warn};

fn main() -> Result<()> {
    init_tracing();

    let invocation = match period::from_process_args(&WORK_TIME_ARGS) {
        Ok(invocation) => invocation,
        Err(Error::Usage(usage)) => {
            println!("{usage}");
            process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    let settings = Settings::from_env();
    let registry = Registry::new(&settings.work_time_project);
    registry.validate().context("report schemas")?;

    let token = invocation
        .value(TOKEN.name, &WORK_TIME_ARGS)
        .context("token missing")?;
    let counters_url = invocation
        .value(COUNTERS_URL.name, &WORK_TIME_ARGS)
        .context("counters page URL missing")?;

    let source = SurveyStudioClient::new(&settings.api_url, token)?;
    let counters = CounterPage::new(counters_url)?;
    let sheets = match settings.work_time_sheet_target() {
        Ok((credentials, spreadsheet_id)) => Some(
            GoogleSheetsClient::connect(credentials, spreadsheet_id)
                .context("connecting to Google Sheets")?,
        ),
        Err(e) => {
            warn!("{e}; the daily row will only be saved locally");
            None
        }
    };

    let task = WorkTimeTask {
        source: &source,
        counters: &counters,
        registry: &registry,
        reports_dir: &settings.reports_dir,
        cloud: sheets.as_ref().map(|store| CloudSheet {
            store,
            sheet: &settings.work_time_sheet,
        }),
    };

    let outcomes = tasks::run_catch_up(&invocation.periods(), CATCH_UP_PAUSE, |p| task.run(p))
        .context("work-time report")?;

    for outcome in outcomes {
        match outcome {
            WorkTimeOutcome::Saved {
                summary: s,
                path,
                sheet,
            } => {
                info!(
                    period = %s.period_label,
                    operators = s.operators,
                    hours = s.worked_hours,
                    completes = s.completes,
                    "summary"
                );
                match sheet {
                    Some(AppendOutcome::Appended { range }) => info!(%range, "cloud sheet updated"),
                    Some(AppendOutcome::AlreadyPresent) => {
                        info!("a row for this day is already in the cloud sheet")
                    }
                    None => {}
                }
                println!("Файл {} сохранён", path.display());
            }
            WorkTimeOutcome::AlreadyPresent { label } => {
                println!("Данные за {label} уже есть в таблице");
            }
            WorkTimeOutcome::NoWork { period_label } => {
                println!("За {period_label} нет рабочего времени, отчёт не создан");
            }
        }
    }
    Ok(())
}
