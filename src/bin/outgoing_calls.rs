use anyhow::{Context, Result};
use ssreports::{
    config::Settings,
    fetch::SurveyStudioClient,
    logging::init_tracing,
    period::{self, PROJECT_ID, TOKEN},
    schema::Registry,
    tasks::{self, outgoing_calls, CATCH_UP_PAUSE, OUTGOING_CALLS_ARGS},
    Error,
};
use std::process;

fn main() -> Result<()> {
    init_tracing();

    let invocation = match period::from_process_args(&OUTGOING_CALLS_ARGS) {
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
        .value(TOKEN.name, &OUTGOING_CALLS_ARGS)
        .context("token missing")?;
    let project_id = invocation
        .value(PROJECT_ID.name, &OUTGOING_CALLS_ARGS)
        .context("project id missing")?;
    let source = SurveyStudioClient::new(&settings.api_url, token)?;

    let saved = tasks::run_catch_up(&invocation.periods(), CATCH_UP_PAUSE, |p| {
        outgoing_calls::run(&source, &registry, project_id, p, &settings.reports_dir)
    })
    .context("outgoing calls report")?;

    for path in saved {
        println!("Файл {} сохранён", path.display());
    }
    Ok(())
}
