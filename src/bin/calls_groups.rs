use anyhow::{Context, Result};
use ssreports::{
    config::Settings,
    fetch::SurveyStudioClient,
    logging::init_tracing,
    period::{self, PROJECT_ID, TOKEN},
    schema::Registry,
    tasks::{self, calls_groups, CALLS_GROUPS_ARGS, CATCH_UP_PAUSE},
    Error,
};
use std::process;

fn main() -> Result<()> {
    init_tracing();

    let invocation = match period::from_process_args(&CALLS_GROUPS_ARGS) {
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
        .value(TOKEN.name, &CALLS_GROUPS_ARGS)
        .context("token missing")?;
    let project_id = invocation
        .value(PROJECT_ID.name, &CALLS_GROUPS_ARGS)
        .context("project id missing")?;
    let source = SurveyStudioClient::new(&settings.api_url, token)?;

    let saved = tasks::run_catch_up(&invocation.periods(), CATCH_UP_PAUSE, |p| {
        calls_groups::run(&source, &registry, project_id, p, &settings.reports_dir)
    })
    .context("calls groups report")?;

    for path in saved {
        println!("Файл {} сохранён", path.display());
    }
    Ok(())
}
