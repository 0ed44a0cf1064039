use anyhow::{Context, Result};
use ssreports::{
    config::Settings,
    fetch::SurveyStudioClient,
    logging::init_tracing,
    period::{self, PROJECT_ID, TOKEN},
    schema::Registry,
    tasks::{answers, ANSWERS_ARGS},
    Error,
};
use std::process;

fn main() -> Result<()> {
    init_tracing();

    let invocation = match period::from_process_args(&ANSWERS_ARGS) {
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
        .value(TOKEN.name, &ANSWERS_ARGS)
        .context("token missing")?;
    let project_id = invocation
        .value(PROJECT_ID.name, &ANSWERS_ARGS)
        .context("project id missing")?;
    let source = SurveyStudioClient::new(&settings.api_url, token)?;

    let path = answers::run(&source, &registry, project_id, &settings.reports_dir)
        .with_context(|| format!("answers export of project {project_id}"))?;
    println!("Файл {} сохранён", path.display());
    Ok(())
}
