// Entrypoint for the CLI application.
// - Keeps `main` a straight line over the library modules.
// - Returns `anyhow::Result` so every failure ends the run with its context.

use anyhow::Context;
use clap::Parser;
use log::info;
use mlwl_image_occlusion::{
    api::ApiClient,
    canvas,
    cli::{self, Args},
    export,
    launcher::{self, ScriptEnv},
    ui,
};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    // Fail before any prompt if there is nothing to launch at the end.
    let script = launcher::locate_script(args.script.as_deref())?;
    info!("Using script: {}", script.display());

    // Base URL comes from `MLWL_API_URL` or the public backend.
    let mut api = ApiClient::from_env()?;

    let creds = ui::prompt_credentials()?;
    let auth_token = ui::with_spinner("Logging in...", || api.login(&creds))
        .context("Login failed. Please check your credentials")?;

    let courses = ui::with_spinner("Fetching courses...", || api.courses())
        .context("Failed to retrieve courses")?;
    info!("{} course(s) found", courses.len());
    let course = ui::select_course(&courses)?.clone();

    let column_id = match ui::with_spinner("Fetching course entries...", || api.column_id(course.id)) {
        Ok(Some(id)) => {
            println!("Column ID of the second column: {}", id);
            Some(id)
        }
        Ok(None) => {
            ui::warn_line("Failed to retrieve column ID. Continuing with the program.");
            None
        }
        Err(e) => {
            ui::warn_line(&format!("{:#}. Continuing with the program.", e));
            None
        }
    };

    let image_path = args.image_path()?;
    let image = image::open(&image_path)
        .with_context(|| format!("Unable to load image {}", image_path.display()))?;

    let occlusions = canvas::run(&image)?;
    let written = export::write_all(&image, &occlusions, &args.output_dir);
    info!("{} file(s) written", written.len());

    let env = ScriptEnv {
        course_id: course.id,
        column_id,
        auth_token,
    };
    if args.debug {
        println!("Running script in debug mode...");
        return Err(launcher::run_foreground(&script, &env));
    }

    let pid = launcher::spawn_detached(&script, &env)?;
    ui::ok_line(&format!("Script is running in detached mode (PID: {}).", pid));
    Ok(())
}
