mod platform;

use std::path::Path;
use std::process::ExitCode;

use engine_logging::{engine_error, engine_warn};

fn main() -> ExitCode {
    let config = match platform::load_config(Path::new(platform::CONFIG_FILENAME)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("harvester: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    engine_logging::initialize(&config.log_destination(), config.log_level());

    match platform::run_app(config) {
        Ok(summary) if summary.is_complete() => ExitCode::SUCCESS,
        Ok(summary) => {
            engine_warn!("{} archives were not downloaded", summary.failed.len());
            ExitCode::FAILURE
        }
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
