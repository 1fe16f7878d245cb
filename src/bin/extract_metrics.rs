use std::process::ExitCode;

use sparam_metrics::config::PipelineConfig;
use sparam_metrics::pipeline::run_extract;

fn main() -> ExitCode {
    sparam_metrics::init_logging();

    match PipelineConfig::from_env().and_then(|config| run_extract(&config)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Metric extraction failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
