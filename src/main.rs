use std::process::ExitCode;

use sparam_metrics::config::PipelineConfig;
use sparam_metrics::pipeline::{run_extract, run_merge};

fn main() -> ExitCode {
    sparam_metrics::init_logging();

    let result = PipelineConfig::from_env().and_then(|config| {
        run_merge(&config)?;
        run_extract(&config)?;
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
