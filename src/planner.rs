//! Execution planning: convert parsed CLI data into a job specification used by main.

use crate::data::{self, Command, DataSource, Parameters, SampleStream};
use crate::error::PlannerError;

pub struct ComputePlan {
    pub data_iter: SampleStream,
    pub command: Command,
    pub params: Parameters,
}

pub struct OutputPlan {
    /// Flush after every record for stdin-driven and watch-mode runs, so
    /// downstream consumers see samples as they happen.
    pub flush_each_record: bool,
    pub source: DataSource,
}

pub fn build_job(
    source: DataSource,
    command: Command,
    params: Parameters,
) -> Result<(ComputePlan, OutputPlan), PlannerError> {
    let data_iter = match &source {
        DataSource::Separate(loc_source, time_source) => data::expand_sources(
            loc_source.clone(),
            time_source.clone(),
            params.step,
            params.timezone_str(),
        )
        .map_err(PlannerError::from),
        DataSource::Paired(path) => {
            data::expand_paired(path.clone(), params.timezone_str()).map_err(PlannerError::from)
        }
    }?;

    let flush_each_record = source.uses_stdin() || source.is_watch_mode(params.step);

    let compute_plan = ComputePlan {
        data_iter,
        command,
        params,
    };
    let output_plan = OutputPlan {
        flush_each_record,
        source,
    };
    Ok((compute_plan, output_plan))
}
