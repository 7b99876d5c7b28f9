pub mod opts;
pub mod report;
pub mod style;

use log::warn;

use crate::cmd::opts::PdsMergeArgs;
use crate::cmd::report::ReadinessReport;
use crate::config::Config;
use crate::pds4::{self, Result};

/// Runs the readiness check, prints a report, and performs the supersede
/// merge if requested and the bundle is ready. Returns the process exit
/// code: `0` if ready (and merge, if requested, completed), `1`
/// otherwise.
pub fn exec_command(args: &PdsMergeArgs, config: &Config) -> Result<i32> {
    let previous = pds4::load_local_bundle(&args.previous_bundle_dir)?;
    let delta = pds4::load_local_bundle(&args.delta_bundle_dir)?;

    let errors = pds4::check_ready(&previous, &delta, config.jaxa);
    let report = ReadinessReport::new(&errors, args.no_styles);

    report.log();
    println!("{report}");

    if !report.is_ready() {
        if args.supersede.is_some() {
            warn!("readiness check failed; skipping supersede");
        }
        return Ok(1);
    }

    if let Some(merged_dir) = &args.supersede {
        pds4::supersede(&previous, &delta, merged_dir, config.dry, config.jaxa)?;
    }

    Ok(0)
}
