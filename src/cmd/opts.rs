use std::path::PathBuf;

use clap::Parser;

/// Validates a delta PDS4 archive bundle delivery against its predecessor,
/// and optionally merges the two into a single superseding bundle.
///
/// pdsmerge checks that a new ("delta") bundle delivery is a legal
/// continuation of a previous delivery: that LIDVIDs were bumped
/// correctly, that modification histories are consistent, and that
/// collection membership lines up between the two deliveries. If the
/// delta passes, and `--supersede` is given, the two deliveries are
/// merged into a new bundle directory in which every product carries its
/// full version history.
#[derive(Debug, Parser)]
#[command(name = "pdsmerge", author, version, about)]
pub struct PdsMergeArgs {
    /// Path to the previous bundle delivery
    pub previous_bundle_dir: PathBuf,

    /// Path to the new delta bundle delivery
    pub delta_bundle_dir: PathBuf,

    /// Merge the previous and delta bundles into a new bundle directory
    ///
    /// The merge only runs if the readiness check produces no
    /// error-severity findings.
    #[arg(short, long, value_name = "MERGED_BUNDLE_DIR")]
    pub supersede: Option<PathBuf>,

    /// Relax checks that don't apply to JAXA-delivered bundles
    ///
    /// JAXA deliveries may omit a previous member product from a delta
    /// bundle's member entries and may omit declaring a collection the
    /// delta bundle doesn't touch; this flag disables the corresponding
    /// checks and, during a merge, completes the bundle label for
    /// collections the delta left undeclared.
    #[arg(short, long)]
    pub jaxa: bool,

    /// Plan the merge and report what would be copied without writing anything
    #[arg(short = 'D', long)]
    pub dry: bool,

    /// Increase log verbosity to debug level
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to this file in addition to stderr
    #[arg(short, long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_styles: bool,

    /// Path to a config.toml to use instead of the default config directory
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
