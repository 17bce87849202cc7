//! zoau-samples CLI: sample z/OS tools built on Z Open Automation Utilities.
//!
//! Each subcommand wraps one utility flow (IEBCOPY member copy, job
//! submission, REXX under IKJEFT01, SMP/E LIST, zCX version scan).
//! Pass `--format json` for machine-readable output.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use zoau_samples_lib::commands::run_rexx::RexxArgs;
use zoau_samples_lib::commands::{
    create_sysin, job_sample, member_copy, run_job, run_rexx, smpe_list, zcx_versions,
};
use zoau_samples_lib::output::OutputFormat;
use zoau_samples_lib::{exit_code, Context};

const LOG_FILE: &str = "zoau-samples.log";

/// zoau-samples CLI.
#[derive(Parser)]
#[command(
    name = "zoau-samples",
    version,
    about = "zoau-samples - z/OS job, data set and utility samples over ZOAU"
)]
struct Cli {
    /// Enable debug logging to zoau-samples.log.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// ZOAU install directory; tools are looked up in its bin directory.
    #[arg(long = "zoau-path", global = true, env = "ZOAU_HOME")]
    zoau_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write lines to a CP1047 card-image input file.
    CreateSysin {
        /// File to write.
        file: PathBuf,

        /// Input lines, at most 72 characters each.
        lines: Vec<String>,
    },

    /// Copy PDS members with IEBCOPY and classify the result.
    MemberCopy {
        /// Source PDS.
        source: String,

        /// Destination PDS.
        destination: String,

        /// Members to copy (space- or comma-separated).
        #[arg(required = true)]
        members: Vec<String>,

        /// Keep the input deck and listing files.
        #[arg(short, long)]
        debug: bool,
    },

    /// Submit a JCL data set and poll it until it finishes.
    RunJob {
        /// Data set holding the JCL, e.g. "MY.DATASET(JCLJOB)".
        dataset: String,

        /// Seconds between status checks.
        #[arg(short, long)]
        interval: Option<u64>,

        /// Give up after this many seconds.
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Write the status samples as JSON to this file.
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// Write, run, read and purge the BPXBATCH sample job.
    JobSample,

    /// Run a REXX exec under IKJEFT01.
    RunRexx {
        /// Library holding the exec (SYSEXEC).
        #[arg(long)]
        library: String,

        /// Exec member name.
        #[arg(long)]
        exec: String,

        /// Parameters passed to the exec.
        #[arg(long, default_value = "")]
        parms: String,

        /// In-stream input lines for the exec.
        #[arg(long)]
        input: Vec<String>,

        /// DD name for the exec's output.
        #[arg(long = "output-dd")]
        output_dd: Option<String>,

        /// File bound to the output DD.
        #[arg(long = "output-file", conflicts_with = "output_dataset")]
        output_file: Option<PathBuf>,

        /// Data set bound to the output DD.
        #[arg(long = "output-dataset")]
        output_dataset: Option<String>,
    },

    /// SMP/E LIST of a zone with allocations from a YAML defaults file.
    SmpeList {
        /// High level qualifier for the work and listing data sets.
        hlq: String,

        /// Target zone to query.
        #[arg(short, long, default_value = "GLOBAL")]
        zone: String,

        /// Extra LIST options.
        #[arg(short, long)]
        options: Option<String>,

        /// Defaults file.
        #[arg(long, default_value = smpe_list::DEFAULTS_FILE)]
        defaults: PathBuf,
    },

    /// SMP/E LIST of the global zone with temporary work data sets.
    SmpeGlobal {
        /// Global CSI data set.
        #[arg(long, default_value = "AT4SMP.GLOBAL.CSI")]
        csi: String,

        /// Volume for the work and output data sets.
        #[arg(long, default_value = "USRAT8")]
        volume: String,

        /// Keep temporary files and data sets.
        #[arg(short, long)]
        keep: bool,
    },

    /// Report versions of running zCX instances.
    ZcxVersions {
        /// zCX registry directory.
        #[arg(short = 'p', long = "zcx-registry-path")]
        registry: Option<PathBuf>,

        /// Only report instances with an upgrade available.
        #[arg(short, long)]
        upgradeable_only: bool,
    },
}

fn init_tracing(verbose: bool) {
    let from_env = std::env::var("RUST_LOG").is_ok();
    if !verbose && !from_env {
        return;
    }
    let log_file = match std::fs::File::create(LOG_FILE) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot create {LOG_FILE}: {e}; logging disabled");
            return;
        }
    };
    let filter = if from_env {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        tracing_subscriber::EnvFilter::new("debug")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::new(OutputFormat::from_str(&cli.format), cli.zoau_path);

    let result = match cli.command {
        Commands::CreateSysin { file, lines } => create_sysin::run(&ctx, file, lines),
        Commands::MemberCopy {
            source,
            destination,
            members,
            debug,
        } => member_copy::run(&ctx, source, destination, members, debug),
        Commands::RunJob {
            dataset,
            interval,
            timeout,
            log,
        } => run_job::run(&ctx, dataset, interval, timeout, log),
        Commands::JobSample => job_sample::run(&ctx),
        Commands::RunRexx {
            library,
            exec,
            parms,
            input,
            output_dd,
            output_file,
            output_dataset,
        } => run_rexx::run(
            &ctx,
            RexxArgs {
                library,
                exec,
                parms,
                input,
                output_dd,
                output_file,
                output_dataset,
            },
        ),
        Commands::SmpeList {
            hlq,
            zone,
            options,
            defaults,
        } => smpe_list::run(&ctx, hlq, zone, options, Some(defaults)),
        Commands::SmpeGlobal { csi, volume, keep } => smpe_list::run_global(&ctx, csi, volume, keep),
        Commands::ZcxVersions {
            registry,
            upgradeable_only,
        } => zcx_versions::run(&ctx, registry, upgradeable_only),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        if !cli.verbose {
            eprintln!("Run with --verbose for details in {LOG_FILE}");
        }
        std::process::exit(exit_code(&e));
    }
}
