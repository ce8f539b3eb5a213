use std::path::PathBuf;

use structopt::StructOpt;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod error;
mod perf;
mod perf_csv;
mod plot;

use crate::perf_csv::Table;
use crate::plot::ImageFormat;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "perf-plot",
    about = "Plot MapReduce perf: threads vs average time"
)]
struct Opt {
    /// Path to perf CSV
    #[structopt(parse(from_os_str))]
    csv_file: PathBuf,

    /// Image format of the written plot (png or svg)
    #[structopt(long, default_value = "png")]
    format: ImageFormat,

    /// Write the plot without opening it in a viewer
    #[structopt(long)]
    no_show: bool,

    /// Increase log verbosity (-v, -vv)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    debug!(?opt, "starting");

    if let Err(e) = run(&opt) {
        error!("{}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn run(opt: &Opt) -> error::Result<()> {
    let table = Table::from_path(&opt.csv_file)?;
    let summary = aggregate::summarize(&table)?;

    let image = plot::output_path(&opt.csv_file, opt.format);
    plot::write_plot(&summary, &image, opt.format)?;
    println!("Saved plot to {}", image.display());

    if !opt.no_show {
        if let Err(e) = plot::show(&image) {
            warn!(path = %image.display(), "could not open plot viewer: {}", e);
        }
    }
    Ok(())
}
