use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use whitebox_raster::{FileAccess, RasterConfig, Result, WhiteboxRaster};

#[derive(Parser, Debug)]
#[clap(name = "raster-info", about = "Print the header and statistics of a Whitebox raster")]
pub struct Opt {
    /// Header file (.dep) of the raster
    pub header: PathBuf,

    /// Percentile to report, may be repeated
    #[arg(long = "percentile", short = 'p')]
    pub percentiles: Vec<f64>,

    /// Ignore the statistics file and rescan the grid
    #[arg(long = "recompute")]
    pub recompute: bool,

    /// JSON file with store configuration
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = match &opt.config {
        Some(path) => RasterConfig::from_json_file(path)?,
        None => RasterConfig::default(),
    };

    let mut raster = WhiteboxRaster::open_with_config(&opt.header, FileAccess::Read, config)?;
    let header = raster.header().clone();

    println!("{}", opt.header.display());
    println!("  Size: {} x {} ({} rows, {} columns)", header.columns, header.rows, header.rows, header.columns);
    println!("  Data Type: {}", header.data_type);
    println!("  Data Scale: {}", header.data_scale);
    println!("  Byte Order: {}", header.byte_order.header_name());
    println!("  NoData: {}", header.no_data);
    println!("  Extent:");
    println!("    North: {}  South: {}", header.north, header.south);
    println!("    East:  {}  West:  {}", header.east, header.west);
    println!("    Cell Size: {} x {}", header.cell_size_x(), header.cell_size_y());
    println!("  Projection: {}", header.projection);
    if !header.metadata().is_empty() {
        println!("  Metadata:");
        for entry in header.metadata() {
            println!("    {}", entry);
        }
    }

    let stats = if opt.recompute {
        raster.compute_stats()?
    } else {
        raster.stats()?
    };
    println!("\n--- Statistics ---");
    println!("  Valid Cells: {}", stats.num_valid_cells);
    println!("  Min: {}  Max: {}", stats.min, stats.max);
    println!("  Mean: {}", stats.mean);
    println!("  Median: {}", stats.median);
    println!("  Mode: {}", stats.mode);
    println!("  Std Dev: {}", stats.std_dev);
    println!("  Histogram: {} bins of width {}", stats.histogram.counts.len(), stats.histogram.bin_width);

    for p in &opt.percentiles {
        println!("  Percentile {}: {}", p, raster.percentile(*p)?);
    }

    raster.close()
}
