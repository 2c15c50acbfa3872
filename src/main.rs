use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use csimlib::config::CacheConfig;
use csimlib::io::open_trace;
use csimlib::simulator::Simulator;
use csimlib::trace::TraceParser;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative LRU cache simulator for valgrind memory traces"))]
struct Args {
    /// Number of set index bits (there are 2^s sets)
    #[arg(short = 's', value_name = "s", allow_negative_numbers = true, required_unless_present = "config", conflicts_with = "config")]
    set_bits: Option<i64>,

    /// Associativity, the number of lines per set
    #[arg(short = 'E', value_name = "E", allow_negative_numbers = true, required_unless_present = "config", conflicts_with = "config")]
    associativity: Option<i64>,

    /// Number of block offset bits (blocks are 2^b bytes)
    #[arg(short = 'b', value_name = "b", allow_negative_numbers = true, required_unless_present = "config", conflicts_with = "config")]
    block_bits: Option<i64>,

    /// Trace file to replay
    #[arg(short = 't', value_name = "tracefile")]
    trace: PathBuf,

    /// Print every access and how the cache classified it
    #[arg(short = 'v')]
    verbose: bool,

    /// Read the cache geometry from a JSON file, e.g. {"s": 4, "E": 1, "b": 4}
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fail on a malformed trace line instead of stopping there
    #[arg(long)]
    strict: bool,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn cache_config(&self) -> Result<CacheConfig> {
        if let Some(path) = &self.config {
            let file = File::open(path)
                .with_context(|| format!("Couldn't open the config file at path {}", path.display()))?;
            return CacheConfig::from_json_reader(BufReader::new(file))
                .with_context(|| format!("Invalid config file {}", path.display()));
        }
        // clap guarantees all three are present without --config
        match (self.set_bits, self.associativity, self.block_bits) {
            (Some(s), Some(e), Some(b)) => CacheConfig::new(s, e, b).context("Invalid cache geometry"),
            _ => anyhow::bail!("-s, -E and -b are required unless --config is given"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let config = args.cache_config()?;
    info!(
        "simulating {} sets of {} lines with {} byte blocks",
        config.num_sets(),
        config.associativity(),
        config.block_size()
    );
    let mut simulator = Simulator::new(config)?;

    info!("replaying {}", args.trace.display());
    let mut trace = TraceParser::new(open_trace(&args.trace)?).strict(args.strict);
    let verbose = args.verbose;
    let stats = *simulator.simulate(&mut trace, |record, result| {
        if verbose {
            println!("{} {:x}, {} {result}", record.kind, record.address, record.size);
        }
    })?;

    info!(
        "simulated {} accesses from {} trace lines in {}s, hit rate {:.2}%",
        stats.accesses(),
        trace.lines_read(),
        simulator.execution_time().as_nanos() as f64 / 1e9,
        stats.hit_rate() * 100.0
    );
    debug!("cache lines never filled: {}", simulator.invalid_line_count());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats).context("Couldn't serialise the results")?);
    } else {
        println!("{stats}");
    }
    Ok(())
}
