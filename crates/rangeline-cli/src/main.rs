//! rangeline CLI: stream delimited records out of an object without
//! downloading it whole.

use clap::{Args, Parser, Subcommand};
use rangeline_core::config::ReaderConfig;
use rangeline_core::delimiter::Delimiter;
use rangeline_core::error::Error;
use rangeline_io::{
    build_store_from_config, planned_fetches, ObjectLocation, RangedRecordReader, RemoteObjectStore,
};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rangeline")]
#[command(about = "Read delimited records from object storage in bounded range requests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug, Default)]
struct ReadArgs {
    /// Object URI (s3://bucket/key, gs://bucket/key, azure://account/container/key, file:///path or a bare path)
    uri: String,

    /// Bytes requested per range fetch (overrides config)
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Record delimiter, with backslash escapes such as '\r\n' (overrides config)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Replace invalid UTF-8 instead of failing
    #[arg(long)]
    lossy: bool,

    /// JSON config file; replaces settings taken from the environment
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print fetch statistics to stderr when done
    #[arg(long)]
    stats: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every record, the trailing remainder included
    Cat {
        #[command(flatten)]
        read: ReadArgs,

        /// Written after each delimited record (escapes allowed)
        #[arg(long, default_value = "\\n")]
        output_delimiter: String,
    },

    /// Print the first N records, then stop fetching
    Head {
        #[command(flatten)]
        read: ReadArgs,

        /// Number of records
        #[arg(short = 'n', long, default_value_t = 10)]
        lines: usize,
    },

    /// Count records (a trailing remainder counts when non-empty)
    Count {
        #[command(flatten)]
        read: ReadArgs,
    },

    /// Show object size and the range requests a full pass would issue
    Stat {
        #[command(flatten)]
        read: ReadArgs,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Cat {
            read,
            output_delimiter,
        } => cat(&read, &output_delimiter),
        Commands::Head { read, lines } => head(&read, lines),
        Commands::Count { read } => count(&read),
        Commands::Stat { read } => stat(&read),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Environment (or the `--config` file), then CLI flags.
fn resolve_config(args: &ReadArgs) -> Result<ReaderConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::from_json(&fs::read_to_string(path)?)?,
        None => ReaderConfig::from_env(),
    };
    apply_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cfg: &mut ReaderConfig, args: &ReadArgs) {
    if let Some(chunk_size) = args.chunk_size {
        cfg.chunk_size = chunk_size;
    }
    if let Some(delimiter) = &args.delimiter {
        cfg.delimiter = delimiter.clone();
    }
    if args.lossy {
        cfg.lossy_utf8 = true;
    }
}

fn open(args: &ReadArgs) -> Result<RangedRecordReader, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    let location = ObjectLocation::parse(&args.uri)?;
    tracing::debug!(%location, chunk_size = config.chunk_size, "opening object");
    Ok(RangedRecordReader::open(&location, &config)?)
}

fn report_stats(args: &ReadArgs, reader: &RangedRecordReader) {
    if args.stats {
        let s = reader.stats();
        eprintln!(
            "size={} fetches={} bytes_fetched={} records={}",
            s.total_size.unwrap_or(0),
            s.fetches,
            s.bytes_fetched,
            s.records
        );
    }
}

fn cat(args: &ReadArgs, output_delimiter: &str) -> Result<(), Box<dyn std::error::Error>> {
    let out_delim = Delimiter::parse_escaped(output_delimiter)?;
    let mut reader = open(args)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for record in reader.records(None)? {
        let record = record?;
        out.write_all(record.text.as_bytes())?;
        if !record.terminal {
            out.write_all(out_delim.as_bytes())?;
        }
    }
    out.flush()?;
    report_stats(args, &reader);
    Ok(())
}

fn head(args: &ReadArgs, lines: usize) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(args)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for record in reader.records(None)?.take(lines) {
        let record = record?;
        if record.terminal && record.text.is_empty() {
            break;
        }
        writeln!(out, "{}", record.text)?;
    }
    out.flush()?;
    report_stats(args, &reader);
    Ok(())
}

fn count(args: &ReadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = open(args)?;
    let mut n = 0u64;
    for record in reader.records(None)? {
        let record = record?;
        if !(record.terminal && record.text.is_empty()) {
            n += 1;
        }
    }
    println!("{n}");
    report_stats(args, &reader);
    Ok(())
}

fn stat(args: &ReadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    let location = ObjectLocation::parse(&args.uri)?;
    let store = build_store_from_config(&location, &config.storage)?;
    let size = store
        .size(&location.bucket, &location.key)
        .map_err(|e| Error::object_access(&location.bucket, &location.key, e))?;

    println!("Object: {location}");
    println!("  Size: {} bytes ({:.2} MB)", size, size as f64 / 1_048_576.0);
    println!("  Chunk Size: {} bytes", config.chunk_size);
    println!(
        "  Range Requests: {}",
        planned_fetches(size, config.chunk_size)
    );
    println!("  Delimiter: {:?}", config.delimiter()?);
    Ok(())
}
