//! altvec CLI: drive the native-buffer binding against a host runtime.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use altvec_binding::demo::{doubles, doubles_example};
use altvec_binding::wrap_vec;
use altvec_core::config::AltvecConfig;
use altvec_host::Runtime;

#[derive(Parser)]
#[command(name = "altvec")]
#[command(about = "Expose native f64 buffers as host vectors without copying", long_about = None)]
struct Cli {
    /// JSON config file (defaults to ALTVEC_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the owned [-2, -1, 0, 1, 2] value and read it through the host
    Doubles {
        /// Print the inspection record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Wrap a borrowed random buffer and compare host and native sums
    Example {
        /// Number of elements (overrides config)
        #[arg(long)]
        len: Option<usize>,

        /// Random seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Wrap an owned buffer, drop its root, and collect
    Gc {
        /// Number of elements in the owned buffer
        #[arg(long, default_value = "1024")]
        len: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Doubles { json } => run_doubles(&config, json),
        Commands::Example { len, seed } => {
            run_example(&apply_overrides(config, len, seed))
        }
        Commands::Gc { len } => run_gc(&config, len),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<AltvecConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p)?;
            Ok(AltvecConfig::from_json_str(&text)?)
        }
        None => Ok(AltvecConfig::from_env()),
    }
}

fn apply_overrides(mut cfg: AltvecConfig, len: Option<usize>, seed: Option<u64>) -> AltvecConfig {
    if let Some(n) = len {
        cfg.demo_len = n;
    }
    if let Some(s) = seed {
        cfg.seed = Some(s);
    }
    cfg
}

fn runtime(config: &AltvecConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    tracing::debug!(?config, "starting runtime");
    altvec_binding::init()?;
    Ok(Runtime::from_config(config)?)
}

fn run_doubles(config: &AltvecConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime(config)?;
    let value = doubles(&rt)?;
    let root = rt.protect(value)?;

    if json {
        let inspection = rt.inspect_altrep(root.value())?;
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    let len = rt.length(root.value())?;
    println!("{}", rt.inspect(root.value())?);
    for i in 0..len {
        println!("  [{}] = {}", i, rt.real_elt(root.value(), i)?);
    }

    let mut out = vec![0.0; 10];
    let got = rt.get_region(root.value(), 3, out.len(), &mut out)?;
    println!("region(start=3, requested={}) -> {:?}", out.len(), &out[..got]);
    println!("sum = {}", rt.sum(root.value())?);
    Ok(())
}

fn run_example(config: &AltvecConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime(config)?;
    let s = doubles_example(&rt, config.demo_len, config.seed)?;

    println!("Borrowed buffer of {} elements", s.len);
    println!("  host sum:   {}", s.host);
    println!("  native sum: {}", s.native);
    println!(
        "  {}",
        if s.bit_identical() {
            "✓ bit-identical"
        } else {
            "✗ sums differ"
        }
    );
    Ok(())
}

fn run_gc(config: &AltvecConfig, len: usize) -> Result<(), Box<dyn std::error::Error>> {
    let rt = runtime(config)?;
    let data: Vec<f64> = (0..len).map(|i| i as f64).collect();
    let value = wrap_vec(&rt, data)?;
    {
        let root = rt.protect(value)?;
        let kept = rt.collect();
        println!(
            "rooted:   swept={} finalized={} live={}",
            kept.swept,
            kept.finalized,
            rt.is_live(root.value())
        );
    }

    let report = rt.collect();
    println!(
        "unrooted: swept={} finalized={} live={}",
        report.swept,
        report.finalized,
        rt.is_live(value)
    );
    println!("stats: {}", serde_json::to_string(&rt.stats())?);
    Ok(())
}
