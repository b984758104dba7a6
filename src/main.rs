//! csv-grep - grep delimited text files by composite key
//!
//! Main entry point for the command-line application.

use clap::Parser;
use std::io::Write;
use std::process;

use csv_grep::cli::Args;
use csv_grep::processor::{Processor, ProcessorConfig};
use csv_grep::progress::{print_bullet, print_error, print_header, print_warning};

fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging; RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(args) {
        print_error(&format!("{}", e));

        // Print chain of errors
        for cause in e.chain().skip(1) {
            print_error(&format!("  Caused by: {}", cause));
        }

        process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    validate_args(&args)?;

    let config = ProcessorConfig::from_args(&args)?;

    if !args.quiet && args.verbose > 0 {
        print_config(&config);
    }

    let mut processor = Processor::new(config)?;
    let stats = processor.process()?;

    log::info!("{}", stats.summary_line());
    if !args.quiet {
        if stats.seen == 0 {
            print_warning("No rows read");
        }
        stats.print_summary();
    }

    Ok(())
}

/// Validate command-line arguments before any data is read
fn validate_args(args: &Args) -> anyhow::Result<()> {
    if args.pattern.is_none() && args.pattern_file.is_none() {
        anyhow::bail!("one or both of option -p and -f needed");
    }

    if let Some(ref path) = args.pattern_file {
        if !path.is_file() {
            anyhow::bail!("Pattern file does not exist: {:?}", path);
        }
    }

    for path in &args.input {
        if path.as_os_str() != "-" && !path.is_file() {
            anyhow::bail!("Input file does not exist: {:?}", path);
        }
    }

    Ok(())
}

/// Print configuration summary
fn print_config(config: &ProcessorConfig) {
    print_header("Configuration");

    if let Some(ref pattern) = config.pattern {
        print_bullet(&format!("Pattern:              {}", pattern));
    }
    if let Some(ref path) = config.pattern_file {
        print_bullet(&format!("Pattern file:         {:?}", path));
    }
    print_bullet(&format!("Pattern key columns:  {}", config.pattern_key));
    print_bullet(&format!("Key columns:          {}", config.key));
    print_bullet(&format!("Field separator:      ({})", config.input_format.delimiter as char));
    print_bullet(&format!("Quote char:           ({})", config.input_format.quote as char));
    print_bullet(&format!("Match mode:           {:?}", config.mode));
    print_bullet(&format!("Speedup:              {}", config.speedup));
    print_bullet(&format!("Invert:               {}", config.invert));
    print_bullet(&format!(
        "Inputs:               {}",
        config
            .inputs
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    print_bullet(&format!("Output:               {}", config.output));
}
