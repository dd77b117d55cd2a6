//! picovm assembler driver
//!
//! Concatenates the given assembly sources and writes the raw bytecode image.

use clap::{ArgAction, Parser};
use pico_bytecode::assemble;
use pico_cli::{logging, output, parse_origin, Reporter, SourceSet};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "picoasm")]
#[command(about = "Assemble picovm assembly into bytecode", long_about = None)]
#[command(version)]
struct Cli {
    /// Assembly files, concatenated in order
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, default_value = "a.hex")]
    output: PathBuf,

    /// Write the image to stdout
    #[arg(short, long)]
    stdout: bool,

    /// Address of the first byte, decimal or 0x-prefixed
    #[arg(long, default_value = "0", value_parser = parse_origin)]
    origin: u16,

    /// Write the label table and line mapping as JSON
    #[arg(long)]
    map: Option<PathBuf>,

    /// When to use colors
    #[arg(long, value_parser = ["auto", "always", "never"])]
    color: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let color = output::resolve_color_choice(cli.color.as_deref());
    let sources = SourceSet::read(&cli.sources)?;

    let image = match assemble(sources.text(), cli.origin) {
        Ok(image) => image,
        Err(err) => {
            let reporter = Reporter::new(&sources);
            reporter.emit(&[reporter.asm_error(&err)], color)?;
            anyhow::bail!("could not assemble {}", sources.unit_name());
        }
    };

    output::write_output(&image.bytes, &cli.output, cli.stdout)?;
    if let Some(map) = &cli.map {
        output::write_map(&image, map)?;
    }
    Ok(())
}
