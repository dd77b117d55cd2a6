//! picolang compiler driver
//!
//! Concatenates the given sources, compiles them to picovm assembly and, unless
//! `--asm` is given, assembles the result into a raw bytecode image.

use clap::{ArgAction, Parser};
use pico_bytecode::assemble;
use pico_cli::{logging, output, parse_origin, Reporter, SourceSet};
use pico_compiler::{compile, CompileOptions};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "picoc")]
#[command(about = "Compile picolang sources to picovm bytecode", long_about = None)]
#[command(version)]
struct Cli {
    /// Source files, concatenated in order
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Output file [default: a.hex, or out.asm with --asm]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after compilation and write assembly text
    #[arg(short, long)]
    asm: bool,

    /// Write the output to stdout
    #[arg(short, long)]
    stdout: bool,

    /// Disable constant folding and peephole optimization
    #[arg(long)]
    no_opt: bool,

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
    let options = CompileOptions {
        optimize: !cli.no_opt,
    };

    let assembly = match compile(sources.text(), sources.unit_name(), &options) {
        Ok(assembly) => assembly,
        Err(err) => {
            let reporter = Reporter::new(&sources);
            reporter.emit(&reporter.compile_error(&err), color)?;
            anyhow::bail!("could not compile {}", sources.unit_name());
        }
    };
    info!(lines = assembly.lines().count(), "compiled");

    if cli.asm {
        let path = cli.output.clone().unwrap_or_else(|| PathBuf::from("out.asm"));
        return output::write_output(assembly.as_bytes(), &path, cli.stdout);
    }

    let image = match assemble(&assembly, cli.origin) {
        Ok(image) => image,
        Err(err) => {
            // The compiler produced text the assembler rejects; show it against
            // the generated listing.
            let mut listing = SourceSet::new();
            listing.add("<generated assembly>", assembly);
            let reporter = Reporter::new(&listing);
            reporter.emit(&[reporter.asm_error(&err)], color)?;
            anyhow::bail!("could not assemble {}", sources.unit_name());
        }
    };

    let path = cli.output.clone().unwrap_or_else(|| PathBuf::from("a.hex"));
    output::write_output(&image.bytes, &path, cli.stdout)?;
    if let Some(map) = &cli.map {
        output::write_map(&image, map)?;
    }
    Ok(())
}
