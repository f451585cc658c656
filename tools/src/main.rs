use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use encoder::EncoderLimits;
use prbuf_tools::{encode_json, load_schema, to_hex, EncodeTarget, Fingerprint};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "prbuf-tools",
    version,
    about = "prbuf schema and encoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a JSON value as a message.
    Encode {
        /// Schema JSON describing the message.
        #[arg(long)]
        schema: PathBuf,
        /// Name of the message to encode.
        #[arg(long)]
        message: String,
        /// JSON value to encode; `-` reads stdin.
        input: PathBuf,
        /// Write raw bytes here instead of printing hex.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Only report the encoded size.
        #[arg(long)]
        count: bool,
        /// Output buffer capacity (or ceiling with --count).
        #[arg(long, default_value_t = 64 * 1024)]
        capacity: usize,
        /// Maximum number of open frames.
        #[arg(long)]
        max_depth: Option<u8>,
        /// Permit writes to deprecated fields.
        #[arg(long)]
        allow_deprecated: bool,
    },
    /// Print the schema fingerprint as JSON.
    Fingerprint {
        /// Schema JSON to fingerprint.
        schema: PathBuf,
    },
    /// Print the reference diagnostic-dump schema as JSON.
    DemoSchema,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("PRBUF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Encode {
            schema,
            message,
            input,
            out,
            count,
            capacity,
            max_depth,
            allow_deprecated,
        } => {
            let schema = load_schema(&schema).context("load schema")?;
            let value = read_input(&input)?;
            let target = if count {
                EncodeTarget::Count(capacity)
            } else {
                EncodeTarget::Buffer(capacity)
            };
            let mut limits =
                max_depth.map_or_else(EncoderLimits::default, EncoderLimits::with_max_depth);
            if allow_deprecated {
                limits = limits.allowing_deprecated();
            }

            let report = encode_json(&schema, &message, &value, target, limits)?;
            match (report.bytes, out) {
                (Some(bytes), Some(path)) => {
                    fs::write(&path, &bytes)
                        .with_context(|| format!("write output {}", path.display()))?;
                    println!("{} bytes written to {}", bytes.len(), path.display());
                }
                (Some(bytes), None) => println!("{}", to_hex(&bytes)),
                (None, _) => println!("{} bytes", report.len),
            }
        }
        Command::Fingerprint { schema } => {
            let schema = load_schema(&schema).context("load schema")?;
            let json = serde_json::to_string_pretty(&Fingerprint::of(&schema))
                .context("serialize json")?;
            println!("{json}");
        }
        Command::DemoSchema => {
            let schema = demo_schema::demo_schema()
                .map_err(|err| anyhow::anyhow!("demo schema is invalid: {err}"))?;
            let json = serde_json::to_string_pretty(&schema).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<serde_json::Value> {
    let contents = if path == Path::new("-") {
        io::read_to_string(io::stdin()).context("read stdin")?
    } else {
        fs::read_to_string(path).with_context(|| format!("read input {}", path.display()))?
    };
    serde_json::from_str(&contents).context("parse input json")
}
