//! Kelp CLI

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use kelp_compression::{ContentDecoder, ZstdDecoder};
use kelp_config::{load_config, Config, SessionConfig};
use kelp_core::ProxyConfig;
use kelp_session::{Method, Session};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kelp")]
#[command(about = "HTTP session client with streaming zstd decoding", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "KELP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a request and print the decoded body
    Fetch(FetchArgs),

    /// Decode a local zstd file in fixed-size chunks
    Decode(DecodeArgs),

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "kelp.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct FetchArgs {
    /// Request URL
    url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Header as 'Name: value'; 'Name:' removes a session header
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Proxy URL for every scheme
    #[arg(long)]
    proxy: Option<String>,

    /// Verify TLS certificates
    #[arg(long)]
    verify: bool,

    /// Request timeout (e.g. 45s, 2m)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the body to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print status line and response headers
    #[arg(short, long)]
    include: bool,
}

#[derive(Args)]
struct DecodeArgs {
    /// zstd-compressed input file
    file: PathBuf,

    /// Bytes fed to the decoder per call
    #[arg(long, default_value_t = 16 * 1024)]
    chunk_size: usize,

    /// Write the output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch(args) => {
            let config = match &args.config {
                Some(path) => load_config(path)?,
                None => Config::default(),
            };

            let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
            init_tracing(level, cli.log_json || config.logging.json)?;

            fetch(args, config.session).await
        }

        Commands::Decode(args) => {
            init_tracing(cli.log_level.as_deref().unwrap_or("info"), cli.log_json)?;

            let input = File::open(&args.file)
                .with_context(|| format!("Failed to open {}", args.file.display()))?;
            let mut output = open_output(args.output.as_deref())?;

            let stats = decode_stream(input, &mut output, args.chunk_size)?;
            tracing::info!(
                frames = stats.frames,
                bytes_in = stats.bytes_in,
                bytes_out = stats.bytes_out,
                "Decoded {}",
                args.file.display()
            );
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Verify TLS: {}", cfg.session.verify);
                    tracing::info!("  Proxied: {}", !cfg.session.proxy.is_none());
                    tracing::info!("  Timeout: {:?}", cfg.session.timeout);
                    tracing::info!("  Headers: {}", cfg.session.headers.len());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Kelp HTTP session client");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

async fn fetch(args: FetchArgs, mut config: SessionConfig) -> Result<()> {
    if args.verify {
        config.verify = true;
    }
    if let Some(proxy) = args.proxy {
        config.proxy = ProxyConfig::single(proxy);
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }

    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;

    let session = Session::with_config(config)?;
    let mut request = session.request(method, args.url.as_str());
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value);
    }
    if let Some(data) = args.data {
        request = request.body(data);
    }

    let mut response = request.send().await?;
    let mut output = open_output(args.output.as_deref())?;

    if args.include {
        writeln!(output, "{:?} {}", response.version(), response.status())?;
        for (name, value) in response.headers() {
            writeln!(output, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
        }
        writeln!(output)?;
    }

    while let Some(chunk) = response.chunk().await? {
        output.write_all(&chunk)?;
    }
    output.flush()?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), url = %response.url(), "Request failed");
    }

    session.close();
    Ok(())
}

/// Split a `Name: value` header argument. An empty value means removal.
fn parse_header(raw: &str) -> Result<(&str, Option<&str>)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("Invalid header {raw:?}, expected 'Name: value'");
    };

    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid header {raw:?}, missing name");
    }

    let value = value.trim();
    Ok((name, (!value.is_empty()).then_some(value)))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DecodeStats {
    frames: usize,
    bytes_in: u64,
    bytes_out: u64,
}

fn decode_stream<R: Read, W: Write>(
    mut input: R,
    output: &mut W,
    chunk_size: usize,
) -> Result<DecodeStats> {
    let mut decoder = ZstdDecoder::new()?;
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut stats = DecodeStats::default();

    loop {
        let read = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        stats.bytes_in += read as u64;

        let decoded = decoder.decode(&buf[..read]);
        stats.bytes_out += decoded.len() as u64;
        output.write_all(&decoded)?;
    }

    let tail = decoder.flush()?;
    stats.bytes_out += tail.len() as u64;
    output.write_all(&tail)?;
    output.flush()?;

    stats.frames = decoder.completed_frames();
    Ok(stats)
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(filter.into())
        .add_directive("hyper_util=warn".parse()?);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(io::stderr),
            )
            .init();
    }

    Ok(())
}
