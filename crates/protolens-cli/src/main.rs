//! protolens - Decode Protocol Buffer payloads without a schema
//!
//! This tool reads captured protobuf payloads (files, directories of files,
//! or hex on the command line) and prints every field with all of its
//! plausible interpretations.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use protolens_core::{render_tree, Decoder, DecoderConfig, Message, StatsVisitor};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Decode Protocol Buffer payloads without a schema
#[derive(Parser, Debug)]
#[command(name = "protolens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output file (single input) or directory (directory input); stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Skip a leading 5-byte gRPC frame header when present
    #[arg(long)]
    grpc: bool,

    /// Deepest nesting level to decode as a message (default 100); deeper payloads are shown as bytes
    #[arg(long)]
    max_depth: Option<usize>,

    /// Decode nested messages at any depth (trusted input only)
    #[arg(long, conflicts_with = "max_depth")]
    unlimited_depth: bool,

    /// Overwrite existing output files
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single capture file to decode
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of capture files to decode
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Hex-encoded payload, e.g. "08 96 01"
    #[arg(long)]
    hex: Option<String>,
}

/// Output format for decoded payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Pretty-printed JSON array of field records
    Json,
    /// Indented text tree
    Tree,
    /// Field counts only
    Summary,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Tree | OutputFormat::Summary => "txt",
        }
    }
}

/// Tracks seen captures so identical files are decoded once
#[derive(Default)]
struct CaptureRegistry {
    /// Maps content hash -> first path seen with that content
    seen: HashMap<String, PathBuf>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    decoded: usize,
    failed: usize,
    written: usize,
}

impl CaptureRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 16 chars of blake3)
    fn content_hash(data: &[u8]) -> String {
        let hash = blake3::hash(data);
        hash.to_hex()[..16].to_string()
    }

    /// Register a capture; returns false if identical content was already seen
    fn register(&mut self, path: &Path, content_hash: &str) -> bool {
        self.stats.total_found += 1;

        if let Some(first) = self.seen.get(content_hash) {
            debug!(
                "Skipping duplicate: {} (same content as {})",
                path.display(),
                first.display()
            );
            self.stats.duplicates_skipped += 1;
            return false;
        }

        self.seen
            .insert(content_hash.to_string(), path.to_path_buf());
        true
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} decoded, {} failed, {} written",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.decoded,
            self.stats.failed,
            self.stats.written
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let decoder = build_decoder(&cli);

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &decoder, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &decoder, directory)
    } else if let Some(ref hex) = cli.input.hex {
        process_hex(&cli, &decoder, hex)
    } else {
        bail!("One of --file, --directory or --hex must be specified")
    }
}

fn build_decoder(cli: &Cli) -> Decoder {
    let mut config = DecoderConfig::new().skip_grpc_framing(cli.grpc);
    if let Some(depth) = cli.max_depth {
        config = config.max_depth(depth);
    } else if cli.unlimited_depth {
        config = config.unlimited_depth();
    }
    Decoder::with_config(config)
}

/// Decode a single capture file
fn process_single_file(cli: &Cli, decoder: &Decoder, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    trace!("Reading {}", file.display());
    let data = fs::read(file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;

    let message = decoder
        .decode(&data)
        .with_context(|| format!("Failed to decode {}", file.display()))?;

    emit(cli, &message)
}

/// Decode hex given on the command line
fn process_hex(cli: &Cli, decoder: &Decoder, hex: &str) -> Result<()> {
    let data = parse_hex(hex)?;
    let message = decoder
        .decode(&data)
        .context("Failed to decode hex input")?;

    emit(cli, &message)
}

/// Write a single rendered result to --output or stdout
fn emit(cli: &Cli, message: &Message) -> Result<()> {
    let content = render(cli.format, message)?;
    match cli.output {
        Some(ref path) => {
            write_output_file(path, &content, cli.force)?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Decode every capture in a directory recursively
fn process_directory(cli: &Cli, decoder: &Decoder, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }
    if let Some(ref output) = cli.output {
        if output.is_file() {
            bail!(
                "Output must be a directory when decoding a directory: {}",
                output.display()
            );
        }
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = CaptureRegistry::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            trace!("Skipping hidden file: {}", path.display());
            continue;
        }

        // Don't decode our own output when it lives inside the input tree
        if cli.output.as_deref().is_some_and(|out| path.starts_with(out)) {
            trace!("Skipping output file: {}", path.display());
            continue;
        }

        if let Err(e) = process_capture(cli, decoder, directory, path, &mut registry) {
            // Log error but continue with other files
            warn!("Error processing {}: {:#}", path.display(), e);
            registry.stats.failed += 1;
        }
    }

    registry.print_summary();
    Ok(())
}

/// Decode one file found while walking a directory
fn process_capture(
    cli: &Cli,
    decoder: &Decoder,
    root: &Path,
    path: &Path,
    registry: &mut CaptureRegistry,
) -> Result<()> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let hash = CaptureRegistry::content_hash(&data);
    if !registry.register(path, &hash) {
        return Ok(());
    }

    debug!("Decoding {} ({} bytes)", path.display(), data.len());
    let message = decoder.decode(&data).context("Failed to decode")?;
    registry.stats.decoded += 1;

    let content = render(cli.format, &message)?;
    match cli.output {
        Some(ref output_dir) => {
            let output_path = output_path_for(output_dir, root, path, cli.format.extension());
            match write_output_file(&output_path, &content, cli.force) {
                Ok(()) => {
                    println!("Wrote {}", output_path.display());
                    registry.stats.written += 1;
                }
                Err(e) => {
                    error!("Failed to write {}: {:#}", output_path.display(), e);
                    registry.stats.failed += 1;
                }
            }
        }
        None => {
            println!("==> {} <==", path.display());
            println!("{}", content);
        }
    }

    Ok(())
}

/// Render a decoded message in the requested format
fn render(format: OutputFormat, message: &Message) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(message).context("Failed to serialize output")
        }
        OutputFormat::Tree => Ok(render_tree(message).trim_end().to_string()),
        OutputFormat::Summary => Ok(render_summary(&StatsVisitor::collect(message))),
    }
}

fn render_summary(stats: &StatsVisitor) -> String {
    format!(
        "fields: {} (max depth {})\nvarint: {}\nfixed64: {}\nfixed32: {}\nstring: {}\nprotobuf: {}\nbytes: {}",
        stats.field_count,
        stats.max_depth,
        stats.varint_count,
        stats.fixed64_count,
        stats.fixed32_count,
        stats.string_count,
        stats.message_count,
        stats.bytes_count
    )
}

/// Parse hex text such as "08 96 01", "089601" or "0x08 0x96 0x01"
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .split_whitespace()
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        bail!("Hex input contains a non-hex character '{}'", bad);
    }
    if digits.len() % 2 != 0 {
        bail!("Hex input has an odd number of digits ({})", digits.len());
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = &digits[i..i + 2];
            u8::from_str_radix(pair, 16).with_context(|| format!("Invalid hex byte '{}'", pair))
        })
        .collect()
}

/// Output path for `path` (found under `root`) inside `output_dir`,
/// keeping the relative layout and appending the format extension
fn output_path_for(output_dir: &Path, root: &Path, path: &Path, extension: &str) -> PathBuf {
    let relative = path
        .strip_prefix(root)
        .ok()
        .filter(|r| !r.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| path.file_name().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("capture"));

    let mut name = output_dir.join(relative).into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Write an output file, creating parent directories
fn write_output_file(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Check if file exists
    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    writeln!(file, "{}", content)
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("08 96 01").unwrap(), vec![0x08, 0x96, 0x01]);
        assert_eq!(parse_hex("089601").unwrap(), vec![0x08, 0x96, 0x01]);
        assert_eq!(parse_hex("0x08 0X96\n0x01").unwrap(), vec![0x08, 0x96, 0x01]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("089").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("0é").is_err());
        // from_str_radix alone would take a leading sign
        assert!(parse_hex("+f+f").is_err());
        assert!(parse_hex("-1").is_err());
    }

    #[test]
    fn test_capture_registry_deduplication() {
        let mut registry = CaptureRegistry::new();
        let hash = CaptureRegistry::content_hash(&[0x08, 0x01]);

        assert!(registry.register(Path::new("a.bin"), &hash));
        assert!(!registry.register(Path::new("b.bin"), &hash));

        let other = CaptureRegistry::content_hash(&[0x08, 0x02]);
        assert!(registry.register(Path::new("c.bin"), &other));

        assert_eq!(registry.stats.total_found, 3);
        assert_eq!(registry.stats.duplicates_skipped, 1);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = CaptureRegistry::content_hash(b"hello");
        let hash2 = CaptureRegistry::content_hash(b"hello");
        let hash3 = CaptureRegistry::content_hash(b"world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 16);
    }

    #[test]
    fn test_output_path_for() {
        let out = output_path_for(
            Path::new("/out"),
            Path::new("/captures"),
            Path::new("/captures/grpc/req.bin"),
            "json",
        );
        assert_eq!(out, PathBuf::from("/out/grpc/req.bin.json"));
    }

    #[test]
    fn test_render_formats() {
        let message = protolens_core::decode(&[0x08, 0x96, 0x01]).unwrap();

        let json = render(OutputFormat::Json, &message).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["fieldNumber"], 1);
        assert_eq!(value[0]["byteRange"], "0-3");

        assert_eq!(
            render(OutputFormat::Tree, &message).unwrap(),
            "[0-3] #1 varint: uint=150 sint=75"
        );

        let summary = render(OutputFormat::Summary, &message).unwrap();
        assert!(summary.starts_with("fields: 1 (max depth 0)"));
        assert!(summary.contains("varint: 1"));
    }

    #[test]
    fn test_build_decoder_from_flags() {
        let cli = Cli::parse_from(["protolens", "--hex", "00", "--grpc", "--max-depth", "3"]);
        let decoder = build_decoder(&cli);
        assert!(decoder.config().skip_grpc_framing);
        assert_eq!(decoder.config().max_depth, Some(3));

        let cli = Cli::parse_from(["protolens", "--hex", "00"]);
        assert_eq!(
            build_decoder(&cli).config().max_depth,
            Some(protolens_core::DEFAULT_MAX_DEPTH)
        );

        let cli = Cli::parse_from(["protolens", "--hex", "00", "--unlimited-depth"]);
        assert_eq!(build_decoder(&cli).config().max_depth, None);

        assert!(Cli::try_parse_from([
            "protolens",
            "--hex",
            "00",
            "--unlimited-depth",
            "--max-depth",
            "2"
        ])
        .is_err());
    }

    #[test]
    fn test_write_output_file_respects_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.json");

        write_output_file(&path, "[]", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");

        assert!(write_output_file(&path, "[1]", false).is_err());
        write_output_file(&path, "[1]", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1]\n");
    }

    #[test]
    fn test_process_directory_writes_outputs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(input.path().join("a.bin"), [0x08, 0x96, 0x01]).unwrap();
        fs::write(input.path().join("b.bin"), [0x08, 0x96, 0x01]).unwrap();
        fs::write(input.path().join("broken.bin"), [0x0A, 0x05]).unwrap();
        fs::write(input.path().join(".hidden"), [0x08, 0x01]).unwrap();

        let output_arg = output.path().to_string_lossy().to_string();
        let input_arg = input.path().to_string_lossy().to_string();
        let cli = Cli::parse_from(["protolens", "-d", &input_arg, "-o", &output_arg]);
        process_directory(&cli, &build_decoder(&cli), input.path()).unwrap();

        assert!(output.path().join("a.bin.json").exists());
        // Identical content is decoded once
        assert!(!output.path().join("b.bin.json").exists());
        // Decode failures are skipped
        assert!(!output.path().join("broken.bin.json").exists());
        assert!(!output.path().join(".hidden.json").exists());
    }

    #[test]
    fn test_process_capture_counts_write_failures() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let capture = input.path().join("a.bin");
        fs::write(&capture, [0x08, 0x96, 0x01]).unwrap();
        // Existing output without --force makes the write fail
        fs::write(output.path().join("a.bin.json"), "[]").unwrap();

        let output_arg = output.path().to_string_lossy().to_string();
        let input_arg = input.path().to_string_lossy().to_string();
        let cli = Cli::parse_from(["protolens", "-d", &input_arg, "-o", &output_arg]);
        let mut registry = CaptureRegistry::new();
        process_capture(&cli, &build_decoder(&cli), input.path(), &capture, &mut registry)
            .unwrap();

        assert_eq!(registry.stats.decoded, 1);
        assert_eq!(registry.stats.written, 0);
        assert_eq!(registry.stats.failed, 1);
        assert_eq!(
            fs::read_to_string(output.path().join("a.bin.json")).unwrap(),
            "[]"
        );
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
