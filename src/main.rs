use anyhow::bail;
use blockframe::discard::Discard;
use blockframe::{Algorithm, CodecRegistry, DEFAULT_BUFFER_SIZE_HINT};
use clap::{Args, Parser, Subcommand, ValueEnum};
use human_bytes::human_bytes;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::io::{BufReader, BufWriter, Cursor, Error, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::{Duration, Instant};
use tracing::{info, Level};

#[derive(Parser)]
struct Config {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a file
    Compress(CompressionCfg),
    /// Decompress a file
    Decompress(DecompressionCfg),
    /// Compress or decompress, depending on which path carries a codec extension
    Convert(ConvertCfg),
    /// Benchmark compression+decompression of a single file
    Benchmark(CompressionCfg),
    /// Run multiple benchmarks
    BenchmarkMany(BenchmarkManyCfg),
}

#[derive(Args, Clone)]
struct CompressionCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Compression algorithm
    #[arg(long, short = 'a', default_value = "lz4")]
    algorithm: Algorithm,

    /// Block size in bytes. Each block is compressed independently.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BUFFER_SIZE_HINT)]
    buffer_size: usize,
}

#[derive(Args)]
struct DecompressionCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// Compression algorithm. If not given, determined automatically from the file extension.
    #[arg(long, short = 'a')]
    algorithm: Option<Algorithm>,

    /// Initial size of the compressed payload buffer
    #[arg(long, short = 'b', default_value_t = DEFAULT_BUFFER_SIZE_HINT)]
    buffer_size: usize,
}

#[derive(Args)]
struct ConvertCfg {
    /// Source file
    #[arg()]
    input: PathBuf,

    /// Destination file
    #[arg()]
    output: PathBuf,

    /// Block size in bytes
    #[arg(long, short = 'b', default_value_t = DEFAULT_BUFFER_SIZE_HINT)]
    buffer_size: usize,
}

#[derive(Args)]
struct BenchmarkManyCfg {
    /// Input file path
    #[arg()]
    path: PathBuf,

    /// List of algorithms to benchmark
    #[arg(
        long,
        short = 'a',
        value_delimiter = ',',
        default_value = "lz4,lzav,snappy,zstd,brotli,gzip",
        num_args = 1..
    )]
    algorithms: Vec<Algorithm>,

    /// Block size in bytes. Each block is compressed independently.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BUFFER_SIZE_HINT)]
    buffer_size: usize,

    /// Save benchmark results to a CSV file
    #[arg(long, short)]
    report: Option<PathBuf>,
}

struct Measurement {
    input_len: u64,
    output_len: u64,
    elapsed: Duration,
}

impl Measurement {
    fn compression_ratio(&self) -> f64 {
        self.output_len as f64 / self.input_len as f64
    }

    fn input_throughtput(&self) -> f64 {
        self.input_len as f64 / self.elapsed.as_secs_f64()
    }

    fn output_throughtput(&self) -> f64 {
        self.output_len as f64 / self.elapsed.as_secs_f64()
    }

    fn format_compression(&self) -> String {
        format!(
            "{} => {} ({:.1} %)",
            self.input_len,
            self.output_len,
            self.compression_ratio() * 100.0
        )
    }
}

#[derive(Serialize)]
struct BenchmarkResult {
    algorithm: Algorithm,
    block_size: usize,
    uncompressed_len: u64,
    compressed_len: u64,
    ratio: f64,
    inv_ratio: f64,
    compression_speed_mpbs: f64,
    decompression_speed_mpbs: f64,
}

impl BenchmarkResult {
    fn new(cfg: &CompressionCfg, compression: Measurement, decompression: Measurement) -> Self {
        Self {
            algorithm: cfg.algorithm,
            block_size: cfg.buffer_size,
            uncompressed_len: compression.input_len,
            compressed_len: compression.output_len,
            ratio: (compression.compression_ratio() * 1000.0).round() / 1000.0,
            inv_ratio: (1.0 / compression.compression_ratio() * 1000.0).round() / 1000.0,
            compression_speed_mpbs: (compression.input_throughtput() / 100_000.0).round() / 10.0,
            decompression_speed_mpbs: (decompression.output_throughtput() / 100_000.0).round()
                / 10.0,
        }
    }
}

impl Display for BenchmarkResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:10} block {:>9}:    {:8} => {:8} ({:5.1}%, {:4.2}x),    compr.: {:6.1} MB/s, decompr.: {:6.1} MB/s",
            self.algorithm
                .to_possible_value()
                .unwrap_or_default()
                .get_name(),
            human_bytes(self.block_size as f64),
            human_bytes(self.uncompressed_len as f64),
            human_bytes(self.compressed_len as f64),
            self.ratio * 100.0,
            1.0 / self.ratio,
            self.compression_speed_mpbs,
            self.decompression_speed_mpbs
        )
    }
}

fn main() {
    let cmd = Config::parse();
    init_logging(cmd.verbose);
    if let Err(e) = run(cmd) {
        eprintln!("error: {}", e);
        exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cmd: Config) -> anyhow::Result<()> {
    let registry = CodecRegistry::with_builtin();
    match cmd.command {
        Command::Decompress(cfg) => run_decompress_cmd(&registry, cfg),
        Command::Compress(cfg) => run_compress_cmd(&registry, cfg),
        Command::Convert(cfg) => run_convert_cmd(&registry, cfg),
        Command::Benchmark(cfg) => run_benchmark_cmd(&registry, &cfg).map(|_| ()),
        Command::BenchmarkMany(cfg) => run_benchmark_many_cmd(&registry, cfg),
    }
}

fn run_decompress_cmd(registry: &CodecRegistry, cfg: DecompressionCfg) -> anyhow::Result<()> {
    let codec = match cfg.algorithm {
        Some(algorithm) => algorithm.name(),
        None => match registry.codec_by_file(&cfg.path) {
            Some(codec) => codec,
            None => bail!(
                "Cannot determine compression algorithm from the extension. \
                 Please use -a/--algorithm option."
            ),
        },
    };
    let output_path = decompressed_path(registry, &cfg.path, codec)?;
    let result = decompress_file(registry, codec, &cfg.path, &output_path, cfg.buffer_size)?;
    eprintln!(
        "{}, {:.1} MB/s",
        result.format_compression(),
        result.output_throughtput() / 1_000_000.0
    );
    Ok(())
}

fn run_compress_cmd(registry: &CodecRegistry, cfg: CompressionCfg) -> anyhow::Result<()> {
    let codec = cfg.algorithm.name();
    let output_path = compressed_path(registry, &cfg.path, codec)?;
    let result = compress_file(registry, codec, &cfg.path, &output_path, cfg.buffer_size)?;
    eprintln!(
        "{}, {:.1} MB/s",
        result.format_compression(),
        result.input_throughtput() / 1_000_000.0
    );
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Conversion<'a> {
    Compress(&'a str),
    Decompress(&'a str),
}

/// What `convert` should do, judged by which of the two paths carries a codec extension.
/// `None` when both or neither do.
fn conversion<'a>(
    registry: &'a CodecRegistry,
    input: &Path,
    output: &Path,
) -> Option<Conversion<'a>> {
    match (registry.codec_by_file(input), registry.codec_by_file(output)) {
        (Some(codec), None) => Some(Conversion::Decompress(codec)),
        (None, Some(codec)) => Some(Conversion::Compress(codec)),
        _ => None,
    }
}

fn run_convert_cmd(registry: &CodecRegistry, cfg: ConvertCfg) -> anyhow::Result<()> {
    let result = match conversion(registry, &cfg.input, &cfg.output) {
        Some(Conversion::Decompress(codec)) => {
            decompress_file(registry, codec, &cfg.input, &cfg.output, cfg.buffer_size)?
        }
        Some(Conversion::Compress(codec)) => {
            compress_file(registry, codec, &cfg.input, &cfg.output, cfg.buffer_size)?
        }
        None => {
            eprintln!("Not compression or decompression, nothing to do");
            return Ok(());
        }
    };
    eprintln!("{}", result.format_compression());
    Ok(())
}

fn run_benchmark_cmd(
    registry: &CodecRegistry,
    cfg: &CompressionCfg,
) -> anyhow::Result<BenchmarkResult> {
    let codec = cfg.algorithm.name();
    let mut input = open_input(&cfg.path)?;
    let mut buffered_input = Vec::new();
    input.read_to_end(&mut buffered_input)?;
    let input_len = buffered_input.len();
    let input = Cursor::new(buffered_input);

    let mut output = Cursor::new(Vec::<u8>::with_capacity(input_len));

    let c_perf = compress(registry, codec, input, &mut output, cfg.buffer_size)?;
    output.rewind()?;
    let d_perf = decompress(registry, codec, output, Discard::default(), cfg.buffer_size)?;
    let result = BenchmarkResult::new(cfg, c_perf, d_perf);
    println!("{}", result);
    Ok(result)
}

fn run_benchmark_many_cmd(registry: &CodecRegistry, cfg: BenchmarkManyCfg) -> anyhow::Result<()> {
    let mut results = Vec::new();

    for algorithm in cfg.algorithms {
        let run_cfg = CompressionCfg {
            path: cfg.path.clone(),
            algorithm,
            buffer_size: cfg.buffer_size,
        };
        results.push(run_benchmark_cmd(registry, &run_cfg)?);
    }

    if let Some(path) = cfg.report {
        let mut writer = csv::Writer::from_path(path)?;
        for result in results {
            writer.serialize(&result)?;
        }
        writer.flush()?;
    }

    Ok(())
}

fn open_input(path: &Path) -> Result<BufReader<File>, Error> {
    let file = File::open(path).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Could not open file {}: {}", path.display(), e),
        )
    })?;
    Ok(BufReader::new(file))
}

fn open_output(path: &Path) -> Result<BufWriter<File>, Error> {
    let file = File::create(path).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Could not create file {}: {}", path.display(), e),
        )
    })?;
    Ok(BufWriter::new(file))
}

/// `data.txt` becomes `data.txt.lz4`.
fn compressed_path(
    registry: &CodecRegistry,
    input_path: &Path,
    codec: &str,
) -> anyhow::Result<PathBuf> {
    let suffix = registry.extension_of(codec)?;
    let new_extension = match input_path.extension() {
        None => suffix.to_owned(),
        Some(ext) => format!("{}.{}", ext.to_string_lossy(), suffix),
    };
    Ok(input_path.with_extension(new_extension))
}

/// `data.txt.lz4` becomes `data.txt`; a file without the codec extension gets `.out` appended.
fn decompressed_path(
    registry: &CodecRegistry,
    input_path: &Path,
    codec: &str,
) -> anyhow::Result<PathBuf> {
    if registry.codec_by_file(input_path) == Some(registry.lookup(codec)?.name.as_str()) {
        return Ok(input_path.with_extension(""));
    }
    let mut name = input_path.as_os_str().to_owned();
    name.push(".out");
    Ok(PathBuf::from(name))
}

fn compress_file(
    registry: &CodecRegistry,
    codec: &str,
    input_path: &Path,
    output_path: &Path,
    buffer_size: usize,
) -> anyhow::Result<Measurement> {
    info!(input = %input_path.display(), output = %output_path.display(), codec, "compressing");
    let input = open_input(input_path)?;
    let output = open_output(output_path)?;
    compress(registry, codec, input, output, buffer_size)
}

fn decompress_file(
    registry: &CodecRegistry,
    codec: &str,
    input_path: &Path,
    output_path: &Path,
    buffer_size: usize,
) -> anyhow::Result<Measurement> {
    info!(input = %input_path.display(), output = %output_path.display(), codec, "decompressing");
    let input = open_input(input_path)?;
    let output = open_output(output_path)?;
    decompress(registry, codec, input, output, buffer_size)
}

fn compress<R: Read + Seek, W: Write + Seek>(
    registry: &CodecRegistry,
    codec: &str,
    input: R,
    output: W,
    buffer_size: usize,
) -> anyhow::Result<Measurement> {
    measure(input, output, |input, output| {
        let mut stream = registry.get_compression_stream(codec, &mut *output, buffer_size)?;
        io::copy(input, &mut stream)?;
        stream.close()?;
        Ok(())
    })
}

fn decompress<R: Read + Seek, W: Write + Seek>(
    registry: &CodecRegistry,
    codec: &str,
    input: R,
    output: W,
    buffer_size: usize,
) -> anyhow::Result<Measurement> {
    measure(input, output, |input, output| {
        let mut stream = registry.get_decompression_stream(codec, &mut *input, buffer_size)?;
        io::copy(&mut stream, output)?;
        stream.close();
        output.flush()?;
        Ok(())
    })
}

/// Measure performance of compression or decompression
fn measure<I: Seek, O: Seek, T>(
    mut input: I,
    mut output: O,
    mut process: impl FnMut(&mut I, &mut O) -> anyhow::Result<T>,
) -> anyhow::Result<Measurement> {
    let start_time = Instant::now();
    process(&mut input, &mut output)?;
    let end_time = Instant::now();
    let input_pos = input.stream_position()?;
    let output_pos = output.stream_position()?;

    Ok(Measurement {
        input_len: input_pos,
        output_len: output_pos,
        elapsed: end_time - start_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_direction_follows_extensions() {
        let registry = CodecRegistry::with_builtin();
        assert_eq!(
            conversion(&registry, Path::new("in.txt"), Path::new("out.lz4")),
            Some(Conversion::Compress("lz4"))
        );
        assert_eq!(
            conversion(&registry, Path::new("in.sz"), Path::new("out.txt")),
            Some(Conversion::Decompress("snappy"))
        );
    }

    #[test]
    fn convert_without_a_single_codec_extension_does_nothing() {
        let registry = CodecRegistry::with_builtin();
        assert_eq!(
            conversion(&registry, Path::new("in.txt"), Path::new("out.txt")),
            None
        );
        assert_eq!(
            conversion(&registry, Path::new("in.gz"), Path::new("out.zst")),
            None
        );
    }

    #[test]
    fn output_paths() {
        let registry = CodecRegistry::with_builtin();
        assert_eq!(
            compressed_path(&registry, Path::new("data.txt"), "lz4").unwrap(),
            PathBuf::from("data.txt.lz4")
        );
        assert_eq!(
            decompressed_path(&registry, Path::new("data.txt.lz4"), "lz4").unwrap(),
            PathBuf::from("data.txt")
        );
        assert_eq!(
            decompressed_path(&registry, Path::new("data.bin"), "lz4").unwrap(),
            PathBuf::from("data.bin.out")
        );
    }
}
