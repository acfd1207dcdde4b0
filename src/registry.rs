use crate::codec::{Algorithm, Decoder, Encoder};
use crate::decoder::BlockDecompressStream;
use crate::encoder::BlockCompressStream;
use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::io;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

pub type EncoderFactory = fn() -> io::Result<Box<dyn Encoder>>;
pub type DecoderFactory = fn() -> io::Result<Box<dyn Decoder>>;

/// Everything the registry needs to know about one codec.
#[derive(Clone, Debug)]
pub struct CodecSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub extensions: Vec<String>,
    pub encoder: EncoderFactory,
    pub decoder: DecoderFactory,
}

impl CodecSpec {
    pub fn new(name: &str, encoder: EncoderFactory, decoder: DecoderFactory) -> CodecSpec {
        CodecSpec {
            name: name.to_owned(),
            aliases: Vec::new(),
            extensions: Vec::new(),
            encoder,
            decoder,
        }
    }

    pub fn alias(mut self, alias: &str) -> CodecSpec {
        self.aliases.push(alias.to_owned());
        self
    }

    pub fn extension(mut self, ext: &str) -> CodecSpec {
        self.extensions.push(ext.trim_start_matches('.').to_owned());
        self
    }

    fn matches(&self, id: &str) -> bool {
        let suffix = id.strip_prefix('.').unwrap_or(id);
        self.name == id
            || self.aliases.iter().any(|a| a == id)
            || self.extensions.iter().any(|e| e == suffix)
    }
}

fn builtin(algorithm: Algorithm) -> CodecSpec {
    let (encoder, decoder): (EncoderFactory, DecoderFactory) = match algorithm {
        Algorithm::Copy => (|| Algorithm::Copy.encoder(), || Algorithm::Copy.decoder()),
        Algorithm::Lz4 => (|| Algorithm::Lz4.encoder(), || Algorithm::Lz4.decoder()),
        Algorithm::Zstd => (|| Algorithm::Zstd.encoder(), || Algorithm::Zstd.decoder()),
        Algorithm::Brotli => (|| Algorithm::Brotli.encoder(), || Algorithm::Brotli.decoder()),
        Algorithm::Snappy => (|| Algorithm::Snappy.encoder(), || Algorithm::Snappy.decoder()),
        Algorithm::Lzma => (|| Algorithm::Lzma.encoder(), || Algorithm::Lzma.decoder()),
        Algorithm::Lzav => (|| Algorithm::Lzav.encoder(), || Algorithm::Lzav.decoder()),
        Algorithm::Gzip => (|| Algorithm::Gzip.encoder(), || Algorithm::Gzip.decoder()),
    };
    let mut spec = CodecSpec::new(algorithm.name(), encoder, decoder);
    for alias in algorithm.aliases() {
        spec = spec.alias(alias);
    }
    for ext in algorithm.extensions() {
        spec = spec.extension(ext);
    }
    spec
}

/// Maps codec identifiers and file extensions to stream constructors.
///
/// Build one at startup and pass it by reference to whatever needs lookups.
#[derive(Clone, Debug, Default)]
pub struct CodecRegistry {
    codecs: Vec<CodecSpec>,
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn new() -> CodecRegistry {
        CodecRegistry::default()
    }

    /// A registry holding every [`Algorithm`] built into this crate.
    pub fn with_builtin() -> CodecRegistry {
        let mut registry = CodecRegistry::new();
        for algorithm in Algorithm::ALL {
            registry.register(builtin(algorithm));
        }
        registry
    }

    /// Adds a codec. A later registration under an existing name replaces it.
    pub fn register(&mut self, spec: CodecSpec) {
        debug!(name = %spec.name, "registering codec");
        self.codecs.retain(|c| c.name != spec.name);
        self.codecs.push(spec);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.codecs.iter().map(|c| c.name.as_str())
    }

    /// Resolves a name, an alias, or a bare extension such as `lz4` or `.gz`.
    pub fn lookup(&self, id: &str) -> Result<&CodecSpec> {
        self.codecs
            .iter()
            .find(|c| c.name == id)
            .or_else(|| self.codecs.iter().find(|c| c.matches(id)))
            .ok_or_else(|| Error::UnknownCodec(id.to_owned()))
    }

    pub fn get_compression_stream<W: Write>(
        &self,
        id: &str,
        sink: W,
        buffer_size_hint: usize,
    ) -> Result<BlockCompressStream<W>> {
        let codec = self.lookup(id)?;
        debug!(codec = %codec.name, "opening compression stream");
        BlockCompressStream::new((codec.encoder)()?, sink, buffer_size_hint)
    }

    pub fn get_decompression_stream<R: Read>(
        &self,
        id: &str,
        source: R,
        buffer_size_hint: usize,
    ) -> Result<BlockDecompressStream<R>> {
        let codec = self.lookup(id)?;
        debug!(codec = %codec.name, "opening decompression stream");
        BlockDecompressStream::new((codec.decoder)()?, source, buffer_size_hint)
    }

    /// Name of the codec whose extension `path` carries, or `None` for plain files.
    pub fn codec_by_file(&self, path: impl AsRef<Path>) -> Option<&str> {
        let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
        self.codecs
            .iter()
            .find(|c| c.extensions.iter().any(|e| e == ext))
            .map(|c| c.name.as_str())
    }

    /// Preferred file extension for a codec.
    pub fn extension_of(&self, id: &str) -> Result<&str> {
        let codec = self.lookup(id)?;
        Ok(codec.extensions.first().map(String::as_str).unwrap_or(codec.name.as_str()))
    }
}
