//! Convert command - translate between MSB, PAR and JSON
//!
//! | from | to          |
//! |------|-------------|
//! | msb  | json, msb   |
//! | par  | json, par   |
//! | json | msb, par    |
//!
//! The output is rendered completely before anything is written, so a failed
//! conversion never leaves a partial file behind.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use melatools_core::msb::{self, Endian, MsbFormat, NumType, PhysicalRecord};
use melatools_core::par::{self, Par};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{FormatArgs, ToolConfig};

/// File types understood by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileType {
    /// MELA Standard Binary records (`.rsd`, `.msb`)
    Msb,
    /// Simulation definition text (`.par`)
    Par,
    /// JSON interchange form (`.json`)
    Json,
}

impl FileType {
    /// Guess the type from a file extension.
    pub fn infer(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(FileType::Json),
            "par" => Some(FileType::Par),
            "rsd" | "msb" => Some(FileType::Msb),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileType::Msb => "msb",
            FileType::Par => "par",
            FileType::Json => "json",
        })
    }
}

/// Arguments for the convert command
#[derive(Args)]
pub struct ConvertArgs {
    /// Input file, `-` for stdin
    pub input: PathBuf,

    /// Output file, `-` or omitted for stdout
    pub output: Option<PathBuf>,

    /// Input type (inferred from the extension when omitted)
    #[arg(short = 'f', long = "from", value_enum)]
    pub from: Option<FileType>,

    /// Output type (inferred from the extension; JSON on stdout)
    #[arg(short = 't', long = "to", value_enum)]
    pub to: Option<FileType>,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub out_format: OutFormatArgs,

    /// Column budget of written PAR lines
    #[arg(long)]
    pub line_width: Option<usize>,
}

/// Output-only MSB layout, for re-encoding between machine formats
#[derive(Args, Debug, Default, Clone)]
pub struct OutFormatArgs {
    /// Uid number type of the written MSB
    #[arg(long, value_name = "TYPE")]
    pub out_uid_type: Option<NumType>,

    /// Float number type of the written MSB
    #[arg(long, value_name = "TYPE")]
    pub out_float_type: Option<NumType>,

    /// Integer number type of the written MSB
    #[arg(long, value_name = "TYPE")]
    pub out_int_type: Option<NumType>,

    /// Byte order of the written MSB
    #[arg(long)]
    pub out_endian: Option<Endian>,
}

impl OutFormatArgs {
    fn as_format_args(&self) -> FormatArgs {
        FormatArgs {
            uid_type: self.out_uid_type,
            float_type: self.out_float_type,
            int_type: self.out_int_type,
            endian: self.out_endian,
        }
    }
}

/// A decoded input file
#[derive(Debug)]
pub enum Document {
    Msb(Vec<PhysicalRecord>),
    Par(Par),
    Json(serde_json::Value),
}

/// Settings resolved from the config file and flags
pub struct Settings {
    pub in_format: MsbFormat,
    pub out_format: MsbFormat,
    pub vocabulary: par::Vocabulary,
    pub line_width: usize,
}

impl Settings {
    pub fn resolve(config: &ToolConfig, args: &ConvertArgs) -> Result<Self> {
        let in_format = args.format.apply(config.msb)?;
        let out_format = args.out_format.as_format_args().apply(in_format)?;
        Ok(Self {
            in_format,
            out_format,
            vocabulary: config.vocabulary()?,
            line_width: args.line_width.unwrap_or(config.par.line_width),
        })
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_stdio(path) {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) if !is_stdio(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write stdout")?;
            stdout.flush().context("Failed to write stdout")
        }
    }
}

/// Decode `bytes` as a file of type `ty`.
pub fn decode(ty: FileType, bytes: &[u8], settings: &Settings) -> Result<Document> {
    match ty {
        FileType::Msb => {
            let records =
                msb::read_msb(bytes, settings.in_format).context("Failed to decode MSB input")?;
            debug!(records = records.len(), "decoded MSB");
            Ok(Document::Msb(records))
        }
        FileType::Par => {
            let text = std::str::from_utf8(bytes).context("PAR input is not UTF-8")?;
            let interpreted = par::parse_par(text, &settings.vocabulary)
                .context("Failed to interpret PAR input")?;
            if !interpreted.warnings.is_empty() {
                info!(
                    warnings = interpreted.warnings.len(),
                    "PAR input had skipped content"
                );
            }
            Ok(Document::Par(interpreted.par))
        }
        FileType::Json => {
            let value = serde_json::from_slice(bytes).context("Failed to parse JSON input")?;
            Ok(Document::Json(value))
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(value).context("Failed to render JSON")?;
    out.push(b'\n');
    Ok(out)
}

fn to_msb(records: &[PhysicalRecord], format: MsbFormat) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    msb::write_msb(&mut out, records, format).context("Failed to encode MSB")?;
    Ok(out)
}

fn to_par(par: &Par, settings: &Settings) -> Result<Vec<u8>> {
    let text = par
        .to_par_string(&settings.vocabulary, settings.line_width)
        .context("Failed to render PAR")?;
    Ok(text.into_bytes())
}

/// Render a decoded document as `to`.
pub fn render(doc: Document, to: FileType, settings: &Settings) -> Result<Vec<u8>> {
    match (doc, to) {
        (Document::Msb(records), FileType::Json) => to_json(&records),
        (Document::Msb(records), FileType::Msb) => to_msb(&records, settings.out_format),
        (Document::Par(par), FileType::Json) => to_json(&par),
        (Document::Par(par), FileType::Par) => to_par(&par, settings),
        (Document::Json(value), FileType::Msb) => {
            let records: Vec<PhysicalRecord> =
                serde_json::from_value(value).context("JSON input is not an MSB record list")?;
            to_msb(&records, settings.out_format)
        }
        (Document::Json(value), FileType::Par) => {
            let par = Par::from_json(value).context("JSON input is not a simulation definition")?;
            to_par(&par, settings)
        }
        (doc, to) => bail!("can't convert {} to {to}", doc.file_type()),
    }
}

impl Document {
    pub fn file_type(&self) -> FileType {
        match self {
            Document::Msb(_) => FileType::Msb,
            Document::Par(_) => FileType::Par,
            Document::Json(_) => FileType::Json,
        }
    }
}

/// Input type from the flag or the extension
pub fn input_type(path: &Path, flag: Option<FileType>) -> Result<FileType> {
    if let Some(ty) = flag {
        return Ok(ty);
    }
    if is_stdio(path) {
        bail!("--from is required when reading stdin");
    }
    FileType::infer(path)
        .with_context(|| format!("Cannot tell the type of {}; use --from", path.display()))
}

fn output_type(path: Option<&Path>, flag: Option<FileType>, from: FileType) -> Result<FileType> {
    if let Some(ty) = flag {
        return Ok(ty);
    }
    match path {
        Some(path) if !is_stdio(path) => FileType::infer(path)
            .with_context(|| format!("Cannot tell the type of {}; use --to", path.display())),
        _ if from == FileType::Json => bail!("--to is required to convert JSON to stdout"),
        _ => Ok(FileType::Json),
    }
}

/// Execute the convert command
pub fn execute(args: ConvertArgs, config: &ToolConfig) -> Result<()> {
    let settings = Settings::resolve(config, &args)?;
    let output = args.output.as_deref();
    let from = input_type(&args.input, args.from)?;
    let to = output_type(output, args.to, from)?;
    debug!(%from, %to, format = %settings.in_format, "converting");

    let bytes = read_input(&args.input)?;
    let doc = decode(from, &bytes, &settings)?;
    let rendered = render(doc, to, &settings)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;
    write_output(output, &rendered)
}
