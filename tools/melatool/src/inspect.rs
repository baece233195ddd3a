//! Inspect command - one line per record of an MSB or PAR file

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use melatools_core::msb::{LogicalRecord, PhysicalRecord};
use melatools_core::par::{EventDef, Par};

use crate::config::{FormatArgs, ToolConfig};
use crate::convert::{self, Document, FileType, Settings};

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// MSB or PAR file, `-` for stdin
    pub input: PathBuf,

    /// Input type (inferred from the extension when omitted)
    #[arg(short = 'f', long = "from", value_enum)]
    pub from: Option<FileType>,

    #[command(flatten)]
    pub format: FormatArgs,
}

fn summarize_msb(records: &[PhysicalRecord]) -> String {
    let mut out = String::new();
    let logical: usize = records.iter().map(|r| r.records.len()).sum();
    let _ = writeln!(
        out,
        "{} physical records, {logical} logical records",
        records.len()
    );
    for physical in records {
        let _ = write!(out, "uid {}:", physical.uid);
        for record in &physical.records {
            match record {
                LogicalRecord::InitialData(data) => {
                    let _ = write!(out, " initial-data({} trees)", data.trees.len());
                }
                LogicalRecord::Opaque {
                    record_type,
                    values,
                } => {
                    let _ = write!(out, " type-{record_type}({} values)", values.len());
                }
            }
        }
        out.push('\n');
    }
    out
}

fn summarize_par(par: &Par) -> String {
    let mut out = String::new();
    if let Some(years) = &par.years {
        let _ = writeln!(out, "years: {years:?}");
    }
    if let Some(output) = &par.output {
        let _ = writeln!(out, "{output}");
    }
    if let Some(control) = &par.control {
        let _ = writeln!(out, "{control}");
    }
    for def in par.events() {
        match def {
            EventDef::Defaults(_) => out.push_str("event defaults\n"),
            EventDef::Event(ev) => {
                let dangling = ev
                    .attributes
                    .comparable_events
                    .iter()
                    .chain(&ev.attributes.feasible_predecessors)
                    .filter(|r| !r.is_resolved())
                    .count();
                let _ = write!(out, "event {} {}: {} calls", ev.id, ev.name, ev.calls.len());
                if dangling > 0 {
                    let _ = write!(out, ", {dangling} unresolved references");
                }
                out.push('\n');
            }
        }
    }
    for path in &par.includes {
        let _ = writeln!(out, "include {path}");
    }
    out
}

/// Execute the inspect command
pub fn execute(args: InspectArgs, config: &ToolConfig) -> Result<()> {
    let from = convert::input_type(&args.input, args.from)?;
    let format = args.format.apply(config.msb)?;
    let settings = Settings {
        in_format: format,
        out_format: format,
        vocabulary: config.vocabulary()?,
        line_width: config.par.line_width,
    };

    let bytes = convert::read_input(&args.input)?;
    let summary = match convert::decode(from, &bytes, &settings)? {
        Document::Msb(records) => summarize_msb(&records),
        Document::Par(par) => summarize_par(&par),
        Document::Json(_) => bail!("inspect reads MSB and PAR files only"),
    };
    print!("{summary}");
    Ok(())
}
