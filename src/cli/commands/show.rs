//! `edm show` command - parse a single device without touching the collection

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_coord, load_config, load_reference, SourceArgs};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{assemble, DeviceCollection, Outcome};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Device identifier (file name in the DIETEST directory)
    pub device: String,

    #[command(flatten)]
    pub sources: SourceArgs,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global, args.sources.as_config())?;
    let table = load_reference(&config)?;
    let sources = config.layout().read(&args.device)?;
    let assembled = assemble(&sources, &table);
    let record = &assembled.record;

    match global.format {
        OutputFormat::Auto | OutputFormat::Json => {
            let json = serde_json::to_string_pretty(record).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            let mut single = DeviceCollection::new();
            single.merge(&args.device, record)?;
            print!("{}", single.render_text());
        }
        OutputFormat::Tsv => {
            for m in &record.modules {
                println!("{}\t{}\t{}", m.name, format_coord(m.x), format_coord(m.y));
            }
        }
    }

    if let Outcome::Stalled { cyclic, .. } = &assembled.resolution.outcome {
        if !global.quiet {
            eprintln!(
                "{} module order incomplete, cyclic dependencies: {}",
                style("!").yellow(),
                cyclic.join(", ")
            );
        }
    }

    Ok(())
}
