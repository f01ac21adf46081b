//! `edm devices` command - list devices in the output collection

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::load_config;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::query::list_devices;
use crate::core::{Config, DeviceCollection};

#[derive(clap::Args, Debug)]
pub struct DevicesArgs {
    /// Only devices with a non-empty module list
    #[arg(long)]
    pub with_modules: bool,

    /// Output collection (default: output.json)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: DevicesArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(
        global,
        Config {
            output: args.output.clone(),
            ..Default::default()
        },
    )?;
    let collection = DeviceCollection::load(&config.output())?;
    let devices = list_devices(&collection, args.with_modules);

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "devices": devices });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for d in &devices {
                println!("{}\t{}", d.name, d.prb.as_deref().unwrap_or(""));
            }
        }
        OutputFormat::Auto | OutputFormat::Text => {
            if devices.is_empty() {
                if !global.quiet {
                    println!("No devices found.");
                }
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["DEVICE", "PRB", "MODULES"]);
            for d in &devices {
                builder.push_record([
                    d.name.clone(),
                    d.prb.clone().unwrap_or_else(|| "-".to_string()),
                    d.module_count.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));

            if !global.quiet {
                println!();
                println!("{} device(s) found.", style(devices.len()).cyan());
            }
        }
    }

    Ok(())
}
