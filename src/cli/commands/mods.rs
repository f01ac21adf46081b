//! `edm mods` command - modules across selected devices

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_coord, load_config, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::query::{device_modules, module_sources};
use crate::core::{Config, DeviceCollection};

/// Widest device list shown in a table cell
const DEVICES_COLUMN_WIDTH: usize = 60;

#[derive(clap::Args, Debug)]
pub struct ModsArgs {
    /// Devices to collect modules from
    #[arg(required = true)]
    pub devices: Vec<String>,

    /// Print the ordered module list with coordinates (single device only)
    #[arg(long)]
    pub coords: bool,

    /// Output collection (default: output.json)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ModsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(
        global,
        Config {
            output: args.output.clone(),
            ..Default::default()
        },
    )?;
    let collection = DeviceCollection::load(&config.output())?;

    if args.coords {
        let [device] = args.devices.as_slice() else {
            return Err(miette::miette!("--coords takes exactly one device"));
        };
        return print_coords(&collection, device, global);
    }

    let mods = module_sources(&collection, &args.devices);

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "mods": mods,
                "selected_count": args.devices.len(),
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for m in &mods {
                println!("{}\t{}", m.name, m.devices.join(","));
            }
        }
        OutputFormat::Auto | OutputFormat::Text => {
            if mods.is_empty() {
                if !global.quiet {
                    println!("No modules found.");
                }
                return Ok(());
            }

            let mut builder = Builder::default();
            builder.push_record(["MODULE", "DEVICES"]);
            for m in &mods {
                builder.push_record([
                    m.name.clone(),
                    truncate_str(&m.devices.join(", "), DEVICES_COLUMN_WIDTH),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));

            if !global.quiet {
                println!();
                println!(
                    "{} module(s) across {} selected device(s).",
                    style(mods.len()).cyan(),
                    args.devices.len()
                );
            }
        }
    }

    Ok(())
}

fn print_coords(collection: &DeviceCollection, device: &str, global: &GlobalOpts) -> Result<()> {
    if !collection.contains(device) {
        return Err(miette::miette!("Device not found in collection: {}", device));
    }
    let modules = device_modules(collection, device);

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::json!({ "device": device, "mods": modules });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Tsv => {
            for m in &modules {
                println!("{}\t{}\t{}", m.name, format_coord(m.x), format_coord(m.y));
            }
        }
        OutputFormat::Auto | OutputFormat::Text => {
            let mut builder = Builder::default();
            builder.push_record(["#", "MODULE", "X (um)", "Y (um)"]);
            for (i, m) in modules.iter().enumerate() {
                builder.push_record([
                    (i + 1).to_string(),
                    m.name.clone(),
                    format_coord(m.x),
                    format_coord(m.y),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }

    Ok(())
}
