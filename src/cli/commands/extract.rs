//! `edm extract` command - run the batch and update the output collection

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{load_config, load_reference, SourceArgs};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::collection::write_atomic;
use crate::core::{run_batch, BatchStats, DeviceCollection, DeviceReport, MergeKind, Outcome};

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Parse and report without writing any output
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the human-readable text export to FILE
    #[arg(long, value_name = "FILE")]
    pub text: Option<PathBuf>,
}

pub fn run(args: ExtractArgs, global: &GlobalOpts) -> Result<()> {
    let mut flags = args.sources.as_config();
    flags.text_output = args.text.clone();
    let config = load_config(global, flags)?;

    let table = load_reference(&config)?;
    let output = config.output();
    let mut collection = DeviceCollection::load(&output)?;
    let layout = config.layout();

    let chatty = !global.quiet && global.format != OutputFormat::Json;
    if chatty {
        println!(
            "{} Extracting devices from {}{}",
            style("→").blue(),
            style(layout.dietest.display()).yellow(),
            if args.dry_run { style(" (dry run)").dim().to_string() } else { String::new() }
        );
        println!();
    }

    let stats = run_batch(&layout, &table, &mut collection, |report| {
        if chatty {
            print_report(&report, global.verbose);
        }
    })?;

    if !args.dry_run {
        collection.save(&output)?;
        if let Some(text_path) = &config.text_output {
            write_atomic(text_path, &collection.render_text())?;
        }
    }

    match global.format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "processed": stats.processed,
                "skipped": stats.skipped,
                "new": stats.inserted,
                "updated": stats.updated,
                "stalled": stats.stalled,
                "output": output.display().to_string(),
                "written": !args.dry_run,
            });
            println!("{}", serde_json::to_string_pretty(&summary).unwrap_or_default());
        }
        _ if chatty => print_summary(&stats, &output, config.text_output.as_ref(), args.dry_run),
        _ => {}
    }

    Ok(())
}

fn print_report(report: &DeviceReport<'_>, verbose: bool) {
    match report {
        DeviceReport::Merged {
            device,
            kind,
            assembled,
        } => {
            let tag = match kind {
                MergeKind::Inserted => style("new").green(),
                MergeKind::Updated => style("updated").dim(),
            };
            println!(
                "{} {} ({}, {} modules)",
                style("✓").green(),
                style(device).cyan(),
                tag,
                assembled.record.modules.len()
            );
            if let Outcome::Stalled { cyclic, blocked } = &assembled.resolution.outcome {
                println!(
                    "    {} module order incomplete: cyclic [{}]",
                    style("!").yellow(),
                    cyclic.join(", ")
                );
                if verbose && !blocked.is_empty() {
                    println!("      blocked behind the cycle: [{}]", blocked.join(", "));
                }
            }
        }
        DeviceReport::Failed { device, error } => {
            eprintln!("{} {}: {}", style("✗").red(), style(device).cyan(), error);
        }
    }
}

fn print_summary(
    stats: &BatchStats,
    output: &std::path::Path,
    text_output: Option<&PathBuf>,
    dry_run: bool,
) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Extraction Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Devices processed: {}", style(stats.processed).cyan());
    println!("  New devices:       {}", style(stats.inserted).green());
    println!("  Updated devices:   {}", style(stats.updated).yellow());
    if stats.skipped > 0 {
        println!("  Skipped:           {}", style(stats.skipped).red());
    }
    if stats.stalled > 0 {
        println!("  Order incomplete:  {}", style(stats.stalled).yellow());
    }

    println!();
    if dry_run {
        println!("{}", style("Dry run complete. No files were written.").yellow());
    } else {
        println!("{} Wrote {}", style("✓").green(), style(output.display()).yellow());
        if let Some(text) = text_output {
            println!("{} Wrote {}", style("✓").green(), style(text.display()).yellow());
        }
    }
}
