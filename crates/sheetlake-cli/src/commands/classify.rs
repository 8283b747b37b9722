//! Classify command - scan, classify and snapshot the lake.

use colored::Colorize;
use sheetlake::Sheetlake;

pub fn run(lake: &Sheetlake, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = lake.classify()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let title = if summary.dry_run {
        "Classification run (dry run)"
    } else {
        "Classification run"
    };
    println!("{} {}", title.cyan().bold(), summary.run_ts.white());
    println!();

    println!("{}", "Files:".yellow().bold());
    println!("  Total:          {}", summary.total_files.to_string().white());
    println!("  OK:             {}", summary.status_counts.ok.to_string().green());
    println!(
        "  Low confidence: {}",
        summary.status_counts.low_confidence.to_string().yellow()
    );
    println!(
        "  Unreadable:     {}",
        summary.status_counts.unreadable.to_string().red()
    );
    println!("  Schemas:        {}", summary.distinct_schemas.to_string().white());
    println!();

    println!("{}", "Copies:".yellow().bold());
    if summary.dry_run {
        println!("  Skipped (dry run): {}", summary.copy_counts.skipped_dry_run);
    } else {
        println!("  Copied:         {}", summary.copy_counts.copied.to_string().green());
        println!("  Already there:  {}", summary.copy_counts.skipped_exists);
        if summary.copy_counts.error > 0 {
            println!("  Errors:         {}", summary.copy_counts.error.to_string().red());
        }
    }
    println!();

    if !summary.unknown_schemas.is_empty() {
        println!(
            "{} {}",
            "Unknown schemas:".yellow().bold(),
            "(add to the label registry)".dimmed()
        );
        for hash in &summary.unknown_schemas {
            println!("  {}", hash.as_str().magenta());
        }
        println!();
    }

    println!("{}", "Artifacts:".yellow().bold());
    println!("  {}", summary.artifacts.catalog.display());
    println!("  {}", summary.artifacts.schema_registry.display());
    println!("  {}", summary.artifacts.manifest.display());

    Ok(())
}
