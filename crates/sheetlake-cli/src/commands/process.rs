//! Process command - consolidate labeled schemas.

use colored::Colorize;
use sheetlake::Sheetlake;

pub fn run(lake: &Sheetlake, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = lake.process()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for path in &summary.outputs {
        println!("{} {}", "Wrote:".green(), path.display());
    }
    if !summary.outputs.is_empty() {
        println!();
    }

    println!("{}", "Processed run summary:".cyan().bold());
    println!("  Wrote:   {}", summary.wrote.to_string().green());
    println!("  Skipped: {}", summary.skipped.to_string().yellow());
    println!("  Failed:  {}", summary.failed.to_string().red());

    Ok(())
}
