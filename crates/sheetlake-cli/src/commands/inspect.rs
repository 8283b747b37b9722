//! Inspect command - explain header detection for one file.

use std::path::PathBuf;

use colored::Colorize;
use sheetlake::Sheetlake;

pub fn run(lake: &Sheetlake, file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let inspection = lake.inspect(&file)?;
    let detection = &inspection.detection;
    let normalized: Vec<String> = inspection
        .headers
        .as_ref()
        .map(|h| h.normalized_headers.clone())
        .unwrap_or_default();

    if json_output {
        let out = serde_json::json!({
            "file": file.display().to_string(),
            "sheet_name": inspection.sheet_name,
            "preview_rows": inspection.preview_rows,
            "status": inspection.status().as_str(),
            "header_row_index": detection.header_row_index,
            "confidence": detection.confidence,
            "breakdown": detection.breakdown,
            "raw_headers": detection.raw_headers,
            "normalized_headers": normalized,
            "applied_aliases": inspection.headers.as_ref().map(|h| &h.applied_aliases),
            "schema_key": inspection.identity.as_ref().map(|i| i.key.as_str()),
            "schema_hash": inspection.identity.as_ref().map(|i| i.hash.as_str()),
            "label": inspection.label,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} {}", "Inspecting".cyan().bold(), file.display().to_string().white());
    println!(
        "Sheet: {}  (previewed {} rows)",
        inspection.sheet_name, inspection.preview_rows
    );
    println!();

    let b = &detection.breakdown;
    println!("{}", "Best candidate row:".yellow().bold());
    println!("  Non-empty density: {:.3}", b.nonempty_density);
    println!("  Text ratio:        {:.3}", b.text_ratio);
    println!("  Short ratio:       {:.3}", b.short_ratio);
    println!("  Unique ratio:      {:.3}", b.unique_ratio);
    println!("  Follow coherence:  {:.3}", b.follow_score);
    println!();

    let threshold = lake.config().header_detection.min_header_confidence;
    match detection.header_row_index {
        Some(idx) => println!(
            "Header row: {}  confidence {}",
            idx.to_string().green().bold(),
            format!("{:.3}", detection.confidence).green()
        ),
        None => println!(
            "Header row: {}  confidence {} below {:.3}",
            "none".red().bold(),
            format!("{:.3}", detection.confidence).red(),
            threshold
        ),
    }

    if !detection.raw_headers.is_empty() {
        println!();
        println!("{}", "Raw headers:".yellow().bold());
        println!("  {}", detection.raw_headers.join(", "));
    }
    if !normalized.is_empty() {
        println!("{}", "Normalized:".yellow().bold());
        println!("  {}", normalized.join(", ").dimmed());
    }
    if let Some(headers) = &inspection.headers {
        for (from, to) in &headers.applied_aliases {
            println!("  alias {} -> {}", from, to.green());
        }
    }

    if let Some(identity) = &inspection.identity {
        println!();
        println!("Schema key:  {}", identity.key);
        println!("Schema hash: {}", identity.hash.as_str().magenta());
        println!(
            "Label:       {}",
            inspection.label.as_deref().unwrap_or_default().white().bold()
        );
    }

    Ok(())
}
