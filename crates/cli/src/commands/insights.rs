//! Narrative annotation command

use anyhow::{Context, Result};
use colored::Colorize;
use sizer_lib::{annotate, Annotation};
use std::path::Path;

use crate::output::{print_json, print_warning, OutputFormat};

/// Annotate the narrative in `file` and print the extracted fields
pub fn run(file: &Path, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let annotation = annotate(&text);

    match format {
        OutputFormat::Json => print_json(&annotation)?,
        OutputFormat::Table => print_annotation(&annotation),
    }
    Ok(())
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", title.bold());
    for item in items {
        println!("  • {}", item);
    }
    println!();
}

fn print_annotation(annotation: &Annotation) {
    match annotation {
        Annotation::Structured(fields) => {
            if let Some(workload_type) = fields.workload_type {
                println!("{} {:?}", "Workload type:".bold(), workload_type);
            }
            if let Some(complexity) = fields.complexity {
                println!("{} {:?}", "Complexity:".bold(), complexity);
            }
            println!();
            print_list("Recommendations", &fields.recommendations);
            print_list("Bottlenecks", &fields.bottlenecks);
            print_list("Risks", &fields.risks);
        }
        Annotation::RawTextOnly { .. } => {
            print_warning("No structured fields found; showing the summary only");
        }
    }

    println!("{}", "Summary".bold());
    println!("{}", annotation.summary());
}
