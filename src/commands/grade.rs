use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use lectern::agents::grading::{self, StudentDocument};
use lectern::extract::Rubric;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, files: &[PathBuf], rubric_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(global)?;
    let ctx = super::agent_context(&config)?;

    let rubric: Option<Rubric> = match rubric_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read rubric {}", path.display()))?;
            Some(serde_json::from_str(&raw).context("Rubric file is not a valid rubric")?)
        }
        None => None,
    };

    let documents = files
        .iter()
        .map(|path| {
            StudentDocument::load(&ctx, path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let report = grading::grade_batch(&ctx, &documents, rubric.as_ref())?;

    if global.json {
        return super::print_json(&report);
    }

    for result in &report.results {
        println!(
            "{} {} {}",
            format!("{:>6.1}", result.total_score).yellow(),
            result.student_name.bold(),
            format!("({})", result.filename).bright_black()
        );
        println!("       {}", result.feedback);
        for (criterion, value) in &result.details {
            println!("       {} {}", format!("{}:", criterion).bright_black(), value);
        }
    }
    println!(
        "\n{}",
        format!("Average score: {:.1}", report.average_score).bright_cyan()
    );
    Ok(())
}
