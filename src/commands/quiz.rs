use anyhow::{Context, Result};
use colored::*;

use lectern::agents::quiz;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, query: &str) -> Result<()> {
    let config = super::load_config(global)?;
    let ctx = super::agent_context(&config)?;
    let generation = quiz::generate(&ctx, &super::request(global, query)?)
        .context("Failed to generate a valid quiz")?;

    if global.json {
        return super::print_json(&generation);
    }

    for (i, question) in generation.questions.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{}.", i + 1).bold(),
            question.stem,
            format!("[{}]", question.difficulty).bright_black()
        );
        for (label, option) in ('A'..='Z').zip(&question.options) {
            println!("   {}. {}", label, option);
        }
        println!("   {} {}", "Answer:".green(), question.answer);
        println!("   {} {}\n", "Analysis:".bright_black(), question.analysis);
    }
    if !generation.sources.is_empty() {
        println!("{} {}", "Sources:".bright_black(), generation.sources.join(", "));
    }
    Ok(())
}
