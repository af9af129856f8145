use anyhow::Result;
use colored::*;

use lectern::agents::rubric;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, query: &str) -> Result<()> {
    let config = super::load_config(global)?;
    let ctx = super::agent_context(&config)?;
    let generation = rubric::generate(&ctx, &super::request(global, query)?)?;

    if global.json {
        return super::print_json(&generation);
    }

    println!("{}", generation.message);
    if let Some(rubric) = &generation.rubric {
        println!("\n{}", rubric.title.bright_cyan().bold());
        for item in &rubric.items {
            println!(
                "  {} {}  {}",
                format!("{:>3}", item.weight).yellow(),
                item.criterion.bold(),
                item.description
            );
        }
    }
    Ok(())
}
