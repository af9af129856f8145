use anyhow::Result;
use colored::*;

use lectern::agents::chat;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, query: &str) -> Result<()> {
    let config = super::load_config(global)?;
    let ctx = super::agent_context(&config)?;
    let answer = chat::answer(&ctx, &super::request(global, query)?)?;

    if global.json {
        return super::print_json(&answer);
    }

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!("\n{}", "Sources:".bright_black());
        for source in &answer.sources {
            println!("  • {}", source.bright_black());
        }
    }
    Ok(())
}
