use anyhow::Result;
use colored::*;

use lectern::agents::knowledge;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs) -> Result<()> {
    let config = super::load_config(global)?;
    let retriever = super::open_retriever(&config)?;
    let listing = knowledge::list(&retriever, global.owner.as_deref(), super::role(global)?)?;

    if global.json {
        return super::print_json(&listing);
    }

    if listing.is_empty() {
        println!("No documents in the knowledge base.");
        return Ok(());
    }

    for (owner, sources) in &listing {
        println!("{}", owner.bright_cyan().bold());
        for source in sources {
            println!("  • {}", source);
        }
    }
    Ok(())
}
