use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use lectern::agents::knowledge::{self, UploadReceipt};
use lectern::documents::{PlainTextExtractor, TextExtractor};
use lectern::Error;

use crate::GlobalArgs;

pub fn execute(global: &GlobalArgs, path: &Path, system: bool, rebuild: bool) -> Result<()> {
    let owner = ingest_owner(global.owner.as_deref(), system)?;
    let config = super::load_config(global)?;
    let adapter = super::open_adapter(&config)?;

    if rebuild {
        adapter.rebuild().context("Failed to rebuild collection")?;
    } else {
        adapter.create().context("Failed to open collection")?;
    }

    let extractor = PlainTextExtractor;
    let files = collect_files(path, &extractor)?;
    if files.is_empty() {
        anyhow::bail!("No .txt or .md files found at {}", path.display());
    }

    let mut receipts: Vec<UploadReceipt> = Vec::new();
    for file in &files {
        match knowledge::upload(&adapter, &extractor, file, owner) {
            Ok(receipt) => {
                if !global.json {
                    println!("  {} {}", "✓".green(), receipt.message());
                }
                receipts.push(receipt);
            }
            // One empty file should not stop a directory ingest
            Err(Error::EmptyDocument { source_name }) => {
                eprintln!("  {} skipped empty document {}", "!".yellow(), source_name);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to ingest {}", file.display()))
            }
        }
    }

    if global.json {
        return super::print_json(&receipts);
    }

    let chunks: usize = receipts.iter().map(|r| r.chunks).sum();
    println!(
        "{}",
        format!(
            "\nIngested {} file(s), {} chunk(s) into '{}'",
            receipts.len(),
            chunks,
            adapter.name()
        )
        .bright_cyan()
    );
    Ok(())
}

/// Exactly one of `--owner` and `--system` decides who owns the ingest
fn ingest_owner(owner: Option<&str>, system: bool) -> Result<Option<&str>> {
    match (owner, system) {
        (Some(_), true) => anyhow::bail!("--owner and --system are mutually exclusive"),
        (None, false) => anyhow::bail!(
            "pass --owner <id> for a private upload or --system for shared course material"
        ),
        (None, true) => Ok(None),
        (Some(owner), false) => Ok(Some(owner)),
    }
}

/// The file itself, or every supported file under a directory in path order
fn collect_files(path: &Path, extractor: &dyn TextExtractor) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file() && extractor.supports(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_owner_selection() {
        assert_eq!(ingest_owner(Some("alice"), false).unwrap(), Some("alice"));
        assert_eq!(ingest_owner(None, true).unwrap(), None);

        let err = ingest_owner(None, false).unwrap_err();
        assert!(err.to_string().contains("--system"));
        let err = ingest_owner(Some("alice"), true).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }
}
