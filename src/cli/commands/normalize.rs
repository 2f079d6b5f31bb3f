//! The `normalize` command.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use crate::normalize::{normalize_str, write_records, FailurePolicy, Normalized};

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Captured response files (reads stdin when none are given)
    pub files: Vec<PathBuf>,

    /// Write the records here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip entries that cannot be normalized instead of failing
    #[arg(long)]
    pub skip_invalid: bool,
}

impl NormalizeArgs {
    fn policy(&self) -> FailurePolicy {
        if self.skip_invalid {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }
}

/// Normalize every input document and merge the records in input order.
pub fn normalize_inputs(
    inputs: &[(String, String)],
    policy: FailurePolicy,
) -> anyhow::Result<Normalized> {
    let mut merged = Normalized::default();

    for (label, content) in inputs {
        let out = normalize_str(content, policy)
            .with_context(|| format!("Failed to normalize {}", label))?;
        info!("{}: {} records", label, out.records.len());
        merged.records.extend(out.records);
        merged.errors.extend(out.errors);
        merged.non_content += out.non_content;
    }

    Ok(merged)
}

fn read_inputs(files: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), content)]);
    }

    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.display().to_string(), content))
        })
        .collect()
}

fn write_output(output: Option<&Path>, normalized: &Normalized) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_records(&mut writer, &normalized.records)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write_records(&mut writer, &normalized.records)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Normalize captured responses.
pub fn cmd_normalize(args: NormalizeArgs) -> anyhow::Result<()> {
    let inputs = read_inputs(&args.files)?;
    let normalized = normalize_inputs(&inputs, args.policy())?;

    write_output(args.output.as_deref(), &normalized)?;

    if !normalized.errors.is_empty() {
        eprintln!(
            "{} Skipped {} invalid entries",
            style("!").yellow(),
            normalized.errors.len()
        );
    }
    if let Some(path) = &args.output {
        eprintln!(
            "{} Wrote {} records to {}",
            style("✓").green(),
            normalized.records.len(),
            path.display()
        );
    }

    Ok(())
}
