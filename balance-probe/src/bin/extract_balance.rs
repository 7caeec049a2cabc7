use anyhow::{bail, Context, Result};
use balance_probe::{extract, observability};
use std::env;

/// Runs the balance extractor against a saved payment page.
fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: extract_balance <html_file_path>");
    }
    let file_path = &args[1];

    let markup = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read {file_path}"))?;

    let balance = extract::extract_balance(&markup)
        .with_context(|| format!("no balance in {file_path}"))?;
    println!("{balance}");

    Ok(())
}
