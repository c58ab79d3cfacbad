//! Interactive compartment selection

use alarm_lib::CompartmentMap;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Show the available compartments and read the operator's choice
pub fn prompt_compartment<R: BufRead, W: Write>(
    compartments: &CompartmentMap,
    mut input: R,
    mut output: W,
) -> Result<String> {
    writeln!(output)?;
    writeln!(output, "{}", "Available compartments".bold())?;
    writeln!(output, "{}", "-".repeat(50))?;
    for name in compartments.keys() {
        writeln!(output, "  {}", name.cyan())?;
    }
    writeln!(output)?;
    write!(output, "Write the compartment name you require: ")?;
    output.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("Failed to read compartment name")?;
    if read == 0 {
        bail!("No compartment name given");
    }

    Ok(line.trim().to_string())
}
