use serde::Serialize;
use std::io::{self, Write};
use wizard_core::steps::StepDefinition;

const RULE_WIDTH: usize = 80;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

// ---------------------------------------------------------------------------
// Wizard screens
// ---------------------------------------------------------------------------

pub fn banner(out: &mut impl Write, steps: &[StepDefinition]) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "  SDLC Wizard - Software Development Lifecycle")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;
    writeln!(out, "This wizard will guide you through:")?;
    writeln!(out)?;
    for (i, step) in steps.iter().enumerate() {
        writeln!(out, "  {}. {} ({})", i + 1, step.name, step.prompt.agent)?;
    }
    writeln!(out)
}

pub fn step_header(out: &mut impl Write, index: usize, total: usize, name: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "  Step {}/{}: {}", index + 1, total, name)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out)
}

pub fn step_output(out: &mut impl Write, title: &str, content: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "  {title}")?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out)?;
    writeln!(out, "{}", content.trim_end())?;
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// `failed` switches the first option from accept to retry.
pub fn review_menu(out: &mut impl Write, failed: bool) -> io::Result<()> {
    writeln!(out)?;
    if failed {
        writeln!(out, "The step failed. Options:")?;
        writeln!(out, "  1. Retry this step")?;
    } else {
        writeln!(out, "Please review the output above. Options:")?;
        writeln!(out, "  1. Accept and continue to next step")?;
    }
    writeln!(out, "  2. Request changes (provide feedback)")?;
    writeln!(out, "  3. Quit wizard")?;
    writeln!(out)
}
