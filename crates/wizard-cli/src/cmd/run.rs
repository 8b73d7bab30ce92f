use crate::output;
use crate::settings;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use uuid::Uuid;
use wizard_core::config::WizardConfig;
use wizard_core::io::OutputDir;
use wizard_core::{steps, Advance, Orchestrator, SessionStore, StepEvent, WizardError};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config: &WizardConfig, description: Option<String>) -> Result<()> {
    let completer = settings::completer(config)?;
    let wizard = Orchestrator::new(Arc::new(SessionStore::new()), completer)
        .with_max_tokens(config.max_tokens);
    let out_dir = OutputDir::new(&config.output_dir);
    let rt = Runtime::new()?;

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout().lock());
    drive(&wizard, &out_dir, &rt, &mut console, description)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Line-oriented prompt over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    out: W,
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    /// Accept, or retry after a failure.
    Proceed,
    Revise(String),
    Quit,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn decision(&mut self, failed: bool) -> io::Result<Choice> {
        output::review_menu(&mut self.out, failed)?;
        loop {
            let Some(choice) = self.ask("Your choice (1/2/3): ")? else {
                return Ok(Choice::Quit);
            };
            match choice.as_str() {
                "1" => return Ok(Choice::Proceed),
                "2" => loop {
                    let Some(feedback) = self.ask("Please provide your feedback: ")? else {
                        return Ok(Choice::Quit);
                    };
                    if !feedback.is_empty() {
                        return Ok(Choice::Revise(feedback));
                    }
                    writeln!(self.out, "Feedback cannot be empty.")?;
                },
                "3" => return Ok(Choice::Quit),
                _ => writeln!(self.out, "Invalid choice. Please try again.")?,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard loop
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RunSummary {
    pub session_id: Uuid,
    pub completed: bool,
    pub document: PathBuf,
}

fn report_retry(event: StepEvent) {
    if let StepEvent::Retrying {
        attempt,
        max_retries,
        delay,
        error,
        ..
    } = event
    {
        eprintln!(
            "  retry {attempt}/{max_retries} in {:.1}s after: {error}",
            delay.as_secs_f64()
        );
    }
}

/// Walk one session through every step, asking after each one.
///
/// Each step's output is written as it arrives. The combined document is
/// written on completion and on quit.
pub fn drive<R: BufRead, W: Write>(
    wizard: &Orchestrator,
    out_dir: &OutputDir,
    rt: &Runtime,
    console: &mut Console<R, W>,
    description: Option<String>,
) -> Result<RunSummary> {
    let registry = steps::registry();
    output::banner(&mut console.out, registry)?;

    let description = match description {
        Some(d) => d,
        None => {
            writeln!(
                console.out,
                "Please provide a high-level description of the system you want to build:"
            )?;
            console.ask("System Description: ")?.unwrap_or_default()
        }
    };
    let session = wizard
        .start(&description)
        .context("cannot start the wizard")?;
    let id = session.id;

    let mut index = 0;
    let mut feedback: Option<String> = None;
    let completed = loop {
        let def = steps::step(index)?;
        output::step_header(&mut console.out, index, registry.len(), def.name)?;
        if feedback.is_some() {
            writeln!(console.out, "Regenerating with your feedback...")?;
        }
        writeln!(console.out, "{} is working...", def.prompt.agent)?;
        console.out.flush()?;

        let result = rt.block_on(wizard.execute_step(id, index, feedback.as_deref(), &report_retry));
        let failed = match result {
            Ok(outcome) => {
                output::step_output(&mut console.out, def.name, &outcome.output)?;
                let path = out_dir.write_step(index, def, &outcome.output)?;
                writeln!(console.out, "Saved to: {}", path.display())?;
                false
            }
            Err(e @ WizardError::StepFailed { .. }) => {
                writeln!(console.out, "error: {e}")?;
                true
            }
            Err(e) => return Err(e.into()),
        };

        match console.decision(failed)? {
            // Retrying repeats the same request, feedback included.
            Choice::Proceed if failed => {}
            Choice::Proceed => {
                feedback = None;
                match wizard.accept(id, index)? {
                    Advance::Next(next) => index = next,
                    Advance::Completed => break true,
                }
            }
            Choice::Revise(text) => {
                let plan = wizard.revise(id, index, &text)?;
                if plan.target != index {
                    writeln!(
                        console.out,
                        "Applying feedback to Step {}: {}",
                        plan.target + 1,
                        steps::step(plan.target)?.name
                    )?;
                }
                index = plan.target;
                feedback = Some(text);
            }
            Choice::Quit => {
                wizard.quit(id)?;
                break false;
            }
        }
    };

    let session = wizard.session(id)?;
    let document = out_dir.write_document(&session)?;
    writeln!(console.out)?;
    if completed {
        writeln!(console.out, "Wizard completed successfully!")?;
    } else {
        writeln!(console.out, "Wizard terminated by user.")?;
    }
    writeln!(
        console.out,
        "Complete documentation saved to: {}",
        document.display()
    )?;

    Ok(RunSummary {
        session_id: id,
        completed,
        document,
    })
}
