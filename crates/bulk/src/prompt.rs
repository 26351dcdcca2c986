use std::io::{self, BufRead, Write};

pub const UPDATE_QUESTION: &str = "Update incident status [yN]? ";

/// Asks the operator to approve a single change.
pub trait Confirm {
    /// Shows `preview`, asks `question` and returns whether the answer was yes.
    fn confirm(&mut self, preview: &str, question: &str) -> io::Result<bool>;
}

impl<T: Confirm + ?Sized> Confirm for &mut T {
    fn confirm(&mut self, preview: &str, question: &str) -> io::Result<bool> {
        (**self).confirm(preview, question)
    }
}

/// Only an explicit yes counts; an empty answer or EOF is a no.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
}

/// Interactive prompt on the process's stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, preview: &str, question: &str) -> io::Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        ask(&mut stdin.lock(), &mut stdout, preview, question)
    }
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    preview: &str,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{preview}{question}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    Ok(is_affirmative(&line))
}
