//! Interactive question loop.
//!
//! Reads one question per line, answers it, and repeats until the user types
//! [`QUIT_COMMAND`] (any case) or input ends. Question failures never end the loop; they
//! arrive here as answer text.

use std::io::{BufRead, Write};

use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
};
use tracing::{debug, info};

use crate::{api::ChatBackend, assistant::Assistant};

/// Typing this, in any case, ends the session.
pub const QUIT_COMMAND: &str = "quit";

/// `true` if `line` is the quit command.
pub fn is_quit(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']).eq_ignore_ascii_case(QUIT_COMMAND)
}

fn print_banner<W: Write>(output: &mut W, max_requests: u32, min_interval_secs: u64) -> std::io::Result<()> {
    writeln!(output, "\nThe assistant is ready! Ask your questions.")?;
    writeln!(output, "Type '{QUIT_COMMAND}' to exit.")?;
    writeln!(output, "Note: at most {max_requests} questions per minute.")?;
    writeln!(output, "Note: there is a {min_interval_secs} second pause between questions.")?;
    writeln!(output, "Note: if the token quota runs out, the assistant waits automatically.")
}

/// Runs the question loop over `input` and `output` until quit or end of input.
///
/// # Errors
/// Only I/O errors on `input` or `output`.
pub async fn interactive_mode<B, R, W>(
    assistant: &mut Assistant<B>,
    mut input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    B: ChatBackend,
    R: BufRead,
    W: Write,
{
    print_banner(
        output,
        assistant.limiter().max_requests(),
        assistant.limiter().min_interval().as_secs(),
    )?;

    loop {
        output.execute(Print("\nYour question: "))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            info!("End of input, leaving");
            break;
        }
        if is_quit(&line) {
            info!("Quit requested");
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        debug!("Asking question: {:?}", question);
        let answer = assistant.ask(question).await;

        output.execute(SetForegroundColor(Color::Blue))?;
        output.execute(SetAttribute(Attribute::Bold))?;
        output.execute(Print(format!("\nAnswer: {answer}\n")))?;
        output.execute(SetAttribute(Attribute::Reset))?;
        output.execute(SetForegroundColor(Color::Reset))?;
        output.flush()?;
    }

    Ok(())
}
