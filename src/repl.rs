use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::shell::{Command, Outcome, Shell, HELP};

/// Prompt printed before every line of input.
pub const PROMPT: &str = "=> ";

/// Line-mode loop: read a line, dispatch it, print what came back. Ends on
/// `quit` or end of input.
pub fn run_repl<R: BufRead, W: Write>(shell: &Shell, mut input: R, mut output: W) -> Result<()> {
    let mut line = String::new();

    loop {
        write!(output, "{PROMPT}").context("failed to write prompt")?;
        output.flush().context("failed to flush prompt")?;

        line.clear();
        let read = input.read_line(&mut line).context("failed to read input")?;
        if read == 0 {
            writeln!(output).context("failed to write output")?;
            return Ok(());
        }

        let outcome = match shell.dispatch(Command::parse(&line)) {
            Ok(outcome) => outcome,
            Err(err) => {
                writeln!(output, "error: {err:#}").context("failed to write output")?;
                continue;
            }
        };

        match outcome {
            Outcome::Quit => return Ok(()),
            Outcome::Nothing => {}
            Outcome::Rows(rows) => {
                for row in rows {
                    writeln!(output, "{row}").context("failed to write row")?;
                }
            }
            Outcome::Failed(err) => {
                writeln!(output, "error: {err}").context("failed to write output")?
            }
            Outcome::Refreshed { connected: true } => {
                writeln!(output, "connected").context("failed to write output")?
            }
            Outcome::Refreshed { connected: false } => {
                writeln!(output, "no database file; try .reset")
                    .context("failed to write output")?
            }
            Outcome::Reset => {
                writeln!(output, "database reset").context("failed to write output")?
            }
            Outcome::Help => writeln!(output, "{HELP}").context("failed to write output")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::Config;

    fn run(shell: &Shell, script: &str) -> String {
        let mut out = Vec::new();
        run_repl(shell, Cursor::new(script.as_bytes()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_rows_one_per_line_and_stops_at_quit() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Shell::new(Config::new(dir.path().join("aquarium.db")));

        let out = run(
            &shell,
            ".reset\nSELECT * FROM fish;\nquit\nSELECT 'never';\n",
        );

        assert_eq!(
            out,
            "=> database reset\n=> ('Sammy', 'shark', 1)\n('Jamie', 'cuttlefish', 7)\n=> "
        );
    }

    #[test]
    fn reports_missing_database_and_ends_on_eof() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Shell::new(Config::new(dir.path().join("aquarium.db")));

        let out = run(&shell, "SELECT * FROM fish;\n");

        assert!(out.starts_with("=> error: no database connection"));
        assert!(out.ends_with("=> \n"));
    }

    #[test]
    fn blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let shell = Shell::new(Config::new(dir.path().join("aquarium.db")));

        assert_eq!(run(&shell, "\n   \nquit\n"), "=> => => ");
    }
}
