use std::io::{BufRead, Write};
use std::path::PathBuf;

use docchat_ai::chat::Answer;
use docchat_ai::session::DocChat;
use docchat_core::domain::LoadSummary;
use docchat_core::error::{AppError, ErrorKind};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Load(Vec<PathBuf>),
    Clear,
    Sources,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match parts.next().unwrap_or("") {
        "quit" | "exit" => Command::Quit,
        "clear" => Command::Clear,
        "sources" => Command::Sources,
        "help" => Command::Help,
        "load" => Command::Load(parts.map(PathBuf::from).collect()),
        other => Command::Unknown(other.to_string()),
    }
}

const HELP: &str = "\
Type a question to ask about the loaded documents.
  /load <paths...>  replace the document set
  /clear            forget the conversation so far
  /sources          show what was loaded
  /quit             exit";

/// Read commands from `input` until EOF or `/quit`.
pub fn run<R: BufRead, W: Write>(docchat: &DocChat, input: R, out: &mut W) -> std::io::Result<()> {
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            return Ok(());
        };
        let cmd = parse_line(&line?);
        debug!(?cmd, "repl command");

        match cmd {
            Command::Empty => {}
            Command::Quit => return Ok(()),
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Clear => {
                docchat.clear_history();
                writeln!(out, "Conversation cleared.")?;
            }
            Command::Sources => match docchat.active() {
                Some(s) => print_summary(out, s.load_summary(), s.chunk_count())?,
                None => writeln!(out, "No documents loaded.")?,
            },
            Command::Load(paths) if paths.is_empty() => writeln!(out, "usage: /load <paths...>")?,
            Command::Load(paths) => match docchat.replace_session(&paths) {
                Ok(s) => print_summary(out, s.load_summary(), s.chunk_count())?,
                Err(e) => print_error(out, &e)?,
            },
            Command::Ask(question) => match docchat.ask(&question) {
                Ok(answer) => print_answer(out, &answer)?,
                Err(e) => print_error(out, &e)?,
            },
            Command::Unknown(name) => writeln!(out, "unknown command /{name}; try /help")?,
        }
    }
}

pub fn print_summary<W: Write>(out: &mut W, summary: &LoadSummary, chunks: usize) -> std::io::Result<()> {
    writeln!(
        out,
        "Loaded {} document(s), {} characters, {} chunk(s).",
        summary.sources.len(),
        summary.total_chars,
        chunks
    )?;
    for s in &summary.sources {
        writeln!(out, "  + {s}")?;
    }
    for s in &summary.skipped {
        writeln!(out, "  - skipped {} ({})", s.path, s.reason)?;
    }
    for f in &summary.failures {
        writeln!(out, "  ! failed {}: {}", f.path, f.error.message)?;
    }
    Ok(())
}

fn print_answer<W: Write>(out: &mut W, answer: &Answer) -> std::io::Result<()> {
    writeln!(out, "{}", answer.text)?;
    if !answer.sources.is_empty() {
        writeln!(out, "Sources:")?;
    }
    for hit in &answer.sources {
        match hit.page {
            Some(p) => writeln!(out, "  {} p.{} ({:.3})", hit.source_path, p, hit.score)?,
            None => writeln!(out, "  {} @{} ({:.3})", hit.source_path, hit.offset, hit.score)?,
        }
    }
    if answer.dropped_turns > 0 {
        writeln!(
            out,
            "(oldest {} turn(s) left out to fit the prompt)",
            answer.dropped_turns
        )?;
    }
    Ok(())
}

fn print_error<W: Write>(out: &mut W, err: &AppError) -> std::io::Result<()> {
    let hint = match err.kind() {
        ErrorKind::Auth => " Check OPENAI_API_KEY.",
        ErrorKind::Transient => " Try again shortly.",
        _ => "",
    };
    writeln!(out, "error: {}{hint}", err.message)?;
    if let Some(d) = err.details.as_deref() {
        writeln!(out, "  {d}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_questions_and_commands() {
        assert_eq!(parse_line("  "), Command::Empty);
        assert_eq!(
            parse_line(" What is this? "),
            Command::Ask("What is this?".to_string())
        );
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/exit"), Command::Quit);
        assert_eq!(parse_line("/clear"), Command::Clear);
        assert_eq!(
            parse_line("/load a.pdf docs"),
            Command::Load(vec![PathBuf::from("a.pdf"), PathBuf::from("docs")])
        );
        assert_eq!(parse_line("/nope"), Command::Unknown("nope".to_string()));
    }

    #[test]
    fn summary_lists_every_outcome() {
        use docchat_core::domain::{LoadFailure, SkippedFile};

        let summary = LoadSummary {
            sources: vec!["a.txt".to_string()],
            total_chars: 12,
            skipped: vec![SkippedFile {
                path: "b.md".to_string(),
                reason: "unsupported extension".to_string(),
            }],
            failures: vec![LoadFailure {
                path: "c.pdf".to_string(),
                error: AppError::new("DOC_LOAD_FAILED", "Failed to parse PDF"),
            }],
        };
        let mut out = Vec::new();
        print_summary(&mut out, &summary, 3).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("1 document(s), 12 characters, 3 chunk(s)"));
        assert!(text.contains("skipped b.md"));
        assert!(text.contains("failed c.pdf: Failed to parse PDF"));
    }
}
