//! `delve shell` -- line-oriented interactive research session.
//!
//! One in-memory store lives for the whole session, so `list` and
//! `continue` see every run made since the shell started.

use std::io::{self, BufRead, Write};
use std::path::Path;

use delve_core::UploadedFile;
use tokio::runtime::Runtime;

use crate::desk::{ResearchDesk, Submission};
use crate::render::{print_history, print_record};
use crate::OutputFormat;

/// Session-local selections that persist between commands.
#[derive(Default)]
struct ShellState {
    parent_id: Option<String>,
    upload: Option<UploadedFile>,
}

pub(crate) fn run_shell(
    desk: &ResearchDesk,
    runtime: &Runtime,
    input: impl BufRead,
    output: OutputFormat,
    quiet: bool,
) {
    if !quiet {
        println!("delve research shell (agent: {})", desk.engine().agent_name());
        println!("  Commands: run, attach, detach, continue, fresh, list, show, help, quit");
        println!();
    }

    let mut state = ShellState::default();
    let mut reader = input;
    let mut line = String::new();

    loop {
        print!("delve> ");
        if io::stdout().flush().is_err() {
            break;
        }

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("error reading input: {}", e);
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (cmd, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (trimmed.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "help" => print_help(),
            "run" => {
                if rest.is_empty() {
                    eprintln!("usage: run <query>");
                    continue;
                }
                run_query(desk, runtime, &state, rest, output);
            }
            "attach" => {
                if rest.is_empty() {
                    eprintln!("usage: attach <path to .txt or .pdf>");
                    continue;
                }
                match attach(Path::new(rest)) {
                    Ok(file) => {
                        println!("  attached {} ({} bytes)", file.name, file.bytes.len());
                        state.upload = Some(file);
                    }
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "detach" => match state.upload.take() {
                Some(file) => println!("  detached {}", file.name),
                None => eprintln!("  no file attached"),
            },
            "continue" => {
                if rest.is_empty() {
                    eprintln!("usage: continue <research id>");
                    continue;
                }
                match runtime.block_on(desk.get(rest)) {
                    Ok(Some(record)) => {
                        runtime.block_on(desk.clear_active());
                        println!("  continuing from {} ({})", record.id, record.query);
                        state.parent_id = Some(record.id);
                    }
                    Ok(None) => eprintln!("  no research with id {rest}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "fresh" => {
                state.parent_id = None;
                runtime.block_on(desk.clear_active());
                println!("  starting fresh");
            }
            "list" | "ls" => match runtime.block_on(desk.history()) {
                Ok(entries) => {
                    if let Err(e) = print_history(&entries, output) {
                        eprintln!("error: {e}");
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            "show" => {
                let found = if rest.is_empty() {
                    runtime.block_on(desk.displayed(state.parent_id.as_deref()))
                } else {
                    runtime.block_on(desk.get(rest))
                };
                match found {
                    Ok(Some(record)) => {
                        if let Err(e) = print_record(&record, output) {
                            eprintln!("error: {e}");
                        }
                    }
                    Ok(None) => eprintln!("  nothing to show"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            "quit" | "exit" => break,
            _ => {
                eprintln!(
                    "unknown command: {}. Type 'help' for available commands.",
                    cmd
                );
            }
        }
    }
}

fn run_query(
    desk: &ResearchDesk,
    runtime: &Runtime,
    state: &ShellState,
    query: &str,
    output: OutputFormat,
) {
    let submission = Submission {
        query: query.to_string(),
        parent_id: state.parent_id.clone(),
        upload: state.upload.clone(),
    };

    let record = runtime.block_on(async {
        match desk.submit(submission).await {
            Ok(id) => desk.get(&id).await,
            Err(e) => Err(e),
        }
    });
    match record {
        Ok(Some(record)) => {
            if let Err(e) = print_record(&record, output) {
                eprintln!("error: {e}");
            }
        }
        Ok(None) => eprintln!("error: research record disappeared"),
        Err(e) => eprintln!("error: {e}"),
    }
}

/// Read a file for upload, refusing formats that cannot be extracted.
fn attach(path: &Path) -> anyhow::Result<UploadedFile> {
    let file = UploadedFile::from_path(path)?;
    if file.kind().is_none() {
        anyhow::bail!("unsupported file type '{}' (use .txt or .pdf)", file.name);
    }
    Ok(file)
}

fn print_help() {
    println!();
    println!("  help                 Show this help");
    println!("  run <query>          Run research (uses the attached file and selected parent)");
    println!("  attach <path>        Attach a .txt or .pdf file as context");
    println!("  detach               Remove the attached file");
    println!("  continue <id>        Continue from an earlier research run");
    println!("  fresh                Start fresh (no parent)");
    println!("  list                 List research history");
    println!("  show [id]            Show a research record (default: current)");
    println!("  quit                 Exit the shell");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(&path, b"x").unwrap();
        let err = attach(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported file type"));
    }

    #[test]
    fn attach_reads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.TXT");
        std::fs::write(&path, b"hello world").unwrap();
        let file = attach(&path).unwrap();
        assert_eq!(file.name, "notes.TXT");
        assert_eq!(file.bytes, b"hello world");
    }

    #[test]
    fn attach_missing_file_fails() {
        assert!(attach(Path::new("/definitely/not/here.txt")).is_err());
    }
}
