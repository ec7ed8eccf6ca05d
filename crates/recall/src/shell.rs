// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recall shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Each invocation is one session: on exit, Ctrl-C, SIGTERM or SIGHUP the
//! session closes, flushes active memory and prints a summary.

use std::sync::Arc;

use colored::Colorize;
use recall_agent::{
    CloseHandle, CloseSummary, MemoryStats, SessionManager, install_signal_handler,
};
use recall_config::RecallConfig;
use recall_core::{PluginAdapter, RecallError};
use recall_memory::verify_dimensions;
use recall_ollama::OllamaClient;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::startup::open_backend;

/// What the user typed, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Exit,
    Stats,
    Help,
    Empty,
    Say(String),
}

fn parse_input(line: &str) -> ShellCommand {
    match line.trim() {
        "" => ShellCommand::Empty,
        "exit" | "quit" | "q" | "/quit" | "/exit" => ShellCommand::Exit,
        "/stats" => ShellCommand::Stats,
        "/help" => ShellCommand::Help,
        other => ShellCommand::Say(other.to_string()),
    }
}

/// Events from the readline thread.
#[derive(Debug)]
enum InputEvent {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// Readline on a dedicated thread; one prompt per request.
struct LineReader {
    requests: std::sync::mpsc::Sender<()>,
    events: mpsc::Receiver<InputEvent>,
}

impl LineReader {
    fn spawn(prompt: String) -> Result<Self, RecallError> {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel(1);

        std::thread::Builder::new()
            .name("recall-readline".into())
            .spawn(move || {
                let mut rl = match DefaultEditor::new() {
                    Ok(rl) => rl,
                    Err(e) => {
                        let _ = event_tx.blocking_send(InputEvent::Failed(format!(
                            "failed to initialize readline: {e}"
                        )));
                        return;
                    }
                };
                while request_rx.recv().is_ok() {
                    let event = match rl.readline(&prompt) {
                        Ok(line) => {
                            let _ = rl.add_history_entry(line.as_str());
                            InputEvent::Line(line)
                        }
                        Err(ReadlineError::Interrupted) => InputEvent::Interrupted,
                        Err(ReadlineError::Eof) => InputEvent::Eof,
                        Err(e) => InputEvent::Failed(e.to_string()),
                    };
                    if event_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| RecallError::Internal(format!("failed to start input thread: {e}")))?;

        Ok(Self {
            requests: request_tx,
            events: event_rx,
        })
    }

    /// Prompt once and wait for the answer, or for a close request.
    async fn next(&mut self, close: &CloseHandle) -> Option<InputEvent> {
        self.requests.send(()).ok()?;
        tokio::select! {
            biased;
            _ = close.closed() => None,
            event = self.events.recv() => event,
        }
    }
}

/// Runs the `recall shell` interactive REPL.
pub async fn run_shell(config: RecallConfig) -> Result<(), RecallError> {
    let ollama = Arc::new(OllamaClient::new(&config)?);
    let backend = open_backend(&config).await?;

    // The null store never embeds, so there is nothing to probe.
    if backend.is_persistent() {
        verify_dimensions(ollama.as_ref(), &backend, config.embedding.dimensions).await?;
    }

    let close = CloseHandle::new();
    let signals = install_signal_handler(close.clone());
    let mut session =
        SessionManager::from_config(&config, backend.clone(), ollama.clone(), close.clone());
    info!(session_id = %session.id(), "shell session started");

    println!("{}", "recall shell".bold().green());
    println!(
        "Type {} to leave, {} for memory stats.\n",
        "exit".yellow(),
        "/stats".yellow()
    );

    let mut reader = LineReader::spawn(format!("{}> ", "you".green()))?;
    while let Some(event) = reader.next(&close).await {
        let line = match event {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted | InputEvent::Eof => break,
            InputEvent::Failed(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        match parse_input(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Exit => break,
            ShellCommand::Help => print_help(),
            ShellCommand::Stats => println!("{}", render_stats(&session.stats())),
            ShellCommand::Say(input) => {
                if !handle_turn(&mut session, ollama.as_ref(), &input).await {
                    break;
                }
            }
        }
    }

    let summary = session.close().await;
    println!("{}", render_summary(&summary).dimmed());

    if let Err(e) = backend.store().shutdown().await {
        warn!(error = %e, "vector store shutdown failed");
    }
    signals.abort();
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Run one turn and print the outcome. Returns false when the shell should stop.
async fn handle_turn(session: &mut SessionManager, ollama: &OllamaClient, input: &str) -> bool {
    match session.run_turn(ollama, input).await {
        Ok(turn) => {
            if turn.context.degraded.is_some() {
                eprintln!("{}", "(long-term memory unavailable for this turn)".dimmed());
            }
            println!("{} {}\n", "recall>".cyan().bold(), turn.reply);
            if !turn.spill.lost.is_empty() {
                eprintln!(
                    "{}",
                    format!(
                        "warning: {} message(s) could not be saved to long-term memory",
                        turn.spill.lost.len()
                    )
                    .yellow()
                );
            }
            true
        }
        Err(RecallError::Interrupted | RecallError::SessionClosed) => false,
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            true
        }
    }
}

fn print_help() {
    println!("  {}    leave the shell (also quit, q, /quit)", "exit".yellow());
    println!("  {}  show memory usage for this session", "/stats".yellow());
    println!("  {}   show this help", "/help".yellow());
}

fn render_stats(stats: &MemoryStats) -> String {
    let storage = if stats.persistent {
        "persistent"
    } else {
        "disabled"
    };
    format!(
        "session {} ({})\n  active memory: {}/{}\n  stored: {}  lost: {}  discarded: {}\n  long-term storage: {storage}",
        stats.session_id,
        stats.state,
        stats.active_messages,
        stats.active_limit,
        stats.stored,
        stats.lost,
        stats.discarded,
    )
}

fn render_summary(summary: &CloseSummary) -> String {
    let mut out = format!(
        "session {} closed: {} flushed",
        summary.session_id, summary.flushed
    );
    if summary.discarded > 0 {
        out.push_str(&format!(", {} discarded (persistence disabled)", summary.discarded));
    }
    if summary.lost_count() > 0 {
        out.push_str(&format!(", {} lost", summary.lost_count()));
        for lost in &summary.lost {
            out.push_str(&format!(
                "\n  lost {} ({}): {}",
                lost.message.id(),
                lost.message.role(),
                lost.cause
            ));
        }
    }
    out
}
