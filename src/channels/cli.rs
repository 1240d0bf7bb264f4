//! CLI channel — stdin/stdout REPL for local testing.
//!
//! Every non-empty line is a patient turn. The running conversation is
//! decided after each line. `/reset` clears the conversation, `/quit` exits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::triage::{Decision, DecisionEngine, Turn};

/// A simple CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    engine: Arc<DecisionEngine>,
}

impl CliChannel {
    pub fn new(engine: Arc<DecisionEngine>) -> Self {
        Self { engine }
    }

    /// Run until EOF or `/quit`.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();
        let mut turns: Vec<Turn> = Vec::new();

        eprint!("> ");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            match line {
                "" => {}
                "/quit" => break,
                "/reset" => {
                    turns.clear();
                    eprintln!("Conversation cleared.");
                }
                message => {
                    turns.push(Turn::patient(message));
                    let decision = self.engine.decide(&turns);
                    println!("\n{}\n", render(&decision));
                }
            }
            eprint!("> ");
        }

        Ok(())
    }
}

/// Human-readable rendering of a decision.
pub fn render(decision: &Decision) -> String {
    let mut out = format!(
        "Severity: {} ({})",
        decision.severity.level(),
        decision.severity
    );
    if decision.escalating {
        out.push_str(" [worsening]");
    }
    if !decision.keywords.is_empty() {
        out.push_str(&format!("\nMatched: {}", decision.keywords.join(", ")));
    }
    out.push_str(&format!("\n{}", decision.reasoning));
    out.push_str(&format!("\n{}", decision.summary_message));
    for action in &decision.actions {
        out.push_str(&format!("\n  [{}] {}", action.urgency, action.title));
        if action.requires_auth {
            out.push_str(" (sign-in required)");
        }
    }
    out
}
