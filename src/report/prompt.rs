use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::Colorize;

use crate::account::{is_affirmative, ConfirmationGate};

/// Reads the answer from stdin. The prompt goes to stderr so JSON output stays clean.
pub struct ConsoleGate;

#[async_trait]
impl ConfirmationGate for ConsoleGate {
    async fn confirm(&self, prompt: &str) -> io::Result<bool> {
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || {
            let mut stderr = io::stderr();
            write!(stderr, "{}", prompt.yellow())?;
            stderr.flush()?;

            let mut answer = String::new();
            io::stdin().lock().read_line(&mut answer)?;
            Ok(is_affirmative(&answer))
        })
        .await
        .map_err(io::Error::other)?
    }
}
