//! User-facing collaborator
//!
//! The core only needs two things from a UI: a yes/no answer to "save
//! before closing?" and somewhere to show alerts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Ask whether unsaved changes to `filename` should be kept
    async fn confirm_save(&self, filename: &str) -> bool;

    /// Show a user-visible error
    fn alert(&self, message: &str);
}

/// Terminal prompt on stdin, alerts on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleInteraction;

#[async_trait]
impl UserInteraction for ConsoleInteraction {
    async fn confirm_save(&self, filename: &str) -> bool {
        let question = format!(
            "You have unsaved changes in {}. Do you want to save the document? [y/N] ",
            filename
        );

        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            stderr.write_all(question.as_bytes())?;
            stderr.flush()?;

            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(e)) => {
                tracing::warn!("Failed to read save confirmation: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("Save confirmation task failed: {}", e);
                false
            }
        }
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Non-interactive answer, for scripted runs
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer {
    pub save: bool,
}

#[async_trait]
impl UserInteraction for FixedAnswer {
    async fn confirm_save(&self, filename: &str) -> bool {
        tracing::info!(filename = %filename, save = self.save, "Answering save prompt");
        self.save
    }

    fn alert(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
