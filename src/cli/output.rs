//! CLI output formatting utilities.

use crate::content::{ContentBlock, ToolStatus};
use crate::session::{Message, Role};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a transcript message: role, local time, then its blocks.
    ///
    /// Tool calls are shown as one-line markers; only text is printed in full.
    pub fn message(message: &Message) {
        let time = message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M");
        let who = match message.role {
            Role::User => style("You").green().bold(),
            Role::Assistant => style("Tenki").cyan().bold(),
        };
        println!("{} {}", who, style(time).dim());

        for block in &message.content {
            Self::block(block);
        }
        println!();
    }

    /// Print a single content block.
    pub fn block(block: &ContentBlock) {
        match block {
            ContentBlock::Text { text } => println!("{}", text),
            ContentBlock::ToolUse { name, input, .. } => {
                println!(
                    "  {} {}",
                    style(format!("[{}]", name)).dim(),
                    style(preview(&input.to_string(), 60)).dim()
                );
            }
            ContentBlock::ToolResult { status, .. } => match status {
                ToolStatus::Success => println!("  {}", style("✓").green()),
                ToolStatus::Error => println!("  {}", style("✗").red()),
            },
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis.
fn preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        format!("{}...", content.chars().take(max_chars).collect::<String>())
    }
}
