//! TUI-less "say" command

use std::error::Error;

use crate::cli::bootstrap::{build_controller, Paths};
use crate::core::config::Config;
use crate::core::controller::{IgnoreReason, SubmitOutcome};
use crate::ui::markdown::render_markdown;
use crate::ui::theme::ThemeColor;

/// Plain-text rendering of a reply for stdout.
pub fn render_plain(content: &str, theme: ThemeColor) -> String {
    render_markdown(content, theme.style())
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sends `prompt` through the full pipeline in a fresh session. The exchange
/// is saved to history like any other session.
pub async fn run_say(
    prompt: Vec<String>,
    config: &Config,
    paths: &Paths,
    theme: ThemeColor,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: purrchat say <prompt>");
        std::process::exit(1);
    }

    let controller = build_controller(config, paths)?;
    match controller.submit(&prompt).await? {
        SubmitOutcome::Replied { used_index } => {
            let turns = controller.turns();
            let reply = turns.last().map(|turn| turn.content.as_str()).unwrap_or("");
            println!("{}", render_plain(reply, theme));
            eprintln!("(credential #{})", used_index + 1);
            Ok(())
        }
        SubmitOutcome::Failed(failure) => {
            eprintln!("❌ {failure}");
            for attempt in &failure.attempts {
                eprintln!("  • credential #{}: {}", attempt.index + 1, attempt.error);
            }
            std::process::exit(1);
        }
        SubmitOutcome::Ignored(IgnoreReason::EmptyInput | IgnoreReason::Busy) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rendering_drops_markup() {
        let text = render_plain("# Hi\n\n**bold** and `code`", ThemeColor::Yellow);
        assert_eq!(text, "Hi\n\nbold and code");
    }
}
