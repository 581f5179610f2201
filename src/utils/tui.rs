use std::future::Future;
use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap(),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Await `fut` behind a spinner, clearing it afterwards.
pub async fn with_spinner<T>(message: impl Into<String>, fut: impl Future<Output = T>) -> T {
    let spinner = create_spinner(message);
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

/// Whether prompts can be shown.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}
