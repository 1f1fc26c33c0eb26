//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Longest status message shown next to the build bar
const MAX_MESSAGE_CHARS: usize = 60;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for image builds.
///
/// Parses `STEP N/M: <instruction>` (podman) and `Step N/M : <instruction>`
/// (docker) lines and displays an indicatif progress bar in interactive mode,
/// or plain text in CI.
pub struct BuildProgress {
    bar: Option<ProgressBar>,
}

impl BuildProgress {
    pub fn new(ctx: &UiContext, label: &str) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::default_bar()
                .template("  {spinner:.blue} Building {prefix}  {bar:20.blue/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(style);
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            println!("Building {}...", label);
            None
        };
        Self { bar }
    }

    /// Process a build output line
    pub fn on_line(&self, line: String) {
        if let Some((n, total, instruction)) = parse_step_line(&line) {
            if let Some(ref bar) = self.bar {
                bar.set_length(total);
                bar.set_position(n);
                bar.set_message(instruction.to_string());
            } else {
                println!("  STEP {}/{}: {}", n, total, instruction);
            }
        } else if let Some(ref bar) = self.bar {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !is_build_noise(trimmed) {
                bar.set_message(truncate(trimmed));
            }
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

fn truncate(line: &str) -> String {
    if line.chars().count() > MAX_MESSAGE_CHARS {
        let head: String = line.chars().take(MAX_MESSAGE_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        line.to_string()
    }
}

/// Engine bookkeeping lines that aren't useful to display
fn is_build_noise(line: &str) -> bool {
    line.starts_with("--->")
        || line.starts_with("-->")
        || line.starts_with("Removing intermediate")
        || line.starts_with("COMMIT")
        || line.starts_with("Sending build context")
}

/// Parse `STEP N/M: INSTRUCTION` or `Step N/M : INSTRUCTION`
fn parse_step_line(line: &str) -> Option<(u64, u64, &str)> {
    let rest = line
        .strip_prefix("STEP ")
        .or_else(|| line.strip_prefix("Step "))?;
    let slash = rest.find('/')?;
    let colon = rest.find(':')?;
    if colon <= slash {
        return None;
    }
    let n: u64 = rest[..slash].trim().parse().ok()?;
    let total: u64 = rest[slash + 1..colon].trim().parse().ok()?;
    let instruction = rest[colon + 1..].trim();
    Some((n, total, instruction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_non_interactive() {
        let ctx = UiContext::non_interactive();
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start("Checking image...");
        spinner.stop("Done");
        spinner.stop_error("Failed");
    }

    #[test]
    fn parse_podman_step() {
        let (n, m, instr) = parse_step_line("STEP 3/13: RUN chmod +x /tmp/install.sh").unwrap();
        assert_eq!((n, m), (3, 13));
        assert_eq!(instr, "RUN chmod +x /tmp/install.sh");
    }

    #[test]
    fn parse_docker_step() {
        let (n, m, instr) = parse_step_line("Step 1/8 : FROM alpine:3.20").unwrap();
        assert_eq!((n, m), (1, 8));
        assert_eq!(instr, "FROM alpine:3.20");
    }

    #[test]
    fn parse_step_line_not_a_step() {
        assert!(parse_step_line("---> abc123def").is_none());
        assert!(parse_step_line("Step x/y: nothing").is_none());
        assert!(parse_step_line("STEP 1: FROM a").is_none());
        assert!(parse_step_line("").is_none());
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate("short"), "short");
        let long = "ä".repeat(80);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_CHARS);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn build_progress_non_interactive() {
        let ctx = UiContext::non_interactive();
        let progress = BuildProgress::new(&ctx, "web");
        progress.on_line("STEP 1/2: FROM alpine:latest".to_string());
        progress.on_line("---> abc123".to_string());
        progress.on_line("Step 2/2 : COPY app.sh /opt/app/".to_string());
        progress.finish();
    }

    #[test]
    fn noise_filter() {
        assert!(is_build_noise("---> abc123def"));
        assert!(is_build_noise("--> Using cache abc123"));
        assert!(is_build_noise("Removing intermediate container abc123"));
        assert!(is_build_noise("COMMIT web:3ec05fad"));
        assert!(is_build_noise("Sending build context to Docker daemon  2.048kB"));
        assert!(!is_build_noise("fetch https://dl-cdn.alpinelinux.org"));
    }
}
