//! Terminal rendering of progress updates.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::progress::{ProgressSink, StepStatus, UnifiedProgress};

use super::theme::PrereqTheme;

const BAR_TEMPLATE: &str = "{prefix} [{bar:30.magenta/dim}] {pos:>3}% {msg}";

/// Renders progress updates as one progress bar per step.
///
/// Non-interactive renderers draw no bars and print one line per finished
/// step instead, so piped output stays readable.
pub struct ProgressRenderer {
    theme: PrereqTheme,
    interactive: bool,
    bar: Option<(usize, ProgressBar)>,
    lines: Vec<String>,
}

impl ProgressRenderer {
    /// Draw bars on stderr if it is a terminal.
    pub fn new(theme: PrereqTheme) -> Self {
        let interactive = console::Term::stderr().is_term();
        Self::with_mode(theme, interactive)
    }

    pub fn with_mode(theme: PrereqTheme, interactive: bool) -> Self {
        Self {
            theme,
            interactive,
            bar: None,
            lines: Vec::new(),
        }
    }

    /// Lines printed for finished steps, in order.
    pub fn finished_lines(&self) -> &[String] {
        &self.lines
    }

    fn bar_for(&mut self, step_index: usize) -> &ProgressBar {
        if self.bar.as_ref().is_some_and(|(index, _)| *index != step_index) {
            if let Some((_, old)) = self.bar.take() {
                old.finish_and_clear();
            }
        }
        let (_, bar) = self.bar.get_or_insert_with(|| (step_index, step_bar()));
        bar
    }

    fn finish(&mut self, line: String) {
        if let Some((_, bar)) = self.bar.take() {
            bar.finish_and_clear();
        }
        if self.interactive {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
        self.lines.push(line);
    }
}

impl ProgressSink for ProgressRenderer {
    fn emit(&mut self, update: &UnifiedProgress) {
        if update.status.is_terminal() {
            let line = format_finished(&self.theme, update);
            self.finish(line);
            return;
        }
        if !self.interactive {
            return;
        }
        let prefix = format!(
            "{} {}",
            self.theme
                .format_counter(update.overall.step_index, update.overall.step_count),
            self.theme.info.apply_to(&update.overall.step_name)
        );
        let detail = update
            .command
            .as_ref()
            .map(|c| c.detail.clone())
            .unwrap_or_default();
        let bar = self.bar_for(update.overall.step_index);
        bar.set_prefix(prefix);
        bar.set_message(detail);
        bar.set_position(u64::from(update.step_percent));
    }
}

impl Drop for ProgressRenderer {
    fn drop(&mut self) {
        if let Some((_, bar)) = self.bar.take() {
            bar.abandon();
        }
    }
}

fn step_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

/// One-line summary of a terminal update.
pub fn format_finished(theme: &PrereqTheme, update: &UnifiedProgress) -> String {
    let counter = theme.format_counter(update.overall.step_index, update.overall.step_count);
    let name = &update.overall.step_name;
    let text = match update.status {
        StepStatus::Completed => theme.format_success(name),
        StepStatus::Skipped => theme.format_skipped(&format!("{} (nothing to run)", name)),
        StepStatus::Failed => theme.format_error(&format!(
            "{} (failed at {}%)",
            name, update.step_percent
        )),
        StepStatus::Pending | StepStatus::Running => format!("{} {}%", name, update.step_percent),
    };
    format!("{} {}", counter, text)
}
