use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::plan::{Step, StepKind};
use crate::ui::icons::{CHECK, CROSS, FILE_NEW, FOLDER, SHELL};

/// Terminal UI for the create flow, rendered via `indicatif`.
///
/// Two bars are stacked vertically:
/// - Steps bar — tracks how many plan steps have completed
/// - Status bar — spinner with the current activity
///
/// Step lines are printed above the bars as they arrive, so the panel
/// reads like the step list of the editor UI.
pub struct StepsUi {
    multi: MultiProgress,
    steps_bar: ProgressBar,
    status_bar: ProgressBar,
}

impl StepsUi {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let steps_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let steps_bar = multi.add(ProgressBar::new(0));
        steps_bar.set_style(steps_style);
        steps_bar.set_prefix("Steps");

        let status_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(status_style);
        status_bar.set_prefix("     ");
        status_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            steps_bar,
            status_bar,
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.status_bar.set_message(message.into());
    }

    /// Announce new plan steps and grow the steps bar accordingly.
    pub fn steps_added(&self, steps: &[Step]) {
        self.steps_bar.inc_length(steps.len() as u64);
        for step in steps {
            let icon = match step.kind {
                StepKind::CreateFolder => FOLDER,
                StepKind::CreateFile => FILE_NEW,
                StepKind::RunCommand => SHELL,
            };
            self.println(format!("  {}{}", icon, step.title));
        }
    }

    pub fn step_completed(&self, title: &str) {
        self.steps_bar.inc(1);
        self.steps_bar.set_message(title.to_string());
    }

    pub fn step_failed(&self, title: &str, reason: &str) {
        self.steps_bar.inc(1);
        self.println(format!("  {}{} ({})", CROSS, title, reason));
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.multi.println(line.as_ref()).ok();
    }

    /// Clear the bars, leaving printed lines in place.
    pub fn finish(&self, message: &str) {
        self.status_bar.finish_and_clear();
        self.steps_bar.finish_and_clear();
        self.multi.println(format!("{}{}", CHECK, message)).ok();
    }
}

impl Default for StepsUi {
    fn default() -> Self {
        Self::new()
    }
}
