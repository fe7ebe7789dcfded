use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::deadline::{DeadlineEntry, DeadlineReport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const TIMEOUT_ENV_VAR: &str = "TEND_NOTIFY_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub timeout: Duration,
}

impl Notification {
    pub fn due_today(entry: &DeadlineEntry, timeout: Duration) -> Self {
        Self {
            title: format!("Reminder for task: {}", entry.name),
            message: "Your task is due today!".to_string(),
            timeout,
        }
    }
}

/// Fire-and-forget sink for reminders.
pub trait Notifier {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            title = %notification.title,
            message = %notification.message,
            timeout_secs = notification.timeout.as_secs(),
            "notification"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Runs an external program as `<program> [args..] <title> <message>`,
/// with the timeout in seconds exported as `TEND_NOTIFY_TIMEOUT`.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Splits a configured command line such as `notify-send -a tend` on
    /// whitespace.
    pub fn from_command_line(line: &str) -> anyhow::Result<Self> {
        let mut parts = line.split_whitespace().map(ToString::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("notify.command cannot be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Notifier for CommandNotifier {
    #[instrument(skip(self, notification), fields(program = %self.program))]
    fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        debug!(title = %notification.title, "running notify command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&notification.title)
            .arg(&notification.message)
            .env(TIMEOUT_ENV_VAR, notification.timeout.as_secs().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to run notify command {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if !stderr.is_empty() {
                warn!(stderr = %stderr, "notify command wrote stderr");
            }
            return Err(anyhow!(
                "notify command {} failed with status {}",
                self.program,
                output
                    .status
                    .code()
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ));
        }

        Ok(())
    }
}

/// Sends one reminder per due-today entry and returns how many went out.
/// A failing sink is logged and skipped; there is no retry.
#[instrument(skip(report, notifier))]
pub fn dispatch_due_today(
    report: &DeadlineReport,
    notifier: &dyn Notifier,
    timeout: Duration,
) -> usize {
    let mut sent = 0;
    for entry in &report.due_today {
        let notification = Notification::due_today(entry, timeout);
        match notifier.notify(&notification) {
            Ok(()) => sent += 1,
            Err(err) => warn!(task = %entry.name, error = %err, "notification failed"),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use anyhow::anyhow;
    use chrono::NaiveDate;

    use super::{CommandNotifier, Notification, Notifier, dispatch_due_today};
    use crate::deadline::DeadlineReport;
    use crate::task::{NewTask, Status, Task};

    #[derive(Default)]
    struct Recording {
        seen: RefCell<Vec<Notification>>,
    }

    impl Notifier for Recording {
        fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
            self.seen.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
            Err(anyhow!("no display"))
        }
    }

    fn report() -> DeadlineReport {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).expect("date");
        let tomorrow = NaiveDate::from_ymd_opt(2024, 1, 11).expect("date");
        let tasks = vec![
            Task::from_new(NewTask::new("essay", today)),
            Task::from_new(NewTask::new("lab report", tomorrow)),
            Task::from_new(NewTask::new("quiz", today).status(Status::Completed)),
        ];
        DeadlineReport::evaluate(&tasks, today, 2)
    }

    #[test]
    fn sends_one_reminder_per_due_today_entry() {
        let sink = Recording::default();
        let sent = dispatch_due_today(&report(), &sink, Duration::from_secs(10));
        assert_eq!(sent, 1);

        let seen = sink.seen.borrow();
        assert_eq!(seen[0].title, "Reminder for task: essay");
        assert_eq!(seen[0].message, "Your task is due today!");
        assert_eq!(seen[0].timeout, Duration::from_secs(10));
    }

    #[test]
    fn repeated_dispatch_repeats_reminders() {
        let sink = Recording::default();
        let report = report();
        dispatch_due_today(&report, &sink, Duration::from_secs(10));
        dispatch_due_today(&report, &sink, Duration::from_secs(10));
        assert_eq!(sink.seen.borrow().len(), 2);
    }

    #[test]
    fn failing_sink_is_not_counted() {
        assert_eq!(
            dispatch_due_today(&report(), &Failing, Duration::from_secs(10)),
            0
        );
    }

    #[test]
    fn command_line_must_name_a_program() {
        assert!(CommandNotifier::from_command_line("   ").is_err());
        let notifier =
            CommandNotifier::from_command_line("notify-send -a tend").expect("parse command");
        assert_eq!(notifier.program(), "notify-send");
    }

    #[cfg(unix)]
    #[test]
    fn command_exit_status_is_reported() {
        let notification = Notification {
            title: "t".to_string(),
            message: "m".to_string(),
            timeout: Duration::from_secs(1),
        };
        let ok = CommandNotifier::from_command_line("true").expect("parse command");
        assert!(ok.notify(&notification).is_ok());

        let failing = CommandNotifier::from_command_line("false").expect("parse command");
        assert!(failing.notify(&notification).is_err());
    }
}
