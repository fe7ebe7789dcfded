use std::io::{BufRead, Write};

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::commands::{self, Flow};
use crate::config::Settings;
use crate::datetime::local_today;
use crate::editing::EditSessions;
use crate::notify::{CommandNotifier, LogNotifier, Notifier, NullNotifier, dispatch_due_today};
use crate::render::Renderer;
use crate::store::TaskStore;

/// One interactive run: the store, view state and output live exactly as
/// long as this value.
pub struct Session<W: Write> {
    pub(crate) store: TaskStore,
    pub(crate) edits: EditSessions,
    pub(crate) settings: Settings,
    pub(crate) renderer: Renderer,
    pub(crate) notifier: Box<dyn Notifier>,
    pub(crate) out: W,
    today_override: Option<NaiveDate>,
}

impl<W: Write> Session<W> {
    pub fn new(settings: Settings, renderer: Renderer, notifier: Box<dyn Notifier>, out: W) -> Self {
        Self {
            store: TaskStore::with_warning_days(settings.warning_days),
            edits: EditSessions::new(),
            settings,
            renderer,
            notifier,
            out,
            today_override: None,
        }
    }

    /// Pins the evaluation date instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today_override.unwrap_or_else(local_today)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn edits(&self) -> &EditSessions {
        &self.edits
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs one command and, when it calls for it, a refresh.
    #[instrument(skip(self, inv), fields(command = %inv.command))]
    pub fn execute(&mut self, inv: Invocation) -> anyhow::Result<Flow> {
        let flow = commands::dispatch(self, &inv)?;
        if self.settings.refresh_auto && commands::refreshes_after(&inv.command) {
            self.refresh()?;
        }
        Ok(flow)
    }

    /// Parses and runs one line. Command errors are printed and the session
    /// continues; only output failures end it.
    pub fn execute_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        let result = Invocation::parse_line(line).and_then(|inv| match inv {
            Some(inv) => self.execute(inv),
            None => Ok(Flow::Continue),
        });

        match result {
            Ok(flow) => Ok(flow),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "command failed");
                writeln!(self.out, "error: {err:#}")?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Reads commands until EOF or `quit`. `prompt` is written before each
    /// line when set.
    #[instrument(skip(self, reader))]
    pub fn run<R: BufRead>(&mut self, reader: R, prompt: Option<&str>) -> anyhow::Result<()> {
        info!("session started");
        let mut lines = reader.lines();
        loop {
            if let Some(prompt) = prompt {
                write!(self.out, "{prompt}")?;
                self.out.flush()?;
            }

            let Some(line) = lines.next() else {
                debug!("end of input");
                break;
            };
            if self.execute_line(&line?)? == Flow::Quit {
                break;
            }
        }
        self.out.flush()?;
        info!(tasks = self.store.len(), habits = self.store.habit_count(), "session ended");
        Ok(())
    }

    /// Re-evaluates deadlines: prints warnings and sends due-today
    /// reminders. Runs again on every call, so reminders repeat.
    #[instrument(skip(self))]
    pub fn refresh(&mut self) -> anyhow::Result<usize> {
        let report = self.store.compute_deadline_warnings(self.today());
        self.renderer.print_warnings(&mut self.out, &report)?;
        let sent = dispatch_due_today(&report, self.notifier.as_ref(), self.settings.notify_timeout);
        debug!(warnings = report.warnings.len(), sent, "refreshed");
        Ok(sent)
    }
}

/// Picks the reminder sink described by `settings`.
pub fn notifier_from_settings(settings: &Settings) -> anyhow::Result<Box<dyn Notifier>> {
    if !settings.notify_enabled {
        return Ok(Box::new(NullNotifier));
    }
    match settings.notify_command.as_deref() {
        Some(line) => Ok(Box::new(CommandNotifier::from_command_line(line)?)),
        None => Ok(Box::new(LogNotifier)),
    }
}
