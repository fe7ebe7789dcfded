use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::analytics::{Analytics, Progress};
use crate::config::Settings;
use crate::datetime::format_date;
use crate::deadline::DeadlineReport;
use crate::editing::{EditMode, EditSessions};
use crate::habit::Habit;
use crate::task::{Priority, Task, TaskEdit};

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            color: settings.color && io::stdout().is_terminal(),
        }
    }

    /// Renderer that never emits escape codes.
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all, fields(count = tasks.len()))]
    pub fn print_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        edits: &EditSessions,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        if tasks.is_empty() {
            writeln!(out, "No tasks yet! Add one with `add NAME`.")?;
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "Name".to_string(),
            "Priority".to_string(),
            "Status".to_string(),
            "Deadline".to_string(),
            "Tag".to_string(),
            "File".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());
        for (idx, task) in tasks.iter().enumerate() {
            let position = self.paint(&(idx + 1).to_string(), "33");

            let mut name = task.name.clone();
            if edits.mode(task.id) == EditMode::Editing {
                name.push_str(" (editing)");
            }

            let deadline = format_date(task.deadline);
            let deadline = if !task.status.is_completed() && task.deadline < today {
                self.paint(&deadline, "31")
            } else {
                deadline
            };

            let priority = match task.priority {
                Priority::High => self.paint(task.priority.label(), "1"),
                _ => task.priority.to_string(),
            };

            let file = task
                .attachment
                .as_ref()
                .map(|a| a.file_name.clone())
                .unwrap_or_default();

            rows.push(vec![
                position,
                name,
                priority,
                task.status.to_string(),
                deadline,
                task.tag.clone(),
                file,
            ]);
        }

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_task_info<W: Write>(
        &self,
        out: &mut W,
        index: usize,
        task: &Task,
        draft: Option<&TaskEdit>,
    ) -> anyhow::Result<()> {
        writeln!(out, "position  {}", index + 1)?;
        writeln!(out, "id        {}", task.id)?;
        writeln!(out, "name      {}", task.name)?;
        writeln!(out, "priority  {}", task.priority)?;
        writeln!(out, "status    {}", task.status)?;
        writeln!(out, "deadline  {}", format_date(task.deadline))?;
        writeln!(out, "tag       {}", task.tag)?;
        if !task.note.is_empty() {
            writeln!(out, "note      {}", task.note)?;
        }
        if let Some(attachment) = &task.attachment {
            writeln!(
                out,
                "file      {} ({}, {} bytes)",
                attachment.file_name, attachment.kind, attachment.size
            )?;
        }

        if let Some(draft) = draft {
            writeln!(out, "editing   yes")?;
            writeln!(
                out,
                "draft     {} | {} | {} | {} | {}",
                draft.name,
                draft.priority,
                draft.status,
                format_date(draft.deadline),
                draft.tag
            )?;
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = habits.len()))]
    pub fn print_habits<W: Write>(&self, out: &mut W, habits: &[Habit]) -> anyhow::Result<()> {
        if habits.is_empty() {
            writeln!(out, "No habits added yet!")?;
            return Ok(());
        }

        let headers = vec![
            "#".to_string(),
            "Habit".to_string(),
            "Frequency".to_string(),
            "Start Date".to_string(),
            "Done".to_string(),
        ];

        let rows = habits
            .iter()
            .enumerate()
            .map(|(idx, habit)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    habit.name.clone(),
                    habit.frequency.to_string(),
                    format_date(habit.start_date),
                    if habit.completed {
                        self.paint("yes", "32")
                    } else {
                        "no".to_string()
                    },
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_progress<W: Write>(&self, out: &mut W, progress: Progress) -> anyhow::Result<()> {
        let Some(fraction) = progress.fraction() else {
            writeln!(out, "No tasks to track yet.")?;
            return Ok(());
        };

        let filled = (fraction * BAR_WIDTH as f64).round() as usize;
        writeln!(
            out,
            "[{}{}] {:.0}%",
            self.paint(&"#".repeat(filled), "32"),
            ".".repeat(BAR_WIDTH - filled),
            fraction * 100.0
        )?;
        writeln!(
            out,
            "Completed {} out of {} tasks!",
            progress.completed, progress.total
        )?;
        Ok(())
    }

    pub fn print_warnings<W: Write>(
        &self,
        out: &mut W,
        report: &DeadlineReport,
    ) -> anyhow::Result<()> {
        for warning in &report.warnings {
            let line = format!(
                "Warning: task '{}' is due in {} days!",
                warning.name, warning.days_remaining
            );
            writeln!(out, "{}", self.paint(&line, "33"))?;
        }
        Ok(())
    }

    pub fn print_analytics<W: Write>(
        &self,
        out: &mut W,
        analytics: &Analytics,
    ) -> anyhow::Result<()> {
        if analytics.is_empty() {
            writeln!(out, "No tasks to analyze yet.")?;
            return Ok(());
        }

        writeln!(out, "Tasks by priority")?;
        let by_priority: Vec<(String, usize)> = analytics
            .by_priority
            .iter()
            .map(|(priority, count)| (priority.to_string(), *count))
            .collect();
        self.write_bars(out, &by_priority)?;

        writeln!(out)?;
        writeln!(out, "Tasks by tag")?;
        let by_tag: Vec<(String, usize)> = analytics
            .by_tag
            .iter()
            .map(|(tag, count)| {
                let label = if tag.is_empty() {
                    "(none)".to_string()
                } else {
                    tag.clone()
                };
                (label, *count)
            })
            .collect();
        self.write_bars(out, &by_tag)
    }

    fn write_bars<W: Write>(&self, out: &mut W, rows: &[(String, usize)]) -> anyhow::Result<()> {
        let label_width = rows
            .iter()
            .map(|(label, _)| UnicodeWidthStr::width(label.as_str()))
            .max()
            .unwrap_or(0);
        let max = rows.iter().map(|(_, count)| *count).max().unwrap_or(0).max(1);

        for (label, count) in rows {
            let len = (count * BAR_WIDTH).div_ceil(max);
            let padding = label_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
            writeln!(
                out,
                "  {}{} {} {}",
                label,
                " ".repeat(padding),
                self.paint(&"#".repeat(len), "36"),
                count
            )?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{Renderer, strip_ansi, write_table};
    use crate::analytics::Progress;

    #[test]
    fn table_pads_to_visible_width() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            vec!["#".to_string(), "Name".to_string()],
            vec![vec!["\x1b[33m10\x1b[0m".to_string(), "x".to_string()]],
        )
        .expect("write table");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "#  Name ");
        assert_eq!(lines[1], "-- ---- ");
        assert_eq!(strip_ansi(lines[2]), "10 x    ");
    }

    #[test]
    fn progress_bar_and_summary() {
        let mut out = Vec::new();
        Renderer::plain()
            .print_progress(
                &mut out,
                Progress {
                    completed: 3,
                    total: 4,
                },
            )
            .expect("print progress");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("75%"));
        assert!(text.contains("Completed 3 out of 4 tasks!"));
    }
}
