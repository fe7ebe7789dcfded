use std::io::Write;

use serde::Serialize;
use tracing::{
  info,
  instrument
};

use super::{
  first_arg,
  parse_task_key
};
use crate::habit::Habit;
use crate::session::Session;
use crate::task::Task;

const HELP: &[(&str, &str)] = &[
  (
    "add NAME [mods..]",
    "add a task (pri: tag: status: due: \
     note: attach:)"
  ),
  ("list", "show all tasks"),
  ("info N", "show one task in full"),
  (
    "modify N [mods..]",
    "change fields right away"
  ),
  (
    "edit N [mods..]",
    "start or extend an edit draft"
  ),
  ("save N", "apply the edit draft"),
  ("cancel N", "drop the edit draft"),
  ("done N", "mark a task completed"),
  ("start N", "mark a task in progress"),
  ("status N STATUS", "set any status"),
  ("note N [TEXT..]", "set or clear the note"),
  ("attach N PATH", "attach a file"),
  ("detach N", "remove the attachment"),
  ("remove N", "delete a task"),
  (
    "habit NAME [freq:..] [start:..]",
    "track a habit"
  ),
  ("habits", "show all habits"),
  ("check N", "mark a habit completed"),
  ("progress", "completed vs total tasks"),
  (
    "warnings",
    "re-check deadlines and send reminders"
  ),
  (
    "analytics",
    "tasks by priority and by tag"
  ),
  ("tags", "tags in use"),
  ("export", "dump tasks and habits as JSON"),
  ("version", "print the version"),
  ("quit", "leave the session")
];

#[derive(Serialize)]
struct Export<'a> {
  tasks:  &'a [Task],
  habits: &'a [Habit]
}

#[instrument(skip(session))]
pub(super) fn cmd_list<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  info!("command list");

  let today = session.today();
  session.renderer.print_task_table(
    &mut session.out,
    session.store.tasks(),
    &session.edits,
    today
  )
}

#[instrument(skip(session, args))]
pub(super) fn cmd_info<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args, "info N"
  )?)?;
  let index =
    session.store.position(key)?;
  let task = &session.store.tasks()[index];
  session.renderer.print_task_info(
    &mut session.out,
    index,
    task,
    session.edits.draft(task.id)
  )
}

#[instrument(skip(session))]
pub(super) fn cmd_progress<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  let progress =
    session.store.compute_progress();
  session
    .renderer
    .print_progress(&mut session.out, progress)
}

#[instrument(skip(session))]
pub(super) fn cmd_warnings<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  info!("command warnings");

  let today = session.today();
  if session
    .store
    .compute_deadline_warnings(today)
    .is_empty()
  {
    writeln!(
      session.out,
      "No deadlines within {} days.",
      session.store.warning_days()
    )?;
    return Ok(());
  }

  session.refresh()?;
  Ok(())
}

#[instrument(skip(session))]
pub(super) fn cmd_analytics<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  let analytics =
    session.store.compute_analytics();
  session
    .renderer
    .print_analytics(&mut session.out, &analytics)
}

#[instrument(skip(session))]
pub(super) fn cmd_tags<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  let tags = session.store.tags();
  if tags.is_empty() {
    writeln!(
      session.out,
      "No tags in use."
    )?;
    return Ok(());
  }

  for tag in tags {
    writeln!(session.out, "{tag}")?;
  }
  Ok(())
}

#[instrument(skip(session))]
pub(super) fn cmd_export<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  info!("command export");

  let export = Export {
    tasks:  session.store.tasks(),
    habits: session.store.habits()
  };
  let out =
    serde_json::to_string_pretty(&export)?;
  writeln!(session.out, "{out}")?;
  Ok(())
}

pub(super) fn cmd_help<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  let width = HELP
    .iter()
    .map(|(usage, _)| usage.len())
    .max()
    .unwrap_or(0);
  for (usage, about) in HELP {
    writeln!(
      session.out,
      "  {usage:<width$}  {about}"
    )?;
  }
  writeln!(
    session.out,
    "Positions start at 1. Commands \
     may be abbreviated."
  )?;
  writeln!(
    session.out,
    "Words after `--` are part of the \
     name, even if they look like \
     key:value."
  )?;
  Ok(())
}
