mod habits;
mod modifiers;
mod task_ops;
mod views;

use std::io::Write;

use anyhow::anyhow;
use tracing::{
  debug,
  instrument
};
use uuid::Uuid;

use crate::cli::Invocation;
use crate::session::Session;
use crate::store::{
  HabitKey,
  TaskKey
};
use crate::task::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Quit
}

pub fn known_command_names()
-> Vec<&'static str> {
  vec![
    "add",
    "list",
    "info",
    "modify",
    "edit",
    "save",
    "cancel",
    "done",
    "start",
    "status",
    "note",
    "attach",
    "detach",
    "remove",
    "delete",
    "habit",
    "habits",
    "check",
    "progress",
    "warnings",
    "analytics",
    "tags",
    "export",
    "help",
    "version",
    "quit",
    "exit",
  ]
}

pub fn expand_command_abbrev<'a>(
  token: &'a str,
  known: &[&'a str]
) -> Option<&'a str> {
  if known.contains(&token) {
    return Some(token);
  }

  let mut matches = known
    .iter()
    .copied()
    .filter(|name| {
      name.starts_with(token)
    });
  let first = matches.next()?;
  if matches.next().is_some() {
    None
  } else {
    Some(first)
  }
}

/// Whether the session re-evaluates deadlines after `command`. Pure output
/// commands and the explicit `warnings` run are excluded.
pub fn refreshes_after(
  command: &str
) -> bool {
  !matches!(
    command,
    "warnings"
      | "export"
      | "help"
      | "version"
      | "quit"
      | "exit"
  )
}

#[instrument(skip(session, inv))]
pub fn dispatch<W: Write>(
  session: &mut Session<W>,
  inv: &Invocation
) -> anyhow::Result<Flow> {
  let args = inv.args.as_slice();
  debug!(
    command = %inv.command,
    args = ?inv.args,
    "dispatching command"
  );

  match inv.command.as_str() {
    | "add" => {
      task_ops::cmd_add(session, args)?
    }
    | "list" => {
      views::cmd_list(session)?
    }
    | "info" => {
      views::cmd_info(session, args)?
    }
    | "modify" => {
      task_ops::cmd_modify(
        session, args
      )?
    }
    | "edit" => {
      task_ops::cmd_edit(session, args)?
    }
    | "save" => {
      task_ops::cmd_save(session, args)?
    }
    | "cancel" => {
      task_ops::cmd_cancel(
        session, args
      )?
    }
    | "done" => {
      task_ops::cmd_set_status(
        session,
        args,
        Some(Status::Completed)
      )?
    }
    | "start" => {
      task_ops::cmd_set_status(
        session,
        args,
        Some(Status::InProgress)
      )?
    }
    | "status" => {
      task_ops::cmd_set_status(
        session, args, None
      )?
    }
    | "note" => {
      task_ops::cmd_note(session, args)?
    }
    | "attach" => {
      task_ops::cmd_attach(
        session, args
      )?
    }
    | "detach" => {
      task_ops::cmd_detach(
        session, args
      )?
    }
    | "remove" | "delete" => {
      task_ops::cmd_remove(
        session, args
      )?
    }
    | "habit" => {
      habits::cmd_habit(session, args)?
    }
    | "habits" => {
      habits::cmd_habits(session)?
    }
    | "check" => {
      habits::cmd_check(session, args)?
    }
    | "progress" => {
      views::cmd_progress(session)?
    }
    | "warnings" => {
      views::cmd_warnings(session)?
    }
    | "analytics" => {
      views::cmd_analytics(session)?
    }
    | "tags" => views::cmd_tags(session)?,
    | "export" => {
      views::cmd_export(session)?
    }
    | "help" => views::cmd_help(session)?,
    | "version" => {
      writeln!(
        session.out,
        "{}",
        env!("CARGO_PKG_VERSION")
      )?;
    }
    | "quit" | "exit" => {
      return Ok(Flow::Quit);
    }
    | other => {
      return Err(anyhow!(
        "unknown command: {other}"
      ));
    }
  }

  Ok(Flow::Continue)
}

/// Parses a 1-based position or a uuid.
pub(crate) fn parse_task_key(
  token: &str
) -> anyhow::Result<TaskKey> {
  parse_position(token)
    .map(|p| p.map_or_else(TaskKey::Id, TaskKey::Index))
}

pub(crate) fn parse_habit_key(
  token: &str
) -> anyhow::Result<HabitKey> {
  parse_position(token)
    .map(|p| p.map_or_else(HabitKey::Id, HabitKey::Index))
}

/// `Ok(Ok(index))` for a position, `Ok(Err(uuid))` for an id.
fn parse_position(
  token: &str
) -> anyhow::Result<Result<usize, Uuid>> {
  if let Ok(n) = token.parse::<usize>()
  {
    if n == 0 {
      return Err(anyhow!(
        "positions start at 1"
      ));
    }
    return Ok(Ok(n - 1));
  }

  Uuid::parse_str(token)
    .map(Err)
    .map_err(|_| {
      anyhow!(
        "expected a position or id, \
         got: {token}"
      )
    })
}

pub(crate) fn first_arg<'a>(
  args: &'a [String],
  usage: &str
) -> anyhow::Result<&'a str> {
  args
    .first()
    .map(String::as_str)
    .ok_or_else(|| {
      anyhow!("usage: {usage}")
    })
}
