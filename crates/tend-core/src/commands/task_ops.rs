use std::io::Write;
use std::path::Path;

use anyhow::anyhow;
use tracing::{
  info,
  instrument
};

use super::modifiers::{
  apply_edit_mods,
  apply_task_mods,
  parse_mods,
  parse_name_and_mods
};
use super::{
  first_arg,
  parse_task_key
};
use crate::attachment::Attachment;
use crate::editing::EditMode;
use crate::session::Session;
use crate::store::TaskKey;
use crate::task::{
  NewTask,
  Status
};

#[instrument(skip(session, args))]
pub(super) fn cmd_add<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command add");

  let today = session.today();
  let (name, mods) =
    parse_name_and_mods(args, today)?;

  let mut new = NewTask::new(name, today)
    .priority(
      session.settings.default_priority
    )
    .status(
      session.settings.default_status
    );
  let attach_path =
    apply_task_mods(&mut new, mods)?;
  if let Some(path) = attach_path {
    new.attachment =
      Some(Attachment::from_path(&path)?);
  }

  let handle =
    session.store.add_task(new)?;
  let task =
    session.store.task(handle.id)?;
  writeln!(
    session.out,
    "Task '{}' added! (#{})",
    task.name,
    handle.index + 1
  )?;
  Ok(())
}

/// Applies an edit straight to the store, keeping fields not named in
/// `args`.
#[instrument(skip(session, args))]
pub(super) fn cmd_modify<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command modify");

  let key = parse_task_key(first_arg(
    args,
    "modify N [name:..] [pri:..] \
     [tag:..] [status:..] [due:..]"
  )?)?;
  let mods =
    parse_mods(&args[1..], session.today())?;
  if mods.is_empty() {
    return Err(anyhow!(
      "modify: nothing to change"
    ));
  }

  ensure_viewing(session, key, "modify")?;

  let mut draft =
    session.store.task(key)?.edit_draft();
  apply_edit_mods(&mut draft, mods)?;
  let task =
    session.store.edit_task(key, draft)?;
  writeln!(
    session.out,
    "Task '{}' updated!",
    task.name
  )?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_edit<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args,
    "edit N [name:..] [pri:..] \
     [tag:..] [status:..] [due:..]"
  )?)?;
  let mods =
    parse_mods(&args[1..], session.today())?;

  let index =
    session.store.position(key)?;
  let task = &session.store.tasks()[index];

  let mut next = session
    .edits
    .draft(task.id)
    .cloned()
    .unwrap_or_else(|| task.edit_draft());
  apply_edit_mods(&mut next, mods)?;
  *session.edits.begin(task) = next;

  let task = &session.store.tasks()[index];
  session.renderer.print_task_info(
    &mut session.out,
    index,
    task,
    session.edits.draft(task.id)
  )?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_save<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args, "save N"
  )?)?;
  let id = session.store.task(key)?.id;
  if session.edits.draft(id).is_none() {
    return Err(anyhow!(
      "task {} is not being edited",
      args[0]
    ));
  }

  let index = session
    .edits
    .save(id, &mut session.store)?;
  let task = session.store.task(index)?;
  writeln!(
    session.out,
    "Task '{}' updated!",
    task.name
  )?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_cancel<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args, "cancel N"
  )?)?;
  let id = session.store.task(key)?.id;
  if session.edits.cancel(id) {
    writeln!(
      session.out,
      "Edit cancelled."
    )?;
  } else {
    writeln!(
      session.out,
      "Task {} is not being edited.",
      args[0]
    )?;
  }
  Ok(())
}

/// `done`/`start` pass a fixed status; `status N S` reads it from `args`.
#[instrument(skip(session, args))]
pub(super) fn cmd_set_status<W: Write>(
  session: &mut Session<W>,
  args: &[String],
  fixed: Option<Status>
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args,
    "done N | start N | status N \
     STATUS"
  )?)?;
  ensure_viewing(session, key, "status")?;

  let status = match fixed {
    | Some(status) => status,
    | None => {
      if args.len() < 2 {
        return Err(anyhow!(
          "usage: status N STATUS"
        ));
      }
      args[1..].join(" ").parse()?
    }
  };

  let task = session
    .store
    .set_status(key, status)?;
  let message = if status.is_completed()
  {
    format!(
      "Task '{}' marked as completed!",
      task.name
    )
  } else {
    format!(
      "Task '{}' is now {}.",
      task.name, status
    )
  };
  writeln!(session.out, "{message}")?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_note<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args, "note N [TEXT..]"
  )?)?;
  let note = args[1..].join(" ");
  let task =
    session.store.set_note(key, note)?;
  if task.note.is_empty() {
    writeln!(
      session.out,
      "Note cleared for '{}'.",
      task.name
    )?;
  } else {
    writeln!(
      session.out,
      "Note saved for '{}'.",
      task.name
    )?;
  }
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_attach<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  if args.len() != 2 {
    return Err(anyhow!(
      "usage: attach N PATH"
    ));
  }
  let key = parse_task_key(&args[0])?;
  // Resolve first so a bad position fails before any file is read.
  session.store.task(key)?;

  let attachment = Attachment::from_path(
    Path::new(&args[1])
  )?;
  let task = session
    .store
    .attach(key, Some(attachment))?;
  writeln!(
    session.out,
    "Attached to '{}'.",
    task.name
  )?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_detach<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_task_key(first_arg(
    args, "detach N"
  )?)?;
  let task =
    session.store.attach(key, None)?;
  writeln!(
    session.out,
    "Attachment removed from '{}'.",
    task.name
  )?;
  Ok(())
}

#[instrument(skip(session, args))]
pub(super) fn cmd_remove<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command remove");

  let key = parse_task_key(first_arg(
    args, "remove N"
  )?)?;
  let removed =
    session.store.remove_task(key)?;
  session.edits.forget(removed.id);
  writeln!(
    session.out,
    "Task '{}' removed!",
    removed.name
  )?;
  Ok(())
}

/// Fields covered by an open draft change only through that draft.
fn ensure_viewing<W: Write>(
  session: &Session<W>,
  key: TaskKey,
  command: &str
) -> anyhow::Result<()> {
  let index = session.store.position(key)?;
  let task = &session.store.tasks()[index];
  if session.edits.mode(task.id)
    == EditMode::Editing
  {
    return Err(anyhow!(
      "{command}: task {} is being \
       edited; use `edit {}` to change \
       it, then `save` or `cancel`",
      index + 1,
      index + 1
    ));
  }
  Ok(())
}
