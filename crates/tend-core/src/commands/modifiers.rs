use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::instrument;

use crate::datetime::parse_date_expr;
use crate::habit::{
  Frequency,
  NewHabit
};
use crate::task::{
  NewTask,
  Priority,
  Status,
  TaskEdit
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Mod {
  Name(String),
  Priority(Priority),
  Tag(String),
  Status(Status),
  Due(NaiveDate),
  Note(String),
  Attach(PathBuf),
  Frequency(Frequency),
  Start(NaiveDate)
}

impl Mod {
  fn key(&self) -> &'static str {
    match self {
      | Mod::Name(_) => "name",
      | Mod::Priority(_) => "priority",
      | Mod::Tag(_) => "tag",
      | Mod::Status(_) => "status",
      | Mod::Due(_) => "due",
      | Mod::Note(_) => "note",
      | Mod::Attach(_) => "attach",
      | Mod::Frequency(_) => "freq",
      | Mod::Start(_) => "start"
    }
  }
}

/// Splits `args` into free words (joined as the name) and `key:value`
/// modifiers. Everything after a bare `--` is taken literally.
#[instrument(skip(args, today))]
pub(crate) fn parse_name_and_mods(
  args: &[String],
  today: NaiveDate
) -> anyhow::Result<(String, Vec<Mod>)>
{
  let mut name_parts = Vec::new();
  let mut mods = Vec::new();

  let mut literal = false;
  for arg in args {
    if arg == "--" && !literal {
      literal = true;
      continue;
    }

    if !literal
      && let Some(one_mod) =
        parse_one_mod(arg, today)?
    {
      mods.push(one_mod);
      continue;
    }

    name_parts.push(arg.clone());
  }

  Ok((name_parts.join(" "), mods))
}

#[instrument(skip(args, today))]
pub(crate) fn parse_mods(
  args: &[String],
  today: NaiveDate
) -> anyhow::Result<Vec<Mod>> {
  let mut mods = Vec::new();
  for arg in args {
    let one_mod = parse_one_mod(arg, today)?
      .ok_or_else(|| {
        anyhow!(
          "expected key:value, got: {arg}"
        )
      })?;
    mods.push(one_mod);
  }
  Ok(mods)
}

fn parse_one_mod(
  tok: &str,
  today: NaiveDate
) -> anyhow::Result<Option<Mod>> {
  let Some((key, value)) =
    tok.split_once(':')
  else {
    return Ok(None);
  };

  let key = key.to_ascii_lowercase();

  match key.as_str() {
    | "name" => {
      Ok(Some(Mod::Name(
        value.to_string()
      )))
    }
    | "pri" | "priority" => {
      Ok(Some(Mod::Priority(
        value.parse()?
      )))
    }
    | "tag" => {
      Ok(Some(Mod::Tag(
        value.to_string()
      )))
    }
    | "status" => {
      Ok(Some(Mod::Status(
        value.parse()?
      )))
    }
    | "due" | "deadline" => {
      Ok(Some(Mod::Due(
        parse_date_expr(value, today)?
      )))
    }
    | "note" => {
      Ok(Some(Mod::Note(
        value.to_string()
      )))
    }
    | "attach" | "file" => {
      Ok(Some(Mod::Attach(
        PathBuf::from(value)
      )))
    }
    | "freq" | "frequency" => {
      Ok(Some(Mod::Frequency(
        value.parse()?
      )))
    }
    | "start" => {
      Ok(Some(Mod::Start(
        parse_date_expr(value, today)?
      )))
    }
    | _ => Ok(None)
  }
}

/// Applies creation modifiers. Attachments are loaded by the caller, so
/// `Attach` is returned for it to handle.
pub(crate) fn apply_task_mods(
  task: &mut NewTask,
  mods: Vec<Mod>
) -> anyhow::Result<Option<PathBuf>> {
  let mut attach = None;
  for one_mod in mods {
    match one_mod {
      | Mod::Name(name) => {
        task.name = name;
      }
      | Mod::Priority(priority) => {
        task.priority = priority;
      }
      | Mod::Tag(tag) => {
        task.tag = tag;
      }
      | Mod::Status(status) => {
        task.status = status;
      }
      | Mod::Due(date) => {
        task.deadline = date;
      }
      | Mod::Note(note) => {
        task.note = note;
      }
      | Mod::Attach(path) => {
        attach = Some(path);
      }
      | other => {
        return Err(anyhow!(
          "{}: only applies to habits",
          other.key()
        ));
      }
    }
  }
  Ok(attach)
}

/// Applies modifiers to an edit draft. Only the five editable fields are
/// accepted.
pub(crate) fn apply_edit_mods(
  draft: &mut TaskEdit,
  mods: Vec<Mod>
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Name(name) => {
        draft.name = name;
      }
      | Mod::Priority(priority) => {
        draft.priority = priority;
      }
      | Mod::Tag(tag) => {
        draft.tag = tag;
      }
      | Mod::Status(status) => {
        draft.status = status;
      }
      | Mod::Due(date) => {
        draft.deadline = date;
      }
      | other @ (Mod::Note(_)
      | Mod::Attach(_)) => {
        return Err(anyhow!(
          "{}: not editable here; use \
           the `note` or `attach` \
           command",
          other.key()
        ));
      }
      | other => {
        return Err(anyhow!(
          "{}: only applies to habits",
          other.key()
        ));
      }
    }
  }
  Ok(())
}

pub(crate) fn apply_habit_mods(
  habit: &mut NewHabit,
  mods: Vec<Mod>
) -> anyhow::Result<()> {
  for one_mod in mods {
    match one_mod {
      | Mod::Name(name) => {
        habit.name = name;
      }
      | Mod::Frequency(frequency) => {
        habit.frequency = frequency;
      }
      | Mod::Start(date) => {
        habit.start_date = date;
      }
      | other => {
        return Err(anyhow!(
          "{}: does not apply to \
           habits",
          other.key()
        ));
      }
    }
  }
  Ok(())
}
