use std::io::Write;

use tracing::{
  info,
  instrument
};

use super::modifiers::{
  apply_habit_mods,
  parse_name_and_mods
};
use super::{
  first_arg,
  parse_habit_key
};
use crate::habit::NewHabit;
use crate::session::Session;

#[instrument(skip(session, args))]
pub(super) fn cmd_habit<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  info!("command habit");

  let today = session.today();
  let (name, mods) =
    parse_name_and_mods(args, today)?;

  let mut new = NewHabit::new(
    name,
    session.settings.default_frequency,
    today
  );
  apply_habit_mods(&mut new, mods)?;

  let handle =
    session.store.add_habit(new)?;
  let habit =
    session.store.habit(handle.id)?;
  writeln!(
    session.out,
    "Habit '{}' added to tracker!",
    habit.name
  )?;
  Ok(())
}

#[instrument(skip(session))]
pub(super) fn cmd_habits<W: Write>(
  session: &mut Session<W>
) -> anyhow::Result<()> {
  session.renderer.print_habits(
    &mut session.out,
    session.store.habits()
  )
}

#[instrument(skip(session, args))]
pub(super) fn cmd_check<W: Write>(
  session: &mut Session<W>,
  args: &[String]
) -> anyhow::Result<()> {
  let key = parse_habit_key(first_arg(
    args, "check N"
  )?)?;
  let changed = session
    .store
    .mark_habit_completed(key)?;
  let habit = session.store.habit(key)?;

  if changed {
    writeln!(
      session.out,
      "Habit '{}' marked completed!",
      habit.name
    )?;
  } else {
    writeln!(
      session.out,
      "Habit '{}' was already completed.",
      habit.name
    )?;
  }
  Ok(())
}
