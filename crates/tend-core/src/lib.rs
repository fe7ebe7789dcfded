pub mod analytics;
pub mod attachment;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod deadline;
pub mod editing;
pub mod error;
pub mod habit;
pub mod notify;
pub mod render;
pub mod session;
pub mod shared;
pub mod store;
pub mod task;

use std::ffi::OsString;
use std::fs::File;
use std::io::{
  self,
  BufReader,
  IsTerminal
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

const PROMPT: &str = "tend> ";

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tend"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.tendrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let settings =
    config::Settings::from_config(&cfg)
      .context(
        "invalid configuration"
      )?;
  let renderer =
    render::Renderer::new(&settings);
  let notifier =
    session::notifier_from_settings(
      &settings
    )?;

  let mut session = session::Session::new(
    settings,
    renderer,
    notifier,
    io::stdout().lock()
  );
  if let Some(expr) = cli.today.as_deref()
  {
    let today = datetime::parse_date_expr(
      expr,
      datetime::local_today()
    )
    .with_context(|| {
      format!("invalid --today: {expr}")
    })?;
    session = session.with_today(today);
  }

  if !cli.rest.is_empty() {
    let tokens = cli
      .rest
      .iter()
      .map(|arg| {
        arg.to_string_lossy().into_owned()
      })
      .collect();
    if let Some(inv) =
      cli::Invocation::from_tokens(tokens)?
      && session.execute(inv)?
        == commands::Flow::Quit
    {
      info!("done");
      return Ok(());
    }
  }

  match cli.script.as_deref() {
    | Some(path) => {
      let file = File::open(path)
        .with_context(|| {
          format!(
            "failed to open script {}",
            path.display()
          )
        })?;
      session
        .run(BufReader::new(file), None)?;
    }
    | None => {
      let stdin = io::stdin();
      let prompt = stdin
        .is_terminal()
        .then_some(PROMPT);
      session.run(stdin.lock(), prompt)?;
    }
  }

  info!("done");
  Ok(())
}
