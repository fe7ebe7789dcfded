use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::deadline::DEFAULT_WARNING_DAYS;
use crate::habit::Frequency;
use crate::notify::DEFAULT_TIMEOUT;
use crate::task::{
  Priority,
  Status
};

pub const RC_ENV_VAR: &str = "TENDRC";
pub const RC_FILE_NAME: &str =
  ".tendrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("color", "on"),
      ("warning.days", "2"),
      ("notify.enabled", "on"),
      ("notify.timeout", "10"),
      ("refresh.auto", "on"),
      ("default.priority", "Low"),
      ("default.status", "Not Started"),
      ("default.frequency", "Daily")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading rc file");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no rc file found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|v| {
        parse_bool(v).ok_or_else(|| {
          anyhow!(
            "invalid boolean for \
             {key}: {v}"
          )
        })
      })
      .transpose()
  }

  /// Parses a typed value, naming the key on failure.
  pub fn get_parsed<T>(
    &self,
    key: &str
  ) -> anyhow::Result<Option<T>>
  where
    T: FromStr,
    T::Err: Display
  {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<T>().map_err(
          |err| {
            anyhow!(
              "invalid value for \
               {key}: {v} ({err})"
            )
          }
        )
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// Typed view of the keys the session reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub color:             bool,
  pub warning_days:      i64,
  pub notify_enabled:    bool,
  pub notify_command:    Option<String>,
  pub notify_timeout:    Duration,
  pub refresh_auto:      bool,
  pub default_priority:  Priority,
  pub default_status:    Status,
  pub default_frequency: Frequency
}

impl Settings {
  #[tracing::instrument(skip(cfg))]
  pub fn from_config(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let warning_days = cfg
      .get_parsed::<i64>(
        "warning.days"
      )?
      .unwrap_or(DEFAULT_WARNING_DAYS);
    if warning_days < 0 {
      return Err(anyhow!(
        "warning.days must not be \
         negative: {warning_days}"
      ));
    }

    let notify_timeout = cfg
      .get_parsed::<u64>(
        "notify.timeout"
      )?
      .map(Duration::from_secs)
      .unwrap_or(DEFAULT_TIMEOUT);

    let notify_command = cfg
      .get("notify.command")
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty());

    Ok(Self {
      color: cfg
        .get_bool("color")?
        .unwrap_or(true),
      warning_days,
      notify_enabled: cfg
        .get_bool("notify.enabled")?
        .unwrap_or(true),
      notify_command,
      notify_timeout,
      refresh_auto: cfg
        .get_bool("refresh.auto")?
        .unwrap_or(true),
      default_priority: cfg
        .get_parsed(
          "default.priority"
        )?
        .unwrap_or(Priority::Low),
      default_status: cfg
        .get_parsed("default.status")?
        .unwrap_or(Status::NotStarted),
      default_frequency: cfg
        .get_parsed(
          "default.frequency"
        )?
        .unwrap_or(Frequency::Daily)
    })
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping rc file"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::time::Duration;

  use super::{
    Config,
    Settings
  };
  use crate::habit::Frequency;
  use crate::task::{
    Priority,
    Status
  };

  #[test]
  fn defaults_resolve_to_settings() {
    let settings = Settings::from_config(
      &Config::default()
    )
    .expect("default settings");
    assert!(settings.color);
    assert_eq!(settings.warning_days, 2);
    assert!(settings.notify_enabled);
    assert_eq!(
      settings.notify_command,
      None
    );
    assert_eq!(
      settings.notify_timeout,
      Duration::from_secs(10)
    );
    assert!(settings.refresh_auto);
    assert_eq!(
      settings.default_priority,
      Priority::Low
    );
    assert_eq!(
      settings.default_status,
      Status::NotStarted
    );
    assert_eq!(
      settings.default_frequency,
      Frequency::Daily
    );
  }

  #[test]
  fn loads_file_with_comments_and_includes()
   {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let extra = dir.path().join("extra");
    fs::write(
      &extra,
      "notify.command = notify-send\n"
    )
    .expect("write include");
    let rc = dir.path().join("tendrc");
    fs::write(
      &rc,
      "# reminders\nwarning.days = \
       3 # wider\ninclude extra\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(cfg.loaded_files.len(), 2);

    let settings =
      Settings::from_config(&cfg)
        .expect("settings");
    assert_eq!(settings.warning_days, 3);
    assert_eq!(
      settings.notify_command.as_deref(),
      Some("notify-send")
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "rc.default.priority".to_string(),
        "high".to_string()
      ),
      (
        "color".to_string(),
        "off".to_string()
      )
    ]);
    let settings =
      Settings::from_config(&cfg)
        .expect("settings");
    assert_eq!(
      settings.default_priority,
      Priority::High
    );
    assert!(!settings.color);
  }

  #[test]
  fn invalid_values_name_the_key() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "warning.days".to_string(),
      "soon".to_string()
    )]);
    let err = Settings::from_config(&cfg)
      .expect_err("should reject");
    assert!(
      err
        .to_string()
        .contains("warning.days")
    );

    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "refresh.auto".to_string(),
      "maybe".to_string()
    )]);
    assert!(
      Settings::from_config(&cfg)
        .is_err()
    );
  }

  #[test]
  fn rejects_line_without_equals() {
    let dir = tempfile::tempdir()
      .expect("tempdir");
    let rc = dir.path().join("tendrc");
    fs::write(&rc, "color on\n")
      .expect("write rc");
    assert!(
      Config::load(Some(&rc)).is_err()
    );
  }
}
