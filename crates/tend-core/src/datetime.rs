use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  Local,
  Months,
  NaiveDate,
  Weekday
};
use regex::Regex;

pub const DISPLAY_FORMAT: &str =
  "%d-%m-%Y";

#[must_use]
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date
    .format(DISPLAY_FORMAT)
    .to_string()
}

#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return today
        .checked_add_signed(
          Duration::days(1)
        )
        .ok_or_else(|| {
          anyhow!(
            "date out of range for \
             tomorrow"
          )
        });
    }
    | "yesterday" => {
      return today
        .checked_sub_signed(
          Duration::days(1)
        )
        .ok_or_else(|| {
          anyhow!(
            "date out of range for \
             yesterday"
          )
        });
    }
    | _ => {}
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today,
      target_weekday
    ));
  }

  if let Some(target_month) =
    parse_month_name(&lower)
  {
    let mut year = today.year();
    let this_year =
      NaiveDate::from_ymd_opt(
        year,
        target_month,
        1
      )
      .ok_or_else(|| {
        anyhow!(
          "invalid month value: \
           {target_month}"
        )
      })?;
    if this_year <= today {
      year = year.saturating_add(1);
    }
    return NaiveDate::from_ymd_opt(
      year,
      target_month,
      1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid month/year \
         candidate"
      )
    });
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: u32 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let shifted = match (unit, negative) {
      | ("d", false) => today
        .checked_add_signed(
          Duration::days(num.into())
        ),
      | ("d", true) => today
        .checked_sub_signed(
          Duration::days(num.into())
        ),
      | ("w", false) => today
        .checked_add_signed(
          Duration::weeks(num.into())
        ),
      | ("w", true) => today
        .checked_sub_signed(
          Duration::weeks(num.into())
        ),
      | ("m", false) => today
        .checked_add_months(
          Months::new(num)
        ),
      | ("m", true) => today
        .checked_sub_months(
          Months::new(num)
        ),
      | _ => {
        return Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };

    return shifted.ok_or_else(|| {
      anyhow!(
        "relative date out of range: \
         {input}"
      )
    });
  }

  for fmt in
    ["%Y-%m-%d", DISPLAY_FORMAT]
  {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        token, fmt
      )
    {
      return Ok(date);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, \
     weekday names (e.g. monday), \
     month names (e.g. march), \
     +Nd/-Nd/+Nw/+Nm, YYYY-MM-DD, \
     DD-MM-YYYY"
  })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    format_date,
    parse_date_expr
  };

  fn today() -> NaiveDate {
    // a Saturday
    NaiveDate::from_ymd_opt(
      2024, 1, 13
    )
    .expect("valid today")
  }

  fn ymd(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_keywords() {
    assert_eq!(
      parse_date_expr("today", today())
        .expect("parse today"),
      today()
    );
    assert_eq!(
      parse_date_expr(
        "Tomorrow",
        today()
      )
      .expect("parse tomorrow"),
      ymd(2024, 1, 14)
    );
    assert_eq!(
      parse_date_expr(
        "yesterday",
        today()
      )
      .expect("parse yesterday"),
      ymd(2024, 1, 12)
    );
  }

  #[test]
  fn parses_weekday_name() {
    assert_eq!(
      parse_date_expr(
        "wednesday",
        today()
      )
      .expect("parse weekday"),
      ymd(2024, 1, 17)
    );
    assert_eq!(
      parse_date_expr("sat", today())
        .expect("parse same weekday"),
      ymd(2024, 1, 20)
    );
  }

  #[test]
  fn parses_month_name() {
    assert_eq!(
      parse_date_expr("march", today())
        .expect("parse month"),
      ymd(2024, 3, 1)
    );
    assert_eq!(
      parse_date_expr("jan", today())
        .expect("parse past month"),
      ymd(2025, 1, 1)
    );
  }

  #[test]
  fn parses_relative_offsets() {
    assert_eq!(
      parse_date_expr("+2d", today())
        .expect("parse +2d"),
      ymd(2024, 1, 15)
    );
    assert_eq!(
      parse_date_expr("-1w", today())
        .expect("parse -1w"),
      ymd(2024, 1, 6)
    );
    assert_eq!(
      parse_date_expr("+1m", today())
        .expect("parse +1m"),
      ymd(2024, 2, 13)
    );
  }

  #[test]
  fn parses_iso_and_display_formats() {
    assert_eq!(
      parse_date_expr(
        "2024-01-10",
        today()
      )
      .expect("parse iso"),
      ymd(2024, 1, 10)
    );
    assert_eq!(
      parse_date_expr(
        "10-01-2024",
        today()
      )
      .expect("parse display"),
      ymd(2024, 1, 10)
    );
    assert_eq!(
      format_date(ymd(2024, 1, 10)),
      "10-01-2024"
    );
  }

  #[test]
  fn rejects_garbage() {
    assert!(
      parse_date_expr(
        "someday",
        today()
      )
      .is_err()
    );
  }
}
