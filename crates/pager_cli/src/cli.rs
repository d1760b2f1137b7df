//! Command-line surface: global options, subcommands and value parsers.

use chrono::{DateTime, Duration, Utc};
use clap::builder::FalseyValueParser;
use clap::{
    ArgAction, ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand,
};
use pager_core::{
    default_log_level, Balance, EventKind, IntervalKind, LogConfig, ParticipationAction, Person,
    Span, Style,
};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pager", version, about = "Manage on-call rotations")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// SQLite database file.
    #[arg(long, env = "DB", default_value = "db.sqlite3", global = true)]
    pub db: PathBuf,
    /// trace|debug|info|warn|error
    #[arg(long, env = "PAGER_LOG", global = true)]
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files; stderr when unset.
    #[arg(long, env = "PAGER_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    /// Omit timestamps from stderr log lines.
    #[arg(
        long,
        env = "DETERMINISTIC",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        global = true
    )]
    pub deterministic: bool,
}

impl GlobalOpts {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self
                .log_level
                .clone()
                .unwrap_or_else(|| default_log_level().to_string()),
            dir: self.log_dir.clone(),
            deterministic: self.deterministic,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a schedule.
    AddSchedule {
        #[arg(long)]
        name: String,
    },
    /// Register a person.
    AddPerson {
        #[arg(long)]
        who: String,
    },
    /// Add a SHIFT or EXCLUSION, rejecting cross-kind conflicts.
    AddInterval {
        #[arg(long)]
        schedule: String,
        #[arg(long)]
        who: String,
        #[arg(long, default_value = "SHIFT", value_parser = parse_kind)]
        kind: IntervalKind,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Print the flattened SHIFT timeline as CSV.
    ShowSchedule {
        #[arg(long)]
        schedule: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Add or remove people from a schedule's roster.
    Edit {
        #[arg(long)]
        schedule: String,
        /// PERSON=RFC3339
        #[arg(long = "add", value_parser = parse_assignment)]
        adds: Vec<(Person, DateTime<Utc>)>,
        /// PERSON=RFC3339
        #[arg(long = "remove", value_parser = parse_assignment)]
        removes: Vec<(Person, DateTime<Utc>)>,
        /// `--add` and `--remove` merged in command-line order.
        #[arg(skip)]
        actions: Vec<ParticipationAction>,
    },
    /// Generate a balanced rotation and print the inserted shifts as CSV.
    Generate {
        #[arg(long)]
        schedule: String,
        #[arg(long, value_parser = parse_style)]
        style: Style,
        #[command(flatten)]
        window: WindowArgs,
        /// PERSON=DURATION starting tally, e.g. alice=-24h
        #[arg(long = "balance", value_parser = parse_balance)]
        balances: Vec<(Person, Duration)>,
    },
    /// Push SHIFT rows from CSV to the paging sink.
    Apply {
        #[arg(long)]
        schedule: String,
        /// CSV input; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    /// Inclusive start, RFC3339.
    #[arg(long, value_parser = parse_instant)]
    pub start: DateTime<Utc>,
    /// Exclusive end, RFC3339.
    #[arg(
        long,
        value_parser = parse_instant,
        conflicts_with = "length",
        required_unless_present = "length"
    )]
    pub end: Option<DateTime<Utc>>,
    /// Window length, e.g. 90m, 36h, 21d, 1w.
    #[arg(long = "for", id = "length", value_parser = parse_duration)]
    pub length: Option<Duration>,
}

impl WindowArgs {
    pub fn span(&self) -> Result<Span, String> {
        let end = match (self.end, self.length) {
            (Some(end), None) => end,
            (None, Some(length)) => self
                .start
                .checked_add_signed(length)
                .ok_or_else(|| "--for overflows the calendar".to_string())?,
            _ => return Err("provide exactly one of --end or --for".to_string()),
        };
        Span::new(self.start, end).map_err(|err| err.to_string())
    }
}

impl Cli {
    /// Parses `std::env::args_os`, see [`Cli::try_parse_ordered_from`].
    pub fn try_parse_ordered() -> Result<Self, clap::Error> {
        Self::try_parse_ordered_from(std::env::args_os())
    }

    /// Parses arguments and records `edit`'s roster changes in the order
    /// they were typed, interleaving `--add` and `--remove`.
    pub fn try_parse_ordered_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        if let (Command::Edit { actions, .. }, Some(("edit", edit))) =
            (&mut cli.command, matches.subcommand())
        {
            *actions = ordered_actions(edit);
        }
        Ok(cli)
    }
}

fn ordered_actions(edit: &ArgMatches) -> Vec<ParticipationAction> {
    let mut positioned: Vec<(usize, ParticipationAction)> = Vec::new();
    for (id, kind) in [("adds", EventKind::Add), ("removes", EventKind::Remove)] {
        let (Some(indices), Some(values)) = (
            edit.indices_of(id),
            edit.get_many::<(Person, DateTime<Utc>)>(id),
        ) else {
            continue;
        };
        for (index, (who, at)) in indices.zip(values) {
            let action = ParticipationAction {
                kind,
                who: who.clone(),
                at: *at,
            };
            positioned.push((index, action));
        }
    }
    positioned.sort_by_key(|(index, _)| *index);
    positioned.into_iter().map(|(_, action)| action).collect()
}

pub fn balance(entries: &[(Person, Duration)]) -> Balance {
    entries.iter().cloned().collect()
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| format!("`{value}` is not an RFC3339 timestamp: {err}"))
}

fn parse_kind(value: &str) -> Result<IntervalKind, String> {
    value.parse().map_err(|err: pager_core::IntervalValidationError| err.to_string())
}

fn parse_style(value: &str) -> Result<Style, String> {
    value.parse().map_err(|err: pager_core::PagerError| err.to_string())
}

/// Parses `90m`, `36h`, `21d`, `1w`, compounds such as `1d12h`, and a
/// leading `-`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if body.is_empty() {
        return Err(format!("`{value}` is not a duration"));
    }

    let mut total = Duration::zero();
    let mut digits = String::new();
    for ch in body.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let amount: i64 = digits
            .parse()
            .map_err(|_| format!("`{value}` is not a duration: missing number before `{ch}`"))?;
        let part = match ch {
            's' => Duration::try_seconds(amount),
            'm' => Duration::try_minutes(amount),
            'h' => Duration::try_hours(amount),
            'd' => Duration::try_days(amount),
            'w' => Duration::try_weeks(amount),
            other => return Err(format!("`{value}` has unknown unit `{other}`")),
        }
        .ok_or_else(|| format!("`{value}` is out of range"))?;
        total = total
            .checked_add(&part)
            .ok_or_else(|| format!("`{value}` is out of range"))?;
        digits.clear();
    }
    if !digits.is_empty() {
        return Err(format!("`{value}` is missing a unit (s, m, h, d, w)"));
    }

    Ok(if negative { -total } else { total })
}

fn split_assignment(value: &str) -> Result<(&str, &str), String> {
    let (who, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("cannot parse `{value}`: does not contain `=`"))?;
    if who.trim().is_empty() {
        return Err(format!("cannot parse `{value}`: empty person"));
    }
    Ok((who, rest))
}

fn parse_assignment(value: &str) -> Result<(Person, DateTime<Utc>), String> {
    let (who, at) = split_assignment(value)?;
    Ok((who.to_string(), parse_instant(at)?))
}

fn parse_balance(value: &str) -> Result<(Person, Duration), String> {
    let (who, amount) = split_assignment(value)?;
    Ok((who.to_string(), parse_duration(amount)?))
}
