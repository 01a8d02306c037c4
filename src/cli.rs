//! `lift-review` command line front end
//!
//! Each invocation is one action: resolve a session, run a command, print
//! the result.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::commands::{
  self, auth as auth_cmd, feedback as feedback_cmd, progress, records, videos, CommandError,
  HistoryFilter,
};
use crate::db::AppState;
use crate::models::{RecordForm, SessionContext};
use crate::trend::TrendMetric;

const HISTORY_DEFAULT_DAYS: u64 = 30;

#[derive(Debug, Parser)]
#[command(
  name = "lift-review",
  version,
  about = "Strength training log: record sets, chart progress, get personal-best feedback"
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,

  /// Use generated sample data; nothing is saved
  #[arg(long, global = true)]
  pub guest: bool,

  /// Account email for the hosted store
  #[arg(long, global = true, env = "LIFT_REVIEW_EMAIL")]
  pub email: Option<String>,

  /// Account password for the hosted store
  #[arg(long, global = true, env = "LIFT_REVIEW_PASSWORD", hide_env_values = true)]
  pub password: Option<String>,

  /// Act as if today were this date (YYYY-MM-DD)
  #[arg(long, global = true)]
  pub today: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Record a training entry
  Log {
    #[arg(long, short = 'e')]
    exercise: String,
    /// kg
    #[arg(long, short = 'w')]
    weight: String,
    #[arg(long, short = 'r')]
    reps: String,
    #[arg(long, short = 's')]
    sets: String,
    /// Training date, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    notes: String,
  },

  /// List past records, newest first (last 30 days unless a range is given)
  History {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long, short = 'e')]
    exercise: Option<String>,
    /// Ignore the default 30-day window
    #[arg(long)]
    all: bool,
  },

  /// List the exercises you have recorded
  Exercises,

  /// Trend and personal bests for one exercise
  Progress {
    #[arg(long, short = 'e')]
    exercise: String,
    /// weight, reps or volume
    #[arg(long, short = 'm', default_value = "weight")]
    metric: TrendMetric,
  },

  /// Compare today's training with previous sessions
  Feedback,

  /// Find form tutorial videos for an exercise
  Videos { exercise: String },

  /// Create an account on the hosted store
  Signup {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm: String,
  },

  /// Show which store is in use and whether it is reachable
  Status,
}

/// Resolve the session for this invocation.
async fn open_session(
  state: &AppState,
  cli: &Cli,
  today: NaiveDate,
) -> Result<SessionContext, CommandError> {
  if cli.guest {
    return Ok(auth_cmd::guest_login(today));
  }
  if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
    return auth_cmd::sign_in(state, email, password, today).await;
  }
  Ok(
    state
      .local_session(today)
      .unwrap_or_else(|| SessionContext::anonymous(today)),
  )
}

/// Run one CLI invocation against prepared state.
pub async fn execute(state: &AppState, cli: Cli) -> Result<(), CommandError> {
  let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

  if let Command::Signup {
    email,
    password,
    confirm,
  } = &cli.command
  {
    let session = auth_cmd::sign_up(state, email, password, confirm, today).await?;
    println!("Account created for {}. You can now sign in.", session.display_name());
    return Ok(());
  }

  let session = open_session(state, &cli, today).await?;
  if session.is_guest {
    println!("Guest mode: showing sample data, nothing is saved.");
  }

  let result = dispatch(state, &session, cli.command, today).await;

  if session.access_token.is_some() {
    if let Err(e) = auth_cmd::sign_out(state, &session).await {
      tracing::warn!(error = %e, "failed to end session");
    }
  }
  result
}

async fn dispatch(
  state: &AppState,
  session: &SessionContext,
  command: Command,
  today: NaiveDate,
) -> Result<(), CommandError> {
  match command {
    Command::Log {
      exercise,
      weight,
      reps,
      sets,
      date,
      notes,
    } => {
      let form = RecordForm {
        training_date: date,
        exercise_name: exercise,
        weight,
        reps,
        sets,
        notes,
      };
      let outcome = records::submit_record(state, session, &form).await?;
      let record = outcome.record();
      println!("{}", outcome.message());
      println!(
        "  {}  {}  {:.1} kg x {} reps x {} sets  (volume {:.1})",
        record.training_date,
        record.exercise_name,
        record.weight,
        record.reps,
        record.sets,
        record.volume()
      );
    }

    Command::History {
      from,
      to,
      exercise,
      all,
    } => {
      let filter = if all || from.is_some() || to.is_some() {
        HistoryFilter { start: from, end: to, exercise }
      } else {
        HistoryFilter {
          exercise,
          ..HistoryFilter::last_days(today, HISTORY_DEFAULT_DAYS)
        }
      };
      let view = commands::get_history(state, session, &filter).await?;
      if view.records.is_empty() {
        println!("No records match these filters.");
      }
      for r in &view.records {
        println!(
          "{}  {:<20} {:>7.1} kg {:>4} reps {:>3} sets  {}",
          r.training_date, r.exercise_name, r.weight, r.reps, r.sets, r.notes
        );
      }
      println!("{} records", view.records.len());
      if !view.rejected.is_empty() {
        println!("{} malformed rows skipped", view.rejected.len());
      }
    }

    Command::Exercises => {
      for name in commands::list_exercises(state, session).await? {
        println!("{}", name);
      }
    }

    Command::Progress { exercise, metric } => {
      let view = progress::get_progress(state, session, &exercise, metric).await?;
      if view.is_empty() {
        println!("No records for {}.", view.exercise);
        return Ok(());
      }
      println!("{} ({})", view.title, view.axis_label);
      for point in &view.points {
        println!("  {}  {:.1}", point.date, point.value);
      }
      println!("Best weight: {}", view.bests.max_weight_label());
      println!("Best reps:   {}", view.bests.max_reps_label());
      println!("Max volume:  {}", view.bests.max_volume_label());
      if view.rejected > 0 {
        println!("{} malformed rows skipped", view.rejected);
      }
    }

    Command::Feedback => {
      let report = feedback_cmd::get_feedback(state, session).await?;
      if report.is_empty() {
        println!("No training recorded for {} yet.", report.date);
      } else {
        println!("You trained {} exercises today.", report.entries.len());
        for entry in &report.entries {
          println!("{}", entry.exercise);
          for line in entry.messages() {
            println!("  {}", line);
          }
        }
      }
      if let Some(latest) = feedback_cmd::latest_training_date(state, session).await? {
        println!("Latest training day: {}", latest);
      }
    }

    Command::Videos { exercise } => {
      let outcome = videos::search_videos(state, session, &exercise).await?;
      if let Some(warning) = &outcome.warning {
        println!("{}", warning);
      }
      for video in &outcome.videos {
        println!("{}\n  {}", video.title, video.watch_url());
      }
    }

    Command::Status => {
      let status = commands::connection_status(state, session).await;
      println!("Store:       {}", status.backend);
      println!("Connected:   {}", if status.connected { "yes" } else { "no" });
      if let Some(message) = &status.message {
        println!("Detail:      {}", message);
      }
      println!("Signed in:   {}", status.signed_in_as);
      println!("Video search: {}", if status.video_search { "on" } else { "off" });
    }

    Command::Signup { .. } => {}
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::tests::state_with;
  use crate::test_utils::{date, MemoryStore};
  use std::sync::Arc;

  #[test]
  fn test_parses_log_command() {
    let cli = Cli::try_parse_from([
      "lift-review",
      "log",
      "-e",
      "Bench Press",
      "-w",
      "60",
      "-r",
      "8",
      "-s",
      "3",
      "--date",
      "2024-05-01",
    ])
    .unwrap();
    match cli.command {
      Command::Log { exercise, date: day, .. } => {
        assert_eq!(exercise, "Bench Press");
        assert_eq!(day, Some(date("2024-05-01")));
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_metric_argument() {
    let cli = Cli::try_parse_from(["lift-review", "progress", "-e", "Squat", "-m", "volume"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Progress {
        metric: TrendMetric::Volume,
        ..
      }
    ));
    assert!(Cli::try_parse_from(["lift-review", "progress", "-e", "Squat", "-m", "sets"]).is_err());
  }

  #[tokio::test]
  async fn test_guest_invocation_runs_against_samples() {
    let store = Arc::new(MemoryStore::new(Vec::new()));
    let state = state_with(store.clone());
    let cli = Cli::try_parse_from(["lift-review", "--guest", "--today", "2024-05-30", "feedback"]).unwrap();

    execute(&state, cli).await.unwrap();
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn test_anonymous_invocation_needs_sign_in() {
    // No store and no auth service: nothing to sign in against
    let state = AppState::from_config(crate::commands::tests::test_config())
      .await
      .unwrap();
    let cli = Cli::try_parse_from(["lift-review", "history"]).unwrap();

    let err = execute(&state, cli).await.unwrap_err();
    assert!(matches!(err, CommandError::NotSignedIn));
  }
}
