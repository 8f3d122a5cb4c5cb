use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};

mod config;
mod date;
mod error;
mod input;
mod models;
mod report;
mod risk;
mod schedule;
mod store;

use date::{CalendarDate, TestDate};
use input::DateInput;
use models::{HealthRecord, Questionnaire, UserRecord};
use store::{PasswordChange, ProfileUpdate, RecordStore};

#[derive(Parser)]
#[command(name = "covid-health-tracker")]
#[command(about = "COVID-19 self-assessment, risk category and retest tracker", long_about = None)]
struct Cli {
    /// Pipe-delimited user record file
    #[arg(long, global = true, env = config::DATA_FILE_ENV, default_value = config::DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Evaluate as of this date instead of the local date (DD/MM/YYYY)
    #[arg(long, global = true, value_parser = date::parse_date)]
    today: Option<CalendarDate>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    username: String,
    #[arg(long, env = config::PASSWORD_ENV, hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = input::parse_age)]
        age: u8,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// IC or passport number
        #[arg(long, default_value = "")]
        id_number: String,
    },
    /// Log in, apply quarantine release and show reminders
    Login {
        #[command(flatten)]
        credentials: Credentials,
        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a self-assessment and test result (answers are 1 or 0)
    Assess {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        fever: bool,
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        cough: bool,
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        breathing: bool,
        /// Travelled to a high-risk area in the past 14 days
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        travel: bool,
        /// Close contact with a positive case
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        contact: bool,
        /// Test result, 1 for positive
        #[arg(long, action = ArgAction::Set, value_parser = input::parse_flag)]
        result: bool,
        /// Test date as DD/MM/YYYY, or "today"
        #[arg(long, value_parser = input::parse_date_input, default_value = "today")]
        date: DateInput,
    },
    /// Show the health category and recommended actions
    Category {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show profile details
    Profile {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Change profile fields
    UpdateProfile {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = input::parse_age)]
        age: Option<u8>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        id_number: Option<String>,
        #[arg(long)]
        new_username: Option<String>,
        #[arg(long, requires = "old_password")]
        new_password: Option<String>,
        #[arg(long, requires = "new_password")]
        old_password: Option<String>,
    },
    /// Evaluate a stored category code and test date without an account
    Check {
        /// Category code, 0 (low risk) to 4 (positive)
        #[arg(long)]
        category: String,
        /// Test date as stored, DD/MM/YYYY or 00/00/0000
        #[arg(long)]
        date: String,
    },
    /// Write a markdown status report across all users
    Report {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);

    let today = cli.today.unwrap_or_else(CalendarDate::today);
    let loaded = store::load(&cli.data_file)
        .with_context(|| format!("failed to load {}", cli.data_file.display()))?;
    for warning in &loaded.warnings {
        tracing::warn!(
            line = warning.line,
            issue = %warning.issue,
            "recovered invalid stored value"
        );
    }
    let mut records = loaded.store;

    let modified = run(cli.command, &mut records, today)?;

    if modified {
        store::save(&cli.data_file, &records)
            .with_context(|| format!("failed to save {}", cli.data_file.display()))?;
    }

    Ok(())
}

/// Runs one command against the loaded store. Returns true when the store
/// must be written back.
fn run(command: Commands, records: &mut RecordStore, today: CalendarDate) -> anyhow::Result<bool> {
    match command {
        Commands::Register {
            credentials,
            name,
            age,
            address,
            phone,
            id_number,
        } => {
            records.register(UserRecord {
                username: credentials.username,
                password: credentials.password,
                full_name: name,
                age,
                address,
                phone,
                id_number,
                health: HealthRecord::default(),
            })?;
            println!("Registration successful!");
            Ok(true)
        }
        Commands::Login { credentials, json } => {
            let index = records.authenticate(&credentials.username, &credentials.password)?;
            let user = records
                .get_mut(index)
                .context("authenticated user disappeared")?;

            let evaluation = schedule::evaluate(&user.health, today);
            let changed = user.health.apply(&evaluation);

            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
                return Ok(changed);
            }

            println!("Login successful! Welcome, {}!", user.full_name);
            if evaluation.quarantine_completed {
                println!(
                    "NOTE: Your quarantine period has ended. Category updated to {}.",
                    evaluation.category
                );
            }
            if user.health.last_test == TestDate::NeverTested {
                println!("NOTICE: Please update your test result after login.");
            }
            if let Some(reminder) = evaluation.reminder {
                println!("REMINDER: {reminder}");
            }
            Ok(changed)
        }
        Commands::Assess {
            credentials,
            fever,
            cough,
            breathing,
            travel,
            contact,
            result,
            date,
        } => {
            let index = records.authenticate(&credentials.username, &credentials.password)?;
            let user = records
                .get_mut(index)
                .context("authenticated user disappeared")?;

            let answers = Questionnaire {
                has_fever: fever,
                has_cough: cough,
                has_breathing_difficulty: breathing,
                has_travel_history: travel,
                has_close_contact: contact,
                test_positive: result,
            };
            let category = risk::classify(&answers);
            let tested_on = date.resolve(today);
            tracing::info!(
                username = %user.username,
                symptom_score = answers.symptom_score(),
                %category,
                %tested_on,
                "recorded self-assessment"
            );

            user.health = HealthRecord {
                category,
                last_test: TestDate::Tested(tested_on),
            };
            println!("Assessment completed. Your health category is now {category}.");
            Ok(true)
        }
        Commands::Category { credentials } => {
            let index = records.authenticate(&credentials.username, &credentials.password)?;
            let user = records.get(index).context("authenticated user disappeared")?;
            print!("{}", report::render_category(user, today));
            Ok(false)
        }
        Commands::Profile { credentials } => {
            let index = records.authenticate(&credentials.username, &credentials.password)?;
            let user = records.get(index).context("authenticated user disappeared")?;
            print!("{}", report::render_profile(user));
            Ok(false)
        }
        Commands::UpdateProfile {
            credentials,
            name,
            age,
            address,
            phone,
            id_number,
            new_username,
            new_password,
            old_password,
        } => {
            let index = records.authenticate(&credentials.username, &credentials.password)?;
            let password = match (old_password, new_password) {
                (Some(old), Some(new)) => Some(PasswordChange { old, new }),
                _ => None,
            };
            let changed = records.update_profile(
                index,
                ProfileUpdate {
                    full_name: name,
                    age,
                    address,
                    phone,
                    id_number,
                    username: new_username,
                    password,
                },
            )?;

            if changed.is_empty() {
                println!("Nothing to update.");
                return Ok(false);
            }
            for field in changed {
                println!("Updated {field}.");
            }
            Ok(true)
        }
        Commands::Check { category, date } => {
            let evaluation = schedule::evaluate_stored(&category, &date, today)?;
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            Ok(false)
        }
        Commands::Report { out } => {
            let report = report::build_report(records, today);
            match out {
                Some(path) => {
                    std::fs::write(&path, report)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Report written to {}.", path.display());
                }
                None => print!("{report}"),
            }
            Ok(false)
        }
    }
}
