use std::fmt;

use serde::Serialize;

use crate::date::{days_between, CalendarDate, TestDate};
use crate::error::IntegrityError;
use crate::models::{Category, HealthRecord};

/// Days after a positive test before the case is released to low risk.
pub const QUARANTINE_DAYS: i64 = 7;
/// Days after a test before a retest reminder is shown.
pub const TEST_REMINDER_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reminder {
    NeedsInitialTest,
    RetestDue { elapsed_days: i64 },
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reminder::NeedsInitialTest => {
                f.write_str("Please complete your COVID-19 test assessment.")
            }
            Reminder::RetestDue { elapsed_days } => write!(
                f,
                "It has been {elapsed_days} days since your last test. \
                 Consider getting tested again."
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub category: Category,
    pub reminder: Option<Reminder>,
    pub quarantine_completed: bool,
}

impl HealthRecord {
    /// Writes the evaluated category back. Returns true when it changed and
    /// the record needs saving.
    pub fn apply(&mut self, evaluation: &Evaluation) -> bool {
        if self.category == evaluation.category {
            return false;
        }
        self.category = evaluation.category;
        true
    }
}

pub fn evaluate(record: &HealthRecord, today: CalendarDate) -> Evaluation {
    let unchanged = |reminder| Evaluation {
        category: record.category,
        reminder,
        quarantine_completed: false,
    };

    let tested = match record.last_test {
        TestDate::NeverTested => return unchanged(Some(Reminder::NeedsInitialTest)),
        TestDate::Tested(date) => date,
    };

    let elapsed = days_between(today, tested);
    tracing::debug!(category = %record.category, elapsed, "evaluating retest schedule");

    if record.category == Category::Positive && elapsed >= QUARANTINE_DAYS {
        return Evaluation {
            category: Category::LowRisk,
            reminder: None,
            quarantine_completed: true,
        };
    }

    if (TEST_REMINDER_DAYS..QUARANTINE_DAYS).contains(&elapsed) {
        unchanged(Some(Reminder::RetestDue {
            elapsed_days: elapsed,
        }))
    } else {
        unchanged(None)
    }
}

/// Evaluates the raw stored columns. Anything outside the valid domain is
/// reported rather than evaluated.
pub fn evaluate_stored(
    category_code: &str,
    test_date: &str,
    today: CalendarDate,
) -> Result<Evaluation, IntegrityError> {
    let category = Category::parse_code(category_code)?;
    let last_test =
        TestDate::parse_stored(test_date).map_err(|source| IntegrityError::TestDate {
            value: test_date.to_string(),
            source,
        })?;

    Ok(evaluate(
        &HealthRecord {
            category,
            last_test,
        },
        today,
    ))
}

pub fn needs_retest(record: &HealthRecord, today: CalendarDate) -> bool {
    match record.last_test {
        TestDate::NeverTested => true,
        TestDate::Tested(date) => days_between(today, date) >= TEST_REMINDER_DAYS,
    }
}
