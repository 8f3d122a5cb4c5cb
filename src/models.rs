use std::fmt;

use serde::Serialize;

use crate::date::TestDate;
use crate::error::IntegrityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LowRisk,
    TravelHistory,
    Suspected,
    CloseContact,
    Positive,
}

impl Category {
    /// Display order, lowest severity first.
    pub const ALL: [Category; 5] = [
        Category::LowRisk,
        Category::TravelHistory,
        Category::Suspected,
        Category::CloseContact,
        Category::Positive,
    ];

    pub fn code(self) -> u8 {
        match self {
            Category::LowRisk => 0,
            Category::TravelHistory => 1,
            Category::Suspected => 2,
            Category::CloseContact => 3,
            Category::Positive => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Category::ALL.get(usize::from(code)).copied()
    }

    /// Reads the code column of a stored record.
    pub fn parse_code(text: &str) -> Result<Self, IntegrityError> {
        text.trim()
            .parse::<u8>()
            .ok()
            .and_then(Category::from_code)
            .ok_or_else(|| IntegrityError::CategoryCode(text.to_string()))
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::LowRisk => "Low Risk",
            Category::TravelHistory => "Travel History",
            Category::Suspected => "Suspected Case",
            Category::CloseContact => "Close Contact",
            Category::Positive => "Positive Case",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Self-assessment answers. Consumed once by [`crate::risk::classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Questionnaire {
    pub has_fever: bool,
    pub has_cough: bool,
    pub has_breathing_difficulty: bool,
    pub has_travel_history: bool,
    pub has_close_contact: bool,
    pub test_positive: bool,
}

impl Questionnaire {
    pub fn symptom_score(&self) -> usize {
        [self.has_fever, self.has_cough, self.has_breathing_difficulty]
            .iter()
            .filter(|present| **present)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthRecord {
    pub category: Category,
    pub last_test: TestDate,
}

impl Default for HealthRecord {
    fn default() -> Self {
        HealthRecord {
            category: Category::LowRisk,
            last_test: TestDate::NeverTested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub age: u8,
    pub address: String,
    pub phone: String,
    pub id_number: String,
    pub health: HealthRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: Category,
    pub count: usize,
}
