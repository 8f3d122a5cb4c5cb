use crate::models::{Category, Questionnaire};

/// Assigns a risk category. The first matching rule wins: a positive result,
/// then close contact, then symptom burden, then travel.
pub fn classify(answers: &Questionnaire) -> Category {
    let symptom_score = answers.symptom_score();

    if answers.test_positive {
        Category::Positive
    } else if answers.has_close_contact {
        Category::CloseContact
    } else if symptom_score >= 2 || (symptom_score >= 1 && answers.has_travel_history) {
        Category::Suspected
    } else if answers.has_travel_history {
        Category::TravelHistory
    } else {
        Category::LowRisk
    }
}
