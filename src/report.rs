use std::fmt::Write;

use crate::date::{CalendarDate, TestDate};
use crate::models::{Category, CategorySummary, UserRecord};
use crate::schedule::{self, Reminder, QUARANTINE_DAYS, TEST_REMINDER_DAYS};
use crate::store::RecordStore;

pub fn recommended_actions(category: Category) -> Vec<String> {
    match category {
        Category::Positive => vec![
            format!("Isolate immediately for {QUARANTINE_DAYS} days"),
            "Notify your supervisor/lecturer".into(),
            "Follow local health authority guidelines".into(),
            "Monitor symptoms closely".into(),
            "Seek medical attention if symptoms worsen".into(),
        ],
        Category::CloseContact => vec![
            format!("Self-quarantine for {TEST_REMINDER_DAYS} days"),
            "Get tested immediately".into(),
            "Monitor for symptoms".into(),
            "Wear a mask around others".into(),
        ],
        Category::Suspected => vec![
            "Self-isolate immediately".into(),
            "Get tested as soon as possible".into(),
            "Rest and monitor symptoms".into(),
            "Avoid contact with others".into(),
        ],
        Category::TravelHistory => vec![
            "Monitor for symptoms for 14 days".into(),
            "Consider getting tested".into(),
            "Follow local quarantine requirements".into(),
        ],
        Category::LowRisk => vec![
            "Continue practicing preventive measures".into(),
            "Wash hands regularly".into(),
            "Wear mask in crowded places".into(),
            "Get tested if you develop symptoms".into(),
        ],
    }
}

fn last_test_label(last_test: TestDate) -> String {
    match last_test {
        TestDate::NeverTested => "Not recorded".to_string(),
        TestDate::Tested(date) => date.to_string(),
    }
}

pub fn render_profile(user: &UserRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "PROFILE INFORMATION");
    let _ = writeln!(output, "===================");
    let _ = writeln!(output);
    let _ = writeln!(output, "Name: {}", user.full_name);
    let _ = writeln!(output, "Age: {}", user.age);
    let _ = writeln!(output, "Address: {}", user.address);
    let _ = writeln!(output, "Phone: {}", user.phone);
    let _ = writeln!(output, "IC/Passport: {}", user.id_number);
    let _ = writeln!(output, "Last Test Date: {}", last_test_label(user.health.last_test));
    let _ = writeln!(output, "Health Category: {}", user.health.category);
    output
}

pub fn render_category(user: &UserRecord, today: CalendarDate) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "HEALTH CATEGORY & RECOMMENDATIONS");
    let _ = writeln!(output, "==================================");
    let _ = writeln!(output);
    let _ = writeln!(output, "Your Category: {}", user.health.category);
    let _ = writeln!(output);
    let _ = writeln!(output, "RECOMMENDED ACTIONS:");
    for (number, action) in recommended_actions(user.health.category).iter().enumerate() {
        let _ = writeln!(output, "{}. {}", number + 1, action);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Last Test Date: {}", last_test_label(user.health.last_test));
    if schedule::needs_retest(&user.health, today) {
        let _ = writeln!(output, "A new test is recommended.");
    }
    output
}

pub fn summarize_by_category(users: &[UserRecord]) -> Vec<CategorySummary> {
    Category::ALL
        .iter()
        .map(|category| CategorySummary {
            category: *category,
            count: users
                .iter()
                .filter(|user| user.health.category == *category)
                .count(),
        })
        .collect()
}

/// Markdown status report across every stored user, as of `today`.
/// Evaluates without modifying the store.
pub fn build_report(store: &RecordStore, today: CalendarDate) -> String {
    let users = store.records();
    let summaries = summarize_by_category(users);

    let mut output = String::new();
    let _ = writeln!(output, "# COVID-19 Health Status Report");
    let _ = writeln!(output, "Generated on {} for {} users", today, users.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Category Mix");

    if store.is_empty() {
        let _ = writeln!(output, "No users registered.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(output, "- {}: {}", summary.category, summary.count);
        }
    }

    let mut retests = Vec::new();
    let mut releases = Vec::new();
    for user in users {
        let evaluation = schedule::evaluate(&user.health, today);
        if evaluation.quarantine_completed {
            releases.push(user);
        }
        match evaluation.reminder {
            Some(Reminder::NeedsInitialTest) => retests.push((user, "never tested".to_string())),
            Some(Reminder::RetestDue { elapsed_days }) => {
                retests.push((user, format!("last test {elapsed_days} days ago")))
            }
            None => {}
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Pending Retests");

    if retests.is_empty() {
        let _ = writeln!(output, "No retest reminders due.");
    } else {
        for (user, detail) in retests.iter() {
            let _ = writeln!(
                output,
                "- {} ({}, {}): {}",
                user.full_name, user.username, user.health.category, detail
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quarantine Releases Due");

    if releases.is_empty() {
        let _ = writeln!(output, "No positive cases past the {QUARANTINE_DAYS}-day window.");
    } else {
        for user in releases.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) tested positive on {}",
                user.full_name,
                user.username,
                last_test_label(user.health.last_test)
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthRecord;

    fn today() -> CalendarDate {
        CalendarDate::new(18, 10, 2026).unwrap()
    }

    fn user(username: &str, category: Category, last_test: TestDate) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password: "pw".to_string(),
            full_name: format!("{username} tester"),
            age: 30,
            address: "Block C".to_string(),
            phone: "0123".to_string(),
            id_number: "9001".to_string(),
            health: HealthRecord {
                category,
                last_test,
            },
        }
    }

    fn tested(days_ago: i64) -> TestDate {
        TestDate::Tested(today().days_ago(days_ago).unwrap())
    }

    #[test]
    fn positive_actions_mention_quarantine_length() {
        let actions = recommended_actions(Category::Positive);
        assert_eq!(actions[0], "Isolate immediately for 7 days");
        assert_eq!(actions.len(), 5);
    }

    #[test]
    fn every_category_has_actions() {
        for category in Category::ALL {
            assert!(!recommended_actions(category).is_empty());
        }
    }

    #[test]
    fn category_view_shows_untested_users() {
        let view = render_category(
            &user("avery", Category::LowRisk, TestDate::NeverTested),
            today(),
        );
        assert!(view.contains("Your Category: Low Risk"));
        assert!(view.contains("Last Test Date: Not recorded"));
        assert!(view.contains("A new test is recommended."));
    }

    #[test]
    fn profile_view_formats_dates() {
        let view = render_profile(&user("avery", Category::Suspected, tested(1)));
        assert!(view.contains("Last Test Date: 17/10/2026"));
        assert!(view.contains("Health Category: Suspected Case"));
    }

    #[test]
    fn summaries_cover_every_category_in_order() {
        let users = vec![
            user("a", Category::Positive, tested(1)),
            user("b", Category::Positive, tested(2)),
            user("c", Category::TravelHistory, tested(1)),
        ];
        let summaries = summarize_by_category(&users);
        assert_eq!(summaries.len(), 5);
        assert_eq!(summaries[0].category, Category::LowRisk);
        assert_eq!(summaries[0].count, 0);
        assert_eq!(summaries[1].count, 1);
        assert_eq!(summaries[4].count, 2);
    }

    #[test]
    fn report_lists_retests_and_releases() {
        let mut store = RecordStore::default();
        store
            .register(user("avery", Category::Positive, tested(9)))
            .unwrap();
        store
            .register(user("jules", Category::LowRisk, tested(4)))
            .unwrap();
        store
            .register(user("kiara", Category::CloseContact, TestDate::NeverTested))
            .unwrap();

        let report = build_report(&store, today());
        assert!(report.contains("Generated on 18/10/2026 for 3 users"));
        assert!(report.contains("- Positive Case: 1"));
        assert!(report.contains("- jules tester (jules, Low Risk): last test 4 days ago"));
        assert!(report.contains("- kiara tester (kiara, Close Contact): never tested"));
        assert!(report.contains("- avery tester (avery) tested positive on 09/10/2026"));
        assert_eq!(store.records()[0].health.category, Category::Positive);
    }

    #[test]
    fn empty_report() {
        let report = build_report(&RecordStore::default(), today());
        assert!(report.contains("No users registered."));
        assert!(report.contains("No retest reminders due."));
    }
}
