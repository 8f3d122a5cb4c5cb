use std::io;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::date::TestDate;
use crate::error::{IntegrityError, StoreError};
use crate::input::parse_age;
use crate::models::{Category, HealthRecord, UserRecord};

pub const FIELD_COUNT: usize = 9;
pub const DEFAULT_AGE: u8 = 25;

/// All user records, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<UserRecord>,
}

/// A stored value that was replaced by a safe default, or a line that was
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityWarning {
    pub line: u64,
    pub issue: IntegrityError,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub store: RecordStore,
    pub warnings: Vec<IntegrityWarning>,
    pub skipped: usize,
}

pub struct PasswordChange {
    pub old: String,
    pub new: String,
}

#[derive(Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub age: Option<u8>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub id_number: Option<String>,
    pub username: Option<String>,
    pub password: Option<PasswordChange>,
}

impl RecordStore {
    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&UserRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut UserRecord> {
        self.records.get_mut(index)
    }

    fn username_taken(&self, username: &str, except: Option<usize>) -> bool {
        self.records
            .iter()
            .enumerate()
            .any(|(index, user)| user.username == username && Some(index) != except)
    }

    /// Adds a new account. Usernames are unique.
    pub fn register(&mut self, user: UserRecord) -> Result<usize, StoreError> {
        require_non_empty("username", &user.username)?;
        require_non_empty("password", &user.password)?;
        for (field, value) in [
            ("full name", &user.full_name),
            ("address", &user.address),
            ("phone", &user.phone),
            ("id number", &user.id_number),
        ] {
            require_storable(field, value)?;
        }

        if self.username_taken(&user.username, None) {
            return Err(StoreError::UsernameTaken(user.username));
        }

        tracing::info!(username = %user.username, "registered user");
        self.records.push(user);
        Ok(self.records.len() - 1)
    }

    /// Returns the index of the matching account.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<usize, StoreError> {
        self.records
            .iter()
            .position(|user| user.username == username && user.password == password)
            .ok_or(StoreError::InvalidCredentials)
    }

    /// Applies every requested field change or none of them. Returns the
    /// names of the fields that were updated.
    pub fn update_profile(
        &mut self,
        index: usize,
        update: ProfileUpdate,
    ) -> Result<Vec<&'static str>, StoreError> {
        if let Some(username) = &update.username {
            require_non_empty("username", username)?;
            if self.username_taken(username, Some(index)) {
                return Err(StoreError::UsernameTaken(username.clone()));
            }
        }
        for (field, value) in [
            ("full name", &update.full_name),
            ("address", &update.address),
            ("phone", &update.phone),
            ("id number", &update.id_number),
        ] {
            if let Some(value) = value {
                require_storable(field, value)?;
            }
        }

        let user = self
            .records
            .get_mut(index)
            .ok_or(StoreError::InvalidCredentials)?;

        if let Some(change) = &update.password {
            if change.old != user.password {
                return Err(StoreError::IncorrectPassword);
            }
            require_non_empty("password", &change.new)?;
        }

        let mut changed = Vec::new();
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
            changed.push("name");
        }
        if let Some(age) = update.age {
            user.age = age;
            changed.push("age");
        }
        if let Some(address) = update.address {
            user.address = address;
            changed.push("address");
        }
        if let Some(phone) = update.phone {
            user.phone = phone;
            changed.push("phone");
        }
        if let Some(id_number) = update.id_number {
            user.id_number = id_number;
            changed.push("IC/passport");
        }
        if let Some(username) = update.username {
            user.username = username;
            changed.push("username");
        }
        if let Some(change) = update.password {
            user.password = change.new;
            changed.push("password");
        }

        Ok(changed)
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::EmptyField { field });
    }
    require_storable(field, value)
}

fn require_storable(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.contains(['|', '\n', '\r']) {
        return Err(StoreError::ForbiddenCharacter { field });
    }
    Ok(())
}

/// Loads the record file. A missing file is an empty store.
pub fn load(path: &Path) -> Result<LoadOutcome, StoreError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no data file found, starting empty");
            return Ok(LoadOutcome::default());
        }
        Err(err) => return Err(err.into()),
    };

    let outcome = read_records(file)?;
    tracing::info!(
        path = %path.display(),
        loaded = outcome.store.len(),
        skipped = outcome.skipped,
        "loaded user records"
    );
    Ok(outcome)
}

pub fn read_records<R: io::Read>(reader: R) -> Result<LoadOutcome, StoreError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut outcome = LoadOutcome::default();

    for result in reader.byte_records() {
        let bytes = result?;
        let line = bytes.position().map(|position| position.line()).unwrap_or(0);

        let row = match StringRecord::from_byte_record(bytes) {
            Ok(row) => row,
            Err(err) => {
                let field = err.utf8_error().field() as u64;
                outcome.skipped += 1;
                outcome.warnings.push(IntegrityWarning {
                    line,
                    issue: IntegrityError::Encoding { field },
                });
                continue;
            }
        };

        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut issues = Vec::new();
        match parse_row(&row, &mut issues) {
            Some(user) => outcome.store.records.push(user),
            None => outcome.skipped += 1,
        }

        outcome
            .warnings
            .extend(issues.into_iter().map(|issue| IntegrityWarning { line, issue }));
    }

    Ok(outcome)
}

/// Builds a user from one stored line, substituting defaults for bad
/// values. Returns `None` when the line cannot be a record at all.
fn parse_row(row: &StringRecord, issues: &mut Vec<IntegrityError>) -> Option<UserRecord> {
    if row.len() != FIELD_COUNT {
        issues.push(IntegrityError::FieldCount {
            expected: FIELD_COUNT,
            found: row.len(),
        });
        return None;
    }

    let field = |index: usize| row.get(index).unwrap_or_default().to_string();

    let age = parse_age(&field(3)).unwrap_or_else(|_| {
        issues.push(IntegrityError::Age(field(3)));
        DEFAULT_AGE
    });

    let category = Category::parse_code(&field(7)).unwrap_or_else(|issue| {
        issues.push(issue);
        Category::LowRisk
    });

    let last_test = TestDate::parse_stored(&field(8)).unwrap_or_else(|source| {
        issues.push(IntegrityError::TestDate {
            value: field(8),
            source,
        });
        TestDate::NeverTested
    });

    Some(UserRecord {
        username: field(0),
        password: field(1),
        full_name: field(2),
        age,
        address: field(4),
        phone: field(5),
        id_number: field(6),
        health: HealthRecord {
            category,
            last_test,
        },
    })
}

/// Rewrites the record file through a sibling temp file, so a failed write
/// leaves the previous contents in place.
pub fn save(path: &Path, store: &RecordStore) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    write_records(&mut staged, store)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    tracing::info!(path = %path.display(), saved = store.len(), "saved user records");
    Ok(())
}

pub fn write_records<W: io::Write>(writer: W, store: &RecordStore) -> Result<(), StoreError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    for user in store.records() {
        let age = user.age.to_string();
        let category = user.health.category.code().to_string();
        let test_date = user.health.last_test.to_string();
        writer.write_record([
            user.username.as_str(),
            user.password.as_str(),
            user.full_name.as_str(),
            age.as_str(),
            user.address.as_str(),
            user.phone.as_str(),
            user.id_number.as_str(),
            category.as_str(),
            test_date.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::CalendarDate;

    fn sample_user(username: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password: "secret".to_string(),
            full_name: "Avery Lee".to_string(),
            age: 34,
            address: "12 Jalan Ampang".to_string(),
            phone: "012-3456789".to_string(),
            id_number: "900101-14-5678".to_string(),
            health: HealthRecord::default(),
        }
    }

    fn load_text(text: &str) -> LoadOutcome {
        read_records(text.as_bytes()).unwrap()
    }

    #[test]
    fn reads_well_formed_lines() {
        let outcome = load_text(
            "avery|pw|Avery Lee|34|12 Jalan Ampang|0123|9001|4|3/7/2026\n\
             jules|pw|Jules Moreno|29|Block C|0456|9002|0|00/00/0000\n",
        );

        assert!(outcome.warnings.is_empty());
        let records = outcome.store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].health.category, Category::Positive);
        assert_eq!(
            records[0].health.last_test,
            TestDate::Tested(CalendarDate::new(3, 7, 2026).unwrap())
        );
        assert_eq!(records[1].health.last_test, TestDate::NeverTested);
    }

    #[test]
    fn bad_category_code_falls_back_to_low_risk() {
        let outcome = load_text("avery|pw|Avery|34|addr|0123|9001|7|01/10/2026\n");
        assert_eq!(outcome.store.records()[0].health.category, Category::LowRisk);
        assert_eq!(
            outcome.warnings,
            vec![IntegrityWarning {
                line: 1,
                issue: IntegrityError::CategoryCode("7".to_string()),
            }]
        );
    }

    #[test]
    fn bad_date_falls_back_to_never_tested() {
        let outcome = load_text("avery|pw|Avery|34|addr|0123|9001|2|31/02/2026\n");
        assert_eq!(
            outcome.store.records()[0].health.last_test,
            TestDate::NeverTested
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0].issue,
            IntegrityError::TestDate { .. }
        ));
    }

    #[test]
    fn bad_age_falls_back_to_default() {
        let outcome = load_text("avery|pw|Avery|old|addr|0123|9001|0|00/00/0000\n");
        assert_eq!(outcome.store.records()[0].age, DEFAULT_AGE);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn wrong_field_count_skips_line() {
        let outcome = load_text(
            "avery|pw|Avery|34|addr|0123|9001|0\n\
             \n\
             jules|pw|Jules|29|addr|0456|9002|1|02/10/2026\n",
        );
        assert_eq!(outcome.store.len(), 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.store.records()[0].username, "jules");
        assert_eq!(
            outcome.warnings[0].issue,
            IntegrityError::FieldCount {
                expected: FIELD_COUNT,
                found: 8
            }
        );
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut bytes = b"avery|pw|Avery|34|addr|0123|9001|0|00/00/0000\n".to_vec();
        bytes.extend_from_slice(b"jules|pw|J\xffles|29|addr|0456|9002|1|02/10/2026\n");
        bytes.extend_from_slice(b"kiara|pw|Kiara|22|addr|0789|9003|4|03/10/2026\n");

        let outcome = read_records(bytes.as_slice()).unwrap();
        let usernames: Vec<&str> = outcome
            .store
            .records()
            .iter()
            .map(|user| user.username.as_str())
            .collect();
        assert_eq!(usernames, vec!["avery", "kiara"]);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(
            outcome.warnings,
            vec![IntegrityWarning {
                line: 2,
                issue: IntegrityError::Encoding { field: 2 },
            }]
        );
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userdata.txt");
        std::fs::write(&path, "stale|line\n").unwrap();

        let mut store = RecordStore::default();
        store.register(sample_user("avery")).unwrap();
        save(&path, &store).unwrap();

        assert_eq!(load(&path).unwrap().store, store);
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load(&dir.path().join("userdata.txt")).unwrap();
        assert!(outcome.store.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn save_then_load_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userdata.txt");

        let mut store = RecordStore::default();
        let mut tested = sample_user("avery");
        tested.health = HealthRecord {
            category: Category::CloseContact,
            last_test: TestDate::Tested(CalendarDate::new(9, 10, 2026).unwrap()),
        };
        store.register(tested).unwrap();
        store.register(sample_user("jules")).unwrap();

        save(&path, &store).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "avery|secret|Avery Lee|34|12 Jalan Ampang|012-3456789|900101-14-5678|3|09/10/2026\n"
        ));
        assert!(text.contains("|0|00/00/0000\n"));

        let reloaded = load(&path).unwrap();
        assert!(reloaded.warnings.is_empty());
        assert_eq!(reloaded.store, store);
    }

    #[test]
    fn register_rejects_duplicates_and_delimiters() {
        let mut store = RecordStore::default();
        store.register(sample_user("avery")).unwrap();

        assert!(matches!(
            store.register(sample_user("avery")),
            Err(StoreError::UsernameTaken(_))
        ));

        let mut piped = sample_user("jules");
        piped.address = "Block C | Level 3".to_string();
        assert!(matches!(
            store.register(piped),
            Err(StoreError::ForbiddenCharacter { field: "address" })
        ));

        assert!(matches!(
            store.register(sample_user("  ")),
            Err(StoreError::EmptyField { field: "username" })
        ));
    }

    #[test]
    fn authenticate_matches_both_fields() {
        let mut store = RecordStore::default();
        store.register(sample_user("avery")).unwrap();
        store.register(sample_user("jules")).unwrap();

        assert_eq!(store.authenticate("jules", "secret").unwrap(), 1);
        assert!(matches!(
            store.authenticate("jules", "wrong"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn profile_update_checks_username_and_password() {
        let mut store = RecordStore::default();
        store.register(sample_user("avery")).unwrap();
        let jules = store.register(sample_user("jules")).unwrap();

        let taken = ProfileUpdate {
            username: Some("avery".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            store.update_profile(jules, taken),
            Err(StoreError::UsernameTaken(_))
        ));

        let wrong_password = ProfileUpdate {
            full_name: Some("Jules M.".to_string()),
            password: Some(PasswordChange {
                old: "nope".to_string(),
                new: "fresh".to_string(),
            }),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            store.update_profile(jules, wrong_password),
            Err(StoreError::IncorrectPassword)
        ));
        assert_eq!(store.get(jules).unwrap().full_name, "Avery Lee");

        let update = ProfileUpdate {
            age: Some(41),
            username: Some("jules.m".to_string()),
            password: Some(PasswordChange {
                old: "secret".to_string(),
                new: "fresh".to_string(),
            }),
            ..ProfileUpdate::default()
        };
        let changed = store.update_profile(jules, update).unwrap();
        assert_eq!(changed, vec!["age", "username", "password"]);
        assert_eq!(store.authenticate("jules.m", "fresh").unwrap(), jules);
        assert_eq!(store.get(jules).unwrap().age, 41);
    }
}
