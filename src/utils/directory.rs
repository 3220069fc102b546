#![forbid(unsafe_code)]

use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::utils::dir_types::{text, User, UserInput};

// ***************************************************************************
//                                  Errors
// ***************************************************************************
/// Failures reported by directory operations.  Callers map these to
/// HTTP responses; none of them affect anything beyond the current request.
#[derive(Error, Debug, PartialEq)]
pub enum DirectoryError {
    #[error("not found")]
    NotFound(String),

    #[error("duplicate email")]
    DuplicateEmail(String),

    #[error("user directory lock poisoned")]
    LockPoisoned,
}

// ***************************************************************************
//                              UserDirectory
// ***************************************************************************
/** The in-memory user directory.  A single mutex guards the whole collection
 * so that requests handled on different runtime threads see each operation
 * as one indivisible step.  Collection order is insertion order.
 */
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: Mutex<Vec<User>>,
}

impl UserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the two start-up records.
    pub fn with_seed_users() -> Self {
        Self { users: Mutex::new(seed_users()) }
    }

    // ---------------------------------------------------------------------------
    // list:
    // ---------------------------------------------------------------------------
    pub fn list(&self) -> Result<Vec<User>, DirectoryError> {
        Ok(self.lock()?.clone())
    }

    // ---------------------------------------------------------------------------
    // get:
    // ---------------------------------------------------------------------------
    pub fn get(&self, id: &str) -> Result<User, DirectoryError> {
        self.lock()?
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }

    // ---------------------------------------------------------------------------
    // create:
    // ---------------------------------------------------------------------------
    /** Append a new record with a freshly generated id.  The collection is
     * left untouched if the email is already in use.
     */
    pub fn create(&self, input: UserInput) -> Result<User, DirectoryError> {
        let mut users = self.lock()?;
        if let Some(email) = email_in_use(&users, text(&input.email), None) {
            return Err(DirectoryError::DuplicateEmail(email));
        }

        let user = User::from_input(new_user_id(&users), input);
        users.push(user.clone());
        Ok(user)
    }

    // ---------------------------------------------------------------------------
    // update:
    // ---------------------------------------------------------------------------
    /** Replace the whole record in place.  The stored id is always the one
     * passed in, and fields missing from the input are dropped.  A record may
     * keep its own email.
     */
    pub fn update(&self, id: &str, input: UserInput) -> Result<User, DirectoryError> {
        let mut users = self.lock()?;
        let index = users.iter()
                         .position(|u| u.id == id)
                         .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;
        if let Some(email) = email_in_use(&users, text(&input.email), Some(id)) {
            return Err(DirectoryError::DuplicateEmail(email));
        }

        let user = User::from_input(id.to_string(), input);
        users[index] = user.clone();
        Ok(user)
    }

    // ---------------------------------------------------------------------------
    // delete:
    // ---------------------------------------------------------------------------
    pub fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        let mut users = self.lock()?;
        let index = users.iter()
                         .position(|u| u.id == id)
                         .ok_or_else(|| DirectoryError::NotFound(id.to_string()))?;

        // Vec::remove shifts the tail, preserving order.
        users.remove(index);
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // search:
    // ---------------------------------------------------------------------------
    /** Return every record whose name, email, phone or address contains the
     * query, ignoring case except on phone.  An empty or absent query returns
     * the whole collection.
     */
    pub fn search(&self, query: Option<&str>) -> Result<Vec<User>, DirectoryError> {
        let users = self.lock()?;
        let query_lc = match query {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return Ok(users.clone()),
        };

        Ok(users.iter().filter(|u| u.matches(&query_lc)).cloned().collect())
    }

    // ---------------------------------------------------------------------------
    // lock:
    // ---------------------------------------------------------------------------
    fn lock(&self) -> Result<MutexGuard<'_, Vec<User>>, DirectoryError> {
        self.users.lock().map_err(|_| DirectoryError::LockPoisoned)
    }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// email_in_use:
// ---------------------------------------------------------------------------
/** Return the email if a record other than `exclude_id` already has it.
 * Only string emails take part; absent or non-string emails never collide.
 */
fn email_in_use(users: &[User], email: Option<&str>, exclude_id: Option<&str>) -> Option<String> {
    let email = email?;
    users.iter()
         .filter(|u| Some(u.id.as_str()) != exclude_id)
         .any(|u| text(&u.email) == Some(email))
         .then(|| email.to_string())
}

// ---------------------------------------------------------------------------
// new_user_id:
// ---------------------------------------------------------------------------
fn new_user_id(users: &[User]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !users.iter().any(|u| u.id == id) {
            return id;
        }
    }
}

// ---------------------------------------------------------------------------
// seed_users:
// ---------------------------------------------------------------------------
fn seed_users() -> Vec<User> {
    vec![
        User::from_input("1".to_string(), UserInput::new(
            "João Silva",
            "joao@exemplo.com",
            "(11) 98765-4321",
            28,
            "Masculino",
            "Av. Paulista, 1000 - São Paulo, SP",
        )),
        User::from_input("2".to_string(), UserInput::new(
            "Maria Oliveira",
            "maria@exemplo.com",
            "(21) 99876-5432",
            35,
            "Feminino",
            "Rua Copacabana, 500 - Rio de Janeiro, RJ",
        )),
    ]
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn input(name: &str, email: &str) -> UserInput {
        UserInput::new(name, email, "(31) 91234-5678", 40, "Outro", "Rua Tiradentes, 10 - Belo Horizonte, MG")
    }

    fn ids(users: &[User]) -> Vec<String> {
        users.iter().map(|u| u.id.clone()).collect()
    }

    #[test]
    fn seed_state() {
        let dir = UserDirectory::with_seed_users();
        let users = dir.list().unwrap();
        assert_eq!(ids(&users), vec!["1", "2"]);
        assert_eq!(text(&users[1].name), Some("Maria Oliveira"));
        assert!(UserDirectory::new().list().unwrap().is_empty());
    }

    #[test]
    fn create_then_get() {
        let dir = UserDirectory::with_seed_users();
        let rec = input("Ana Souza", "ana@exemplo.com");
        let created = dir.create(rec.clone()).unwrap();

        assert!(!created.id.is_empty());
        assert_ne!(created.id, "1");
        assert_ne!(created.id, "2");
        assert_eq!(created, User::from_input(created.id.clone(), rec));
        assert_eq!(dir.get(&created.id).unwrap(), created);

        // Appended at the end.
        let users = dir.list().unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[2].id, created.id);
    }

    #[test]
    fn create_ids_are_unique() {
        let dir = UserDirectory::new();
        let a = dir.create(input("A", "a@x.com")).unwrap();
        let b = dir.create(input("B", "b@x.com")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn create_duplicate_email_leaves_collection_unchanged() {
        let dir = UserDirectory::with_seed_users();
        let before = dir.list().unwrap();
        let err = dir.create(input("X", "joao@exemplo.com")).unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateEmail("joao@exemplo.com".to_string()));
        assert_eq!(err.to_string(), "duplicate email");
        assert_eq!(dir.list().unwrap(), before);
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let dir = UserDirectory::with_seed_users();
        assert!(dir.create(input("X", "JOAO@exemplo.com")).is_ok());
    }

    #[test]
    fn records_without_email_do_not_collide() {
        let dir = UserDirectory::new();
        dir.create(UserInput::default()).unwrap();
        dir.create(UserInput::default()).unwrap();
        assert_eq!(dir.list().unwrap().len(), 2);
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = UserDirectory::with_seed_users();
        let err = dir.get("99").unwrap_err();
        assert_eq!(err, DirectoryError::NotFound("99".to_string()));
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn update_replaces_whole_record() {
        let dir = UserDirectory::with_seed_users();
        let payload = UserInput {
            name: Some(json!("João S.")),
            email: Some(json!("new@x.com")),
            ..Default::default()
        };
        let updated = dir.update("1", payload.clone()).unwrap();
        assert_eq!(updated, User::from_input("1".to_string(), payload));

        // No merge: the seeded phone, age, gender and address are gone.
        let fetched = dir.get("1").unwrap();
        assert_eq!(fetched.id, "1");
        assert_eq!(text(&fetched.email), Some("new@x.com"));
        assert_eq!(fetched.phone, None);
        assert_eq!(fetched.age, None);
        assert_eq!(fetched.address, None);

        // Position is kept.
        assert_eq!(ids(&dir.list().unwrap()), vec!["1", "2"]);
    }

    #[test]
    fn update_own_email_succeeds() {
        let dir = UserDirectory::with_seed_users();
        let updated = dir.update("2", input("Maria O.", "maria@exemplo.com")).unwrap();
        assert_eq!(text(&updated.name), Some("Maria O."));
    }

    #[test]
    fn update_other_users_email_fails() {
        let dir = UserDirectory::with_seed_users();
        let before = dir.list().unwrap();
        let err = dir.update("2", input("Maria", "joao@exemplo.com")).unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateEmail("joao@exemplo.com".to_string()));
        assert_eq!(dir.list().unwrap(), before);
    }

    #[test]
    fn update_missing_is_not_found() {
        let dir = UserDirectory::with_seed_users();
        let err = dir.update("42", input("X", "x@x.com")).unwrap_err();
        assert_eq!(err, DirectoryError::NotFound("42".to_string()));
    }

    #[test]
    fn delete_removes_and_preserves_order() {
        let dir = UserDirectory::with_seed_users();
        let c = dir.create(input("C", "c@x.com")).unwrap();
        dir.delete("2").unwrap();

        assert_eq!(dir.get("2").unwrap_err(), DirectoryError::NotFound("2".to_string()));
        assert_eq!(ids(&dir.list().unwrap()), vec!["1".to_string(), c.id]);
        assert_eq!(dir.delete("2").unwrap_err(), DirectoryError::NotFound("2".to_string()));
    }

    #[test]
    fn empty_or_absent_search_equals_list() {
        let dir = UserDirectory::with_seed_users();
        let all = dir.list().unwrap();
        assert_eq!(dir.search(None).unwrap(), all);
        assert_eq!(dir.search(Some("")).unwrap(), all);
    }

    #[test]
    fn search_is_case_insensitive() {
        let dir = UserDirectory::with_seed_users();
        assert_eq!(ids(&dir.search(Some("maria")).unwrap()), vec!["2"]);
        assert_eq!(ids(&dir.search(Some("JOAO@")).unwrap()), vec!["1"]);
        assert_eq!(ids(&dir.search(Some("PAULISTA")).unwrap()), vec!["1"]);
    }

    #[test]
    fn search_rio_matches_address_only_on_user_2() {
        let dir = UserDirectory::with_seed_users();
        assert_eq!(ids(&dir.search(Some("rio")).unwrap()), vec!["2"]);
    }

    #[test]
    fn search_phone_and_order() {
        let dir = UserDirectory::with_seed_users();
        assert_eq!(ids(&dir.search(Some("98765")).unwrap()), vec!["1"]);
        assert_eq!(ids(&dir.search(Some("exemplo.com")).unwrap()), vec!["1", "2"]);
        assert!(dir.search(Some("zzz")).unwrap().is_empty());
    }

    #[test]
    fn search_skips_absent_fields() {
        let dir = UserDirectory::new();
        dir.create(UserInput { name: Some(json!("Carla")), ..Default::default() }).unwrap();
        assert_eq!(dir.search(Some("carla")).unwrap().len(), 1);
        assert!(dir.search(Some("rua")).unwrap().is_empty());
    }

    #[test]
    fn opaque_attributes_are_stored_as_sent() {
        let dir = UserDirectory::new();
        let rec = UserInput {
            name: Some(json!(123)),
            phone: Some(json!(11987654321_i64)),
            age: Some(json!("28")),
            gender: Some(json!(null)),
            ..Default::default()
        };
        let created = dir.create(rec.clone()).unwrap();
        assert_eq!(dir.get(&created.id).unwrap(), User::from_input(created.id.clone(), rec));
    }

    #[test]
    fn non_string_emails_do_not_collide() {
        let dir = UserDirectory::new();
        dir.create(UserInput { email: Some(json!(1)), ..Default::default() }).unwrap();
        dir.create(UserInput { email: Some(json!(1)), ..Default::default() }).unwrap();
        dir.create(UserInput { email: Some(json!("1")), ..Default::default() }).unwrap();
        assert_eq!(dir.list().unwrap().len(), 3);
    }

    #[test]
    fn parallel_creates_are_all_kept() {
        const WORKERS: usize = 16;
        let dir = Arc::new(UserDirectory::with_seed_users());

        let handles: Vec<_> = (0..WORKERS).map(|i| {
            let dir = Arc::clone(&dir);
            thread::spawn(move || dir.create(input("Worker", &format!("worker{}@x.com", i))))
        }).collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }

        let mut all = ids(&dir.list().unwrap());
        assert_eq!(all.len(), WORKERS + 2);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), WORKERS + 2);
    }

    #[test]
    fn parallel_creates_with_one_email_admit_one() {
        const WORKERS: usize = 16;
        let dir = Arc::new(UserDirectory::with_seed_users());

        let handles: Vec<_> = (0..WORKERS).map(|_| {
            let dir = Arc::clone(&dir);
            thread::spawn(move || dir.create(input("Same", "same@x.com")))
        }).collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter()
                          .filter(|r| matches!(r, Err(DirectoryError::DuplicateEmail(_))))
                          .count(), WORKERS - 1);
        assert_eq!(dir.list().unwrap().len(), 3);
    }
}
