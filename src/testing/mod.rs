//! In-memory collaborators for exercising the account workflow and the router without
//! Postgres or a mail provider.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard};

use crate::auth::Clock;
use crate::database::{DatabaseError, Folder, FolderStore, NewUser, User, UserStore};
use crate::mail::{MailError, Mailer};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct UserTable {
    rows: Vec<User>,
    next_id: i64,
}

/// `UserStore` over a vector, with the same conditional-update semantics as `PgUserStore`
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: Mutex<UserTable>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.table).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_by_email(&self, email: &str) -> Option<User> {
        lock(&self.table).rows.iter().find(|u| u.email == email).cloned()
    }

    /// Insert a row as-is, assigning the next id
    pub fn insert(&self, mut user: User) -> User {
        let mut table = lock(&self.table);
        table.next_id += 1;
        user.id = table.next_id;
        table.rows.push(user.clone());
        user
    }

    pub fn remove(&self, email: &str) {
        lock(&self.table).rows.retain(|u| u.email != email);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.get_by_email(email))
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        if self.get_by_email(&user.email).is_some() {
            return Err(DatabaseError::Conflict(format!("user '{}'", user.email)));
        }

        Ok(self.insert(User {
            id: 0,
            email: user.email,
            pass_hash: user.pass_hash,
            is_activated: false,
            is_admin: false,
            activation_token: user.activation_token,
        }))
    }

    async fn delete_by_email(&self, email: &str) -> Result<(), DatabaseError> {
        self.remove(email);
        Ok(())
    }

    async fn activate(
        &self,
        id: i64,
        expected_token: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError> {
        let mut table = lock(&self.table);
        match table
            .rows
            .iter_mut()
            .find(|u| u.id == id && u.activation_token == expected_token)
        {
            Some(user) => {
                user.is_activated = true;
                user.activation_token = next_token.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_token(&self, id: i64, token: &str) -> Result<(), DatabaseError> {
        let mut table = lock(&self.table);
        let user = table
            .rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))?;
        user.activation_token = token.to_string();
        Ok(())
    }

    async fn reset_password(
        &self,
        id: i64,
        expected_token: &str,
        pass_hash: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError> {
        let mut table = lock(&self.table);
        match table
            .rows
            .iter_mut()
            .find(|u| u.id == id && u.activation_token == expected_token)
        {
            Some(user) => {
                user.pass_hash = pass_hash.to_string();
                user.activation_token = next_token.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Debug, Default)]
struct FolderTable {
    rows: Vec<Folder>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryFolderStore {
    table: Mutex<FolderTable>,
}

impl MemoryFolderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn list(&self) -> Result<Vec<Folder>, DatabaseError> {
        Ok(lock(&self.table).rows.clone())
    }

    async fn find(&self, id: i64) -> Result<Option<Folder>, DatabaseError> {
        Ok(lock(&self.table).rows.iter().find(|f| f.id == id).cloned())
    }

    async fn create(
        &self,
        owner_id: i64,
        name: &str,
        pass_hash: Option<String>,
    ) -> Result<Folder, DatabaseError> {
        let mut table = lock(&self.table);
        if table.rows.iter().any(|f| f.name == name) {
            return Err(DatabaseError::Conflict(format!("folder '{}'", name)));
        }

        table.next_id += 1;
        let folder = Folder {
            id: table.next_id,
            owner_id,
            name: name.to_string(),
            is_locked: pass_hash.is_some(),
            pass_hash,
        };
        table.rows.push(folder.clone());
        Ok(folder)
    }

    async fn delete_owned(&self, id: i64, owner_id: i64) -> Result<bool, DatabaseError> {
        let mut table = lock(&self.table);
        let before = table.rows.len();
        table.rows.retain(|f| !(f.id == id && f.owner_id == owner_id));
        Ok(table.rows.len() < before)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

/// Keeps every accepted message for inspection
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        lock(&self.sent).clone()
    }

    pub fn last_to(&self, recipient: &str) -> Option<SentMail> {
        lock(&self.sent)
            .iter()
            .rev()
            .find(|m| m.recipients.iter().any(|r| r == recipient))
            .cloned()
    }

    /// Composite `<id>_<token>` from the latest mail to `recipient`
    pub fn last_token_for(&self, recipient: &str) -> Option<String> {
        self.last_to(recipient).map(|m| m.plain_body)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_email(
        &self,
        recipients: &[String],
        subject: &str,
        plain_body: &str,
        html_body: &str,
    ) -> Result<(), MailError> {
        lock(&self.sent).push(SentMail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            plain_body: plain_body.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Rejects every message
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_email(
        &self,
        recipients: &[String],
        _subject: &str,
        _plain_body: &str,
        _html_body: &str,
    ) -> Result<(), MailError> {
        Err(MailError::Rejected {
            recipient: recipients.join(","),
            status: 503,
            body: "mail provider unavailable".to_string(),
        })
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now = *now + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}
