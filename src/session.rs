//! Session persistence.
//!
//! A session is the bearer token plus the signed-in user's profile. It is
//! stored as two plaintext keys (`token` and `user`) in a small SQLite
//! key-value table, and lives until the user logs out.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Roles the hospital API hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Pharmacist,
    Laboratorist,
    /// Card office / cashier staff.
    Card,
    /// A patient account.
    User,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Pharmacist,
        Role::Laboratorist,
        Role::Card,
        Role::User,
    ];

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "pharmacist" => Some(Role::Pharmacist),
            "laboratorist" => Some(Role::Laboratorist),
            "card" => Some(Role::Card),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Pharmacist => "pharmacist",
            Role::Laboratorist => "laboratorist",
            Role::Card => "card",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the signed-in user as returned by `/auth/login`.
///
/// `role` stays a raw string so an unexpected value from the server does not
/// make the whole profile unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub role: String,
    pub department: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub image: String,
}

impl UserProfile {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        self.user.role()
    }
}

/// Storage backend for the current session.
pub trait SessionStore {
    fn save(&self, session: &Session) -> Result<()>;
    /// Returns the last saved session, or `None` if nothing usable is stored.
    fn load(&self) -> Result<Option<Session>>;
    fn clear(&self) -> Result<()>;
}

/// Session store backed by a SQLite file.
pub struct SqliteSessionStore {
    path: PathBuf,
}

impl SqliteSessionStore {
    /// Opens (creating if necessary) the session database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        let conn = store.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("Failed to create session table")?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("Failed to open session store {}", self.path.display()))
    }

    fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }
}

impl SessionStore for SqliteSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut conn = self.connect()?;
        let user = serde_json::to_string(&session.user).context("Failed to encode profile")?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![TOKEN_KEY, session.token],
        )?;
        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![USER_KEY, user],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        let conn = self.connect()?;
        let token = Self::get(&conn, TOKEN_KEY)?;
        let user = Self::get(&conn, USER_KEY)?;
        let (Some(token), Some(user)) = (token, user) else {
            return Ok(None);
        };
        match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) => Ok(Some(Session { token, user })),
            Err(e) => {
                warn!(error = %e, "stored profile is unreadable, treating session as absent");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM kv WHERE key IN (?, ?)",
            params![TOKEN_KEY, USER_KEY],
        )?;
        Ok(())
    }
}

/// In-process session store, used by tests.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut slot = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        *slot = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>> {
        let slot = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("session lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_session(role: &str, department: &str) -> Session {
    Session {
        token: format!("token-{role}"),
        user: UserProfile {
            id: "u1".to_string(),
            role: role.to_string(),
            department: department.to_string(),
            first_name: "Abebe".to_string(),
            last_name: "Kebede".to_string(),
            email: format!("{role}@hospital.et"),
            image: String::new(),
        },
    }
}
