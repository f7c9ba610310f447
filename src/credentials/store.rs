//! Durable credential storage using SQLite.
//!
//! Holds exactly one record, addressed by a fixed key. Tokens are sealed
//! with AES-256-GCM before hitting disk.

use super::{encryption, Credential};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Fixed key of the single credential record
const RECORD_KEY: &str = "current";

/// Single-record credential persistence backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE credential (
///     id TEXT PRIMARY KEY,
///     access_token TEXT NOT NULL,   -- Sealed (nonce || ciphertext, base64)
///     id_token TEXT,                -- Sealed (optional)
///     expires_at TEXT,              -- ISO 8601 timestamp (optional)
///     updated_at TEXT NOT NULL      -- ISO 8601 timestamp
/// );
/// ```
///
/// # Thread Safety
/// The connection is wrapped in a Mutex; SQLite itself runs in serialized
/// mode.
pub struct CredentialStore {
    conn: Mutex<Connection>,
    encryption_key: Vec<u8>,
}

impl CredentialStore {
    /// Creates or opens a credential store.
    ///
    /// # Arguments
    /// * `db_path` - Path to SQLite database file
    /// * `encryption_key` - Base64-encoded 32-byte master key
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let key_bytes =
            encryption::validate_key(encryption_key).context("Invalid encryption key")?;

        let conn = Connection::open(db_path).context("Failed to open database")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS credential (
                id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                id_token TEXT,
                expires_at TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create credential table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            encryption_key: key_bytes,
        })
    }

    /// Writes the credential record, replacing any prior one entirely.
    pub fn put(&self, credential: &Credential) -> Result<()> {
        let access_token = encryption::seal(&credential.access_token, &self.encryption_key)
            .context("Failed to seal access token")?;

        let id_token = credential
            .id_token
            .as_deref()
            .map(|token| encryption::seal(token, &self.encryption_key))
            .transpose()
            .context("Failed to seal id token")?;

        let expires_at = credential.expires_at.map(|dt| dt.to_rfc3339());
        let updated_at = credential.updated_at.to_rfc3339();

        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO credential (id, access_token, id_token, expires_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    access_token = excluded.access_token,
                    id_token = excluded.id_token,
                    expires_at = excluded.expires_at,
                    updated_at = excluded.updated_at
                "#,
                params![RECORD_KEY, access_token, id_token, expires_at, updated_at],
            )
            .context("Failed to store credential")?;

        Ok(())
    }

    /// Reads the credential record, if one has been stored.
    pub fn get(&self) -> Result<Option<Credential>> {
        let conn = self.conn.lock().unwrap();

        let row = conn
            .query_row(
                "SELECT access_token, id_token, expires_at, updated_at FROM credential WHERE id = ?1",
                params![RECORD_KEY],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .context("Failed to read credential")?;

        let Some((access_token, id_token, expires_at, updated_at)) = row else {
            return Ok(None);
        };

        let access_token = encryption::open(&access_token, &self.encryption_key)
            .context("Failed to open sealed access token")?;

        let id_token = id_token
            .as_deref()
            .map(|sealed| encryption::open(sealed, &self.encryption_key))
            .transpose()
            .context("Failed to open sealed id token")?;

        let expires_at = expires_at
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .context("Failed to parse expires_at timestamp")?;

        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .context("Failed to parse updated_at timestamp")?;

        Ok(Some(Credential {
            access_token,
            id_token,
            updated_at,
            expires_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use chrono::Duration;

    fn test_key() -> String {
        BASE64.encode([0u8; 32])
    }

    fn create_test_store() -> CredentialStore {
        CredentialStore::new(":memory:", &test_key()).expect("Failed to create test store")
    }

    fn create_test_credential() -> Credential {
        Credential {
            access_token: "access-token-12345".to_string(),
            id_token: Some("id-token-67890".to_string()),
            updated_at: Utc::now(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = create_test_store();
        let cred = create_test_credential();

        store.put(&cred).expect("Failed to store");

        let retrieved = store
            .get()
            .expect("Failed to get")
            .expect("Credential not found");

        assert_eq!(retrieved.access_token, cred.access_token);
        assert_eq!(retrieved.id_token, cred.id_token);
        assert!(retrieved.expires_at.is_some());
    }

    #[test]
    fn test_get_empty_store() {
        let store = create_test_store();

        let result = store.get().expect("Failed to get");
        assert!(result.is_none());
    }

    #[test]
    fn test_put_replaces_prior_record() {
        let store = create_test_store();

        let first = create_test_credential();
        store.put(&first).unwrap();

        // Second save carries no id_token and no expiry; nothing from the
        // first record may survive
        let second = Credential {
            access_token: "new-access-token".to_string(),
            id_token: None,
            updated_at: Utc::now(),
            expires_at: None,
        };
        store.put(&second).unwrap();

        let retrieved = store.get().unwrap().unwrap();
        assert_eq!(retrieved.access_token, "new-access-token");
        assert!(retrieved.id_token.is_none());
        assert!(retrieved.expires_at.is_none());
    }

    #[test]
    fn test_credential_without_optional_fields() {
        let store = create_test_store();
        let cred = Credential {
            access_token: "access-only".to_string(),
            id_token: None,
            updated_at: Utc::now(),
            expires_at: None,
        };

        store.put(&cred).unwrap();

        let retrieved = store.get().unwrap().unwrap();
        assert_eq!(retrieved.access_token, "access-only");
        assert!(retrieved.id_token.is_none());
        assert!(retrieved.expires_at.is_none());
    }

    #[test]
    fn test_tokens_sealed_at_rest() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("credentials.db");

        let store = CredentialStore::new(&db_path, &test_key()).unwrap();
        store.put(&create_test_credential()).unwrap();
        drop(store);

        // The raw database file must not contain the plaintext token
        let raw = std::fs::read(&db_path).unwrap();
        let needle = b"access-token-12345";
        let found = raw.windows(needle.len()).any(|w| w == needle);
        assert!(!found);
    }

    #[test]
    fn test_wrong_key_fails_to_read() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("credentials.db");

        let store = CredentialStore::new(&db_path, &test_key()).unwrap();
        store.put(&create_test_credential()).unwrap();
        drop(store);

        let other_key = BASE64.encode([1u8; 32]);
        let reopened = CredentialStore::new(&db_path, &other_key).unwrap();
        assert!(reopened.get().is_err());
    }

    #[test]
    fn test_invalid_encryption_key() {
        // Too short
        let short = BASE64.encode([0u8; 16]);
        assert!(CredentialStore::new(":memory:", &short).is_err());

        // Invalid base64
        assert!(CredentialStore::new(":memory:", "not-valid-base64!@#$").is_err());
    }
}
