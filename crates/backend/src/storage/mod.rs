use pinmap_shared::models::Pin;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const PINS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("pins");
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] redb::DatabaseError),
    #[error(transparent)]
    Transaction(#[from] redb::TransactionError),
    #[error(transparent)]
    Table(#[from] redb::TableError),
    #[error(transparent)]
    Storage(#[from] redb::StorageError),
    #[error(transparent)]
    Commit(#[from] redb::CommitError),
    #[error("corrupt record: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct Storage {
    db: Database,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, StoreError> {
        let db = Database::create(path)?;

        // Ensure tables exist so reads on a fresh file don't fail
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(PINS_TABLE)?;
            write_txn.open_table(USERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Arc::new(Storage { db }))
    }

    pub fn save_pin(&self, pin: &Pin) -> Result<(), StoreError> {
        let json = serde_json::to_vec(pin)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(PINS_TABLE)?;
            table.insert(pin.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every stored pin, oldest first.
    pub fn list_pins(&self) -> Result<Vec<Pin>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PINS_TABLE)?;
        let mut pins = Vec::with_capacity(table.len()? as usize);
        for entry in table.iter()? {
            let (_, value) = entry?;
            pins.push(serde_json::from_slice::<Pin>(value.value())?);
        }
        pins.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pins)
    }

    pub fn get_user(&self, username: &str) -> Result<Option<StoredUser>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        match table.get(username)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert a new account. Returns `false` when the username is taken.
    pub fn insert_user(&self, user: &StoredUser) -> Result<bool, StoreError> {
        let json = serde_json::to_vec(user)?;
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(USERS_TABLE)?;
            let taken = table.get(user.username.as_str())?.is_some();
            if !taken {
                table.insert(user.username.as_str(), json.as_slice())?;
            }
            !taken
        };
        write_txn.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(id: &str, created_at: &str) -> Pin {
        Pin {
            id: id.to_string(),
            username: "alice".to_string(),
            title: "Cafe".to_string(),
            desc: String::new(),
            rating: 4,
            lat: 10.0,
            long: 20.0,
            created_at: created_at.to_string(),
        }
    }

    fn user(username: &str) -> StoredUser {
        StoredUser {
            id: "u1".to_string(),
            username: username.to_string(),
            email: "a@example.com".to_string(),
            password_hash: "hash".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_list_pins_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("pins.redb")).unwrap();
        storage.save_pin(&pin("zzz", "2024-01-01T00:00:00Z")).unwrap();
        storage.save_pin(&pin("aaa", "2024-03-01T00:00:00Z")).unwrap();
        let ids: Vec<String> = storage.list_pins().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["zzz", "aaa"]);
    }

    #[test]
    fn test_empty_database_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("pins.redb")).unwrap();
        assert!(storage.list_pins().unwrap().is_empty());
        assert!(storage.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn test_insert_user_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("pins.redb")).unwrap();
        assert!(storage.insert_user(&user("alice")).unwrap());
        assert!(!storage.insert_user(&user("alice")).unwrap());
        assert_eq!(storage.get_user("alice").unwrap().unwrap().email, "a@example.com");
    }

    #[test]
    fn test_pins_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pins.redb");
        {
            let storage = Storage::open(&path).unwrap();
            storage.save_pin(&pin("p1", "2024-01-01T00:00:00Z")).unwrap();
        }
        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.list_pins().unwrap().len(), 1);
    }
}
