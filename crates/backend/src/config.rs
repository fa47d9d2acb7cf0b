use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8800;
const DEFAULT_DB_PATH: &str = "data/pins.redb";
const DEFAULT_DIST_DIR: &str = "dist";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub dist_dir: PathBuf,
    pub bcrypt_cost: u32,
}

impl ServerConfig {
    /// Read `PORT`, `DB_PATH`, `DIST_DIR` and `BCRYPT_COST`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let bcrypt_cost = lookup("BCRYPT_COST")
            .and_then(|v| v.parse().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);
        ServerConfig {
            port,
            db_path: PathBuf::from(lookup("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            dist_dir: PathBuf::from(
                lookup("DIST_DIR").unwrap_or_else(|| DEFAULT_DIST_DIR.to_string()),
            ),
            bcrypt_cost,
        }
    }
}
