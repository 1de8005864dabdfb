//! Credential storage
//!
//! Platform bearer tokens are kept in `credentials.enc`, a JSON map encrypted
//! with AES-256-GCM. The key is derived from machine-specific identifiers, so
//! the file is useless when copied elsewhere. The layout is a 12 byte nonce
//! followed by the ciphertext.
//!
//! Besides the file store there are two lighter providers: [`EnvCredentials`]
//! reads `CROSSPOST_<PLATFORM>_TOKEN` variables and [`MemoryCredentials`]
//! holds tokens in memory. [`FallbackCredentials`] chains two providers.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::api::CredentialProvider;
use crate::models::PlatformId;
use crate::paths;

const NONCE_SIZE: usize = 12;
const KEY_SALT: &[u8] = b"crosspost-credentials-v1";

/// Prefix of the environment variables read by [`EnvCredentials`]
pub const ENV_PREFIX: &str = "CROSSPOST";

/// Identifier that differs between machines, best effort
fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(candidate) {
                let id = id.trim();
                if !id.is_empty() {
                    return id.to_string();
                }
            }
        }
    }

    dirs::home_dir().map_or_else(
        || "crosspost-fallback-key".to_string(),
        |home| home.to_string_lossy().into_owned(),
    )
}

fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(KEY_SALT);
    hasher.finalize().into()
}

fn cipher() -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(&derive_key()).map_err(|_| anyhow!("Invalid credential key length"))
}

/// Encrypted per-platform token file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the default location
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(paths::credentials_path()?))
    }

    /// Store at `path`; the file is created on first write
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;
        if encrypted.len() < NONCE_SIZE {
            return Ok(BTreeMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let plaintext = cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt credentials"))?;

        serde_json::from_slice(&plaintext).context("Credentials file is corrupt")
    }

    fn save(&self, tokens: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let json = serde_json::to_vec(tokens)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);

        let ciphertext = cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), json.as_slice())
            .map_err(|_| anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);
        fs::write(&self.path, output).context("Failed to write credentials file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credentials file")?;
        }

        Ok(())
    }

    /// Store (or replace) the token for `platform`
    pub fn store_token(&self, platform: PlatformId, token: &str) -> Result<()> {
        let mut tokens = self.load()?;
        tokens.insert(platform.as_str().to_string(), token.to_string());
        self.save(&tokens)?;
        tracing::info!(platform = %platform, "Stored credential");
        Ok(())
    }

    /// Token for `platform`, if any
    pub fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        Ok(self.load()?.remove(platform.as_str()))
    }

    /// Forget the token for `platform`. Returns whether one existed.
    pub fn delete_token(&self, platform: PlatformId) -> Result<bool> {
        let mut tokens = self.load()?;
        let existed = tokens.remove(platform.as_str()).is_some();
        if existed {
            self.save(&tokens)?;
            tracing::info!(platform = %platform, "Deleted credential");
        }
        Ok(existed)
    }

    /// Whether a token is stored for `platform`
    pub fn has_token(&self, platform: PlatformId) -> bool {
        self.token(platform).is_ok_and(|t| t.is_some())
    }

    /// Platforms with a stored token, in catalog order
    pub fn platforms(&self) -> Result<Vec<PlatformId>> {
        let tokens = self.load()?;
        Ok(PlatformId::all()
            .iter()
            .copied()
            .filter(|p| tokens.contains_key(p.as_str()))
            .collect())
    }
}

impl CredentialProvider for CredentialStore {
    /// File I/O and decryption run on the blocking pool
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.token(platform))
            .await
            .context("Credential lookup task failed")?
    }
}

/// Tokens from `CROSSPOST_<PLATFORM>_TOKEN` environment variables
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    prefix: String,
}

impl EnvCredentials {
    /// Read variables named `<prefix>_<PLATFORM>_TOKEN`
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Variable consulted for `platform`
    pub fn var_name(&self, platform: PlatformId) -> String {
        format!("{}_{}_TOKEN", self.prefix, platform.as_str().to_uppercase())
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }
}

impl CredentialProvider for EnvCredentials {
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        Ok(std::env::var(self.var_name(platform))
            .ok()
            .filter(|t| !t.trim().is_empty()))
    }
}

/// In-memory tokens
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    tokens: Mutex<HashMap<PlatformId, String>>,
}

impl MemoryCredentials {
    /// Set the token for `platform`
    pub fn insert(&self, platform: PlatformId, token: impl Into<String>) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(platform, token.into());
        }
    }
}

impl CredentialProvider for MemoryCredentials {
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|_| anyhow!("Credential map poisoned"))?;
        Ok(tokens.get(&platform).cloned())
    }
}

/// Ask `primary` first, then `secondary`
#[derive(Debug, Clone)]
pub struct FallbackCredentials<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> FallbackCredentials<A, B> {
    /// Chain two providers
    pub const fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: CredentialProvider, B: CredentialProvider> CredentialProvider for FallbackCredentials<A, B> {
    async fn token(&self, platform: PlatformId) -> Result<Option<String>> {
        if let Some(token) = self.primary.token(platform).await? {
            return Ok(Some(token));
        }
        self.secondary.token(platform).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::at(dir.path().join("credentials.enc"));
        (dir, store)
    }

    #[test]
    fn test_store_and_read_back() {
        let (_dir, store) = store();
        assert_eq!(store.token(PlatformId::Twitter).unwrap(), None);

        store.store_token(PlatformId::Twitter, "abc").unwrap();
        store.store_token(PlatformId::Facebook, "def").unwrap();

        assert_eq!(store.token(PlatformId::Twitter).unwrap().as_deref(), Some("abc"));
        assert!(store.has_token(PlatformId::Facebook));
        assert!(!store.has_token(PlatformId::Instagram));
        assert_eq!(
            store.platforms().unwrap(),
            vec![PlatformId::Twitter, PlatformId::Facebook]
        );
    }

    #[test]
    fn test_file_is_not_plaintext() {
        let (_dir, store) = store();
        store.store_token(PlatformId::Twitter, "super-secret-token").unwrap();

        let raw = fs::read(store.path()).unwrap();
        let needle = b"super-secret-token";
        assert!(!raw.windows(needle.len()).any(|w| w == needle));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = store();
        store.store_token(PlatformId::Twitter, "t").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = store();
        store.store_token(PlatformId::Twitter, "abc").unwrap();
        assert!(store.delete_token(PlatformId::Twitter).unwrap());
        assert!(!store.delete_token(PlatformId::Twitter).unwrap());
        assert_eq!(store.token(PlatformId::Twitter).unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let (_dir, store) = store();
        fs::write(store.path(), [7u8; 64]).unwrap();
        assert!(store.token(PlatformId::Twitter).is_err());
        assert!(!store.has_token(PlatformId::Twitter));
    }

    #[tokio::test]
    async fn test_store_as_provider() {
        let (_dir, store) = store();
        store.store_token(PlatformId::Twitter, "abc").unwrap();
        let token = CredentialProvider::token(&store, PlatformId::Twitter).await.unwrap();
        assert_eq!(token.as_deref(), Some("abc"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_store_provider_concurrent_lookups() {
        let (_dir, store) = store();
        store.store_token(PlatformId::Twitter, "abc").unwrap();

        let lookups = PlatformId::all()
            .iter()
            .map(|&platform| CredentialProvider::token(&store, platform));
        let tokens = futures::future::join_all(lookups).await;

        let found: Vec<_> = tokens
            .into_iter()
            .map(|t| t.unwrap())
            .filter(Option::is_some)
            .collect();
        assert_eq!(found, vec![Some("abc".to_string())]);
    }

    #[tokio::test]
    async fn test_store_provider_reports_corrupt_file() {
        let (_dir, store) = store();
        fs::write(store.path(), [7u8; 64]).unwrap();
        assert!(CredentialProvider::token(&store, PlatformId::Twitter).await.is_err());
    }

    #[test]
    fn test_env_var_name() {
        let env = EnvCredentials::default();
        assert_eq!(env.var_name(PlatformId::Twitter), "CROSSPOST_TWITTER_TOKEN");
        assert_eq!(env.var_name(PlatformId::LinkedIn), "CROSSPOST_LINKEDIN_TOKEN");
    }

    #[tokio::test]
    async fn test_unset_env_is_none() {
        let env = EnvCredentials::with_prefix("CROSSPOST_TEST_UNSET_4F1C");
        assert_eq!(env.token(PlatformId::Twitter).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fallback_order() {
        let primary = MemoryCredentials::default();
        primary.insert(PlatformId::Twitter, "primary");
        let secondary = MemoryCredentials::default();
        secondary.insert(PlatformId::Twitter, "secondary");
        secondary.insert(PlatformId::Facebook, "fb");

        let chained = FallbackCredentials::new(primary, secondary);
        assert_eq!(
            chained.token(PlatformId::Twitter).await.unwrap().as_deref(),
            Some("primary")
        );
        assert_eq!(
            chained.token(PlatformId::Facebook).await.unwrap().as_deref(),
            Some("fb")
        );
        assert_eq!(chained.token(PlatformId::Snapchat).await.unwrap(), None);
    }
}
