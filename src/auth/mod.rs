//! Authentication module (encrypted file-based token storage)
//!
//! Platform access tokens are stored encrypted with AES-256-GCM in
//! ~/.config/rookery/credentials.enc. The encryption key is derived from
//! machine-specific identifiers, so the file is useless off-machine.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::models::SocialAccount;
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Source of platform access tokens
///
/// The manager takes this by injection so tests can supply in-memory tokens
/// instead of touching the encrypted file.
pub trait TokenSource: Send + Sync {
    /// Get the access token for an account, if one is stored
    fn access_token(&self, account: &SocialAccount) -> Result<Option<String>>;
}

/// Get machine ID for key derivation (cross-platform)
fn get_machine_id() -> String {
    // Linux: /etc/machine-id or /var/lib/dbus/machine-id
    #[cfg(target_os = "linux")]
    {
        if let Ok(id) = fs::read_to_string("/etc/machine-id") {
            return id.trim().to_string();
        }
        if let Ok(id) = fs::read_to_string("/var/lib/dbus/machine-id") {
            return id.trim().to_string();
        }
    }

    // macOS: IOPlatformUUID via ioreg
    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            for line in stdout.lines() {
                if line.contains("IOPlatformUUID") {
                    if let Some(uuid) = line.split('"').nth(3) {
                        return uuid.to_string();
                    }
                }
            }
        }
    }

    // Windows: MachineGuid from registry
    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            for line in stdout.lines() {
                if line.contains("MachineGuid") {
                    if let Some(guid) = line.split_whitespace().last() {
                        return guid.to_string();
                    }
                }
            }
        }
    }

    // Fallback: use home directory path (always available via dirs crate)
    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "rookery-fallback-key".to_string())
}

/// Derive encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();

    hasher.update(get_machine_id().as_bytes());

    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }

    if let Some(data) = dirs::data_dir() {
        hasher.update(data.to_string_lossy().as_bytes());
    }

    // Fixed salt for this app
    hasher.update(b"rookery-social-manager-v1");

    hasher.finalize().into()
}

/// Encrypted token store over a credentials file
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open the store at the default credentials path
    pub fn open() -> Result<Self> {
        Ok(Self {
            path: paths::credentials_path()?,
        })
    }

    /// Open the store at a specific path
    pub fn open_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load all entries from the encrypted file
    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;

        if encrypted.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let key = derive_key();
        let cipher = Aes256Gcm::new_from_slice(&key).expect("Invalid key length");

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| anyhow::anyhow!("Failed to decrypt credentials"))?;

        let json = String::from_utf8(plaintext).context("Invalid UTF-8 in credentials")?;
        let entries: HashMap<String, String> = serde_json::from_str(&json)?;

        Ok(entries)
    }

    /// Save all entries to the encrypted file
    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let json = serde_json::to_string(entries)?;

        let key = derive_key();
        let cipher = Aes256Gcm::new_from_slice(&key).expect("Invalid key length");

        let mut rng = rand::rng();
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rng.fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, json.as_bytes())
            .map_err(|_| anyhow::anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        fs::write(&self.path, output).context("Failed to write credentials file")?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Store the access token for an account
    pub fn store_token(&self, account: &SocialAccount, token: &str) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(account.credential_key(), token.to_string());
        self.save(&entries)
    }

    /// Store the refresh token for an account
    pub fn store_refresh_token(&self, account: &SocialAccount, token: &str) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.insert(account.refresh_credential_key(), token.to_string());
        self.save(&entries)
    }

    /// Get the access token for an account
    pub fn get_token(&self, account: &SocialAccount) -> Result<Option<String>> {
        let entries = self.load()?;
        Ok(entries.get(&account.credential_key()).cloned())
    }

    /// Get the refresh token for an account
    pub fn get_refresh_token(&self, account: &SocialAccount) -> Result<Option<String>> {
        let entries = self.load()?;
        Ok(entries.get(&account.refresh_credential_key()).cloned())
    }

    /// Delete both tokens for an account
    pub fn delete_tokens(&self, account: &SocialAccount) -> Result<()> {
        let mut entries = self.load().unwrap_or_default();
        entries.remove(&account.credential_key());
        entries.remove(&account.refresh_credential_key());
        self.save(&entries)
    }

    /// Check if an access token exists for an account
    pub fn has_token(&self, account: &SocialAccount) -> bool {
        self.get_token(account).map(|t| t.is_some()).unwrap_or(false)
    }
}

impl TokenSource for CredentialStore {
    fn access_token(&self, account: &SocialAccount) -> Result<Option<String>> {
        self.get_token(account)
    }
}

/// In-memory token source for tests and dry runs
///
/// Keeps fixture credentials structurally separate from the production
/// encrypted file.
#[derive(Default)]
pub struct MemoryTokens {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryTokens {
    /// Create an empty token source
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token for an account
    pub fn insert(&self, account: &SocialAccount, token: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(account.credential_key(), token.to_string());
    }
}

impl TokenSource for MemoryTokens {
    fn access_token(&self, account: &SocialAccount) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(&account.credential_key()).cloned())
    }
}
