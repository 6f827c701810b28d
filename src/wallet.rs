//! Local keypair loading

use anyhow::{bail, Context, Result};
use solana_sdk::signature::Keypair;
use std::path::{Path, PathBuf};

/// Load a keypair file: the CLI's JSON byte array, a base58 secret key
/// string as wallets export it, or 64 raw bytes
pub fn load_keypair(path: impl AsRef<Path>) -> Result<Keypair> {
    let path = expand_home(path.as_ref());
    let contents = std::fs::read(&path)
        .with_context(|| format!("Failed to read keypair file: {}", path.display()))?;
    keypair_from_file_bytes(&contents)
        .with_context(|| format!("Invalid keypair file: {}", path.display()))
}

/// Parse keypair file contents
pub fn keypair_from_file_bytes(contents: &[u8]) -> Result<Keypair> {
    let bytes = if contents.len() == 64 {
        contents.to_vec()
    } else if contents.trim_ascii_start().starts_with(b"[") {
        serde_json::from_slice::<Vec<u8>>(contents).context("Failed to parse keypair JSON")?
    } else {
        let text = std::str::from_utf8(contents).context("Keypair file is neither JSON nor text")?;
        bs58::decode(text.trim())
            .into_vec()
            .context("Failed to decode base58 secret key")?
    };

    if bytes.len() != 64 {
        bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
    }
    if bytes.iter().all(|&b| b == 0) {
        bail!("Invalid keypair: all-zero key rejected");
    }
    Keypair::try_from(bytes.as_slice()).context("Invalid keypair bytes")
}

/// Replace a leading `~` with `$HOME`
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
