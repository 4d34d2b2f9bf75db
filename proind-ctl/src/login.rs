use std::path::{Path, PathBuf};

use anyhow::Context;
use proind_client::api::{AuthToken, Author};

/// What `proind-ctl login` remembers between runs
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginInfo {
    pub host: String,
    pub token: AuthToken,
    pub user: Author,
}

impl LoginInfo {
    /// `$PROIND_LOGIN`, or `.proind-login.json` in the home directory
    pub fn default_path() -> anyhow::Result<PathBuf> {
        if let Some(p) = std::env::var_os("PROIND_LOGIN") {
            return Ok(PathBuf::from(p));
        }
        let home = std::env::var_os("HOME").context("retrieving HOME environment variable")?;
        Ok(Path::new(&home).join(".proind-login.json"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Option<LoginInfo>> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading login file {path:?}")),
        };
        let info = serde_json::from_slice(&data)
            .with_context(|| format!("parsing login file {path:?}"))?;
        Ok(Some(info))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let data = serde_json::to_vec_pretty(self).context("serializing login info")?;
        std::fs::write(path, data).with_context(|| format!("writing login file {path:?}"))
    }

    /// Returns whether there was a login to forget
    pub fn delete(path: &Path) -> anyhow::Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing login file {path:?}")),
        }
    }
}
