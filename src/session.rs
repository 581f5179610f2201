//! The signed-in session, persisted between runs.

use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clancal_core::config::ClanCalConfig;
use clancal_core::identity::Session;

pub fn path() -> Result<PathBuf> {
    Ok(ClanCalConfig::config_dir()?.join("session.toml"))
}

/// The stored session, if any.
pub fn load() -> Result<Option<Session>> {
    load_from(&path()?)
}

pub fn save(session: &Session) -> Result<()> {
    save_to(session, &path()?)
}

/// Forget the stored session. Missing files are fine.
pub fn clear() -> Result<()> {
    clear_at(&path()?)
}

fn load_from(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session from {}", path.display()))?;

    let session: Session = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse session from {}", path.display()))?;

    Ok(Some(session))
}

fn save_to(session: &Session, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(session).context("Failed to serialize session")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // Owner-only from the start, the file holds access tokens
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    // An older file may have been created with looser permissions
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write session to {}", path.display()))?;

    Ok(())
}

fn clear_at(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clancal_core::identity::User;

    fn session() -> Session {
        Session {
            access_token: "jwt".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc.with_ymd_and_hms(2024, 3, 15, 3, 0, 0).unwrap()),
            user: User {
                id: "u1".into(),
                email: Some("queen@example.com".into()),
            },
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clancal").join("session.toml");

        assert_eq!(load_from(&path).unwrap(), None);
        save_to(&session(), &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), Some(session()));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        save_to(&session(), &path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn loose_session_file_is_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "stale").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        save_to(&session(), &path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load_from(&path).unwrap(), Some(session()));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        save_to(&session(), &path).unwrap();

        clear_at(&path).unwrap();
        assert!(!path.exists());
        clear_at(&path).unwrap();
    }

    #[test]
    fn minimal_session_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let mut minimal = session();
        minimal.refresh_token = None;
        minimal.expires_at = None;
        minimal.user.email = None;

        save_to(&minimal, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), Some(minimal));
    }
}
