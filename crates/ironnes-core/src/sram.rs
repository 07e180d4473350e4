//! Battery-backed PRG-RAM persistence.
//!
//! The save lives next to the process as `<name>.sav`, written on
//! shutdown and read back when a battery cartridge is installed.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{info, warn};

/// Save-file path for a cartridge name.
#[must_use]
pub fn save_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{name}.sav"))
}

/// Read a save file, if one exists.
pub fn load(name: &str) -> Option<Vec<u8>> {
    let path = save_path(name);
    match fs::read(&path) {
        Ok(data) => {
            info!("loaded {} bytes of save RAM from {}", data.len(), path.display());
            Some(data)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!("could not read {}: {err}", path.display());
            None
        }
    }
}

/// Write battery RAM out.
pub fn save(name: &str, data: &[u8]) -> io::Result<()> {
    let path = save_path(name);
    fs::write(&path, data)?;
    info!("wrote {} bytes of save RAM to {}", data.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_appends_sav() {
        assert_eq!(save_path("zelda"), PathBuf::from("zelda.sav"));
    }

    #[test]
    fn missing_save_is_none() {
        assert!(load("no-such-cartridge-name").is_none());
    }
}
