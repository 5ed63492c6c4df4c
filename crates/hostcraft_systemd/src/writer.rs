use std::{
    io,
    path::{Path, PathBuf},
};

use hostcraft_config::LogType;
use tokio::fs;
use tracing::{debug, info};

use crate::{UnitError, UnitNames, UnitPair};

const UNIT_MODE: u32 = 0o644;

/// Writes `<name>.service` and `<name>.socket` into `dir`, replacing any
/// previous version. Returns the paths written.
pub async fn write_units(dir: &Path, pair: &UnitPair) -> Result<(PathBuf, PathBuf), UnitError> {
    let names = pair.names();
    let service_path = dir.join(names.service());
    let socket_path = dir.join(names.socket());

    write_unit(&socket_path, &pair.socket.to_string()).await?;
    write_unit(&service_path, &pair.service.to_string()).await?;

    info!(
        log_type = LogType::Systemd.as_str(),
        "Wrote {} and {} to {}",
        names.service(),
        names.socket(),
        dir.display()
    );
    Ok((service_path, socket_path))
}

async fn write_unit(path: &Path, content: &str) -> Result<(), UnitError> {
    let write_err = |source: io::Error| UnitError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    fs::write(path, content).await.map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(UNIT_MODE))
            .await
            .map_err(write_err)?;
    }

    debug!(log_type = LogType::Systemd.as_str(), "Wrote unit {}", path.display());
    Ok(())
}

/// Removes both unit files and the runtime directory holding the FIFO.
/// Files that are already gone are not an error.
pub async fn remove_units(dir: &Path, names: &UnitNames) -> Result<(), UnitError> {
    for path in [dir.join(names.service()), dir.join(names.socket())] {
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(
                    log_type = LogType::Systemd.as_str(),
                    "Removed unit {}",
                    path.display()
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(UnitError::Remove { path, source }),
        }
    }

    let runtime_dir = names.runtime_dir();
    match fs::remove_dir_all(runtime_dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(UnitError::Remove {
            path: runtime_dir.to_path_buf(),
            source,
        }),
    }
}
