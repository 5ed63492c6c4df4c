use std::{io, path::Path};

use hostcraft_config::LogType;
use hostcraft_net::HttpTransport;
use hostcraft_systemd::remove_units;
use tokio::fs;
use tracing::{info, instrument};

use super::{Provisioner, UninstallOptions};
use crate::{HostcraftError, SystemRunner};

impl<T: HttpTransport + Clone, R: SystemRunner> Provisioner<T, R> {
    /// Reverses `install`. Steps whose target is already gone are skipped,
    /// so uninstall also cleans up after a partial install.
    #[instrument(name = "uninstall", skip_all, fields(instance = %self.target.instance_id))]
    pub async fn uninstall(&self, options: &UninstallOptions) -> Result<(), HostcraftError> {
        let names = &self.target.names;
        let service = names.service();
        let socket = names.socket();

        for unit in [service.as_str(), socket.as_str()] {
            self.runner.tolerate("systemctl", &["stop", unit]).await?;
            self.runner.tolerate("systemctl", &["disable", unit]).await?;
        }
        // Exit status 1 means no process was left.
        self.runner.tolerate("pkill", &["-u", names.user()]).await?;

        if self.dry_run() {
            info!(
                log_type = LogType::Systemd.as_str(),
                "[dry-run] remove {} and {} from {}",
                service,
                socket,
                self.config.systemd.unit_dir.display()
            );
        } else {
            remove_units(&self.config.systemd.unit_dir, names).await?;
        }
        self.runner.check("systemctl", &["daemon-reload"]).await?;

        let cache_path = self.target.auth_cache_path(&self.config);
        if !options.keep_data {
            self.remove_path(&self.target.install_dir).await?;
        }
        if options.forget_auth || !options.keep_data {
            self.remove_path(&cache_path).await?;
        }

        if self.runner.run("getent", &["passwd", names.user()]).await?.success() {
            self.runner.check("userdel", &[names.user()]).await?;
        }
        if self.runner.run("getent", &["group", names.group()]).await?.success() {
            self.runner.check("groupdel", &[names.group()]).await?;
        }

        info!(
            log_type = LogType::Provision.as_str(),
            "Uninstalled {}{}",
            service,
            if options.keep_data { " (data kept)" } else { "" }
        );
        Ok(())
    }

    async fn remove_path(&self, path: &Path) -> Result<(), HostcraftError> {
        if self.dry_run() {
            info!(log_type = LogType::Provision.as_str(), "[dry-run] remove {}", path.display());
            return Ok(());
        }

        let result = match fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path).await,
            Ok(_) => fs::remove_file(path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                info!(log_type = LogType::Provision.as_str(), "Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HostcraftError::io(path)(e)),
        }
    }
}
