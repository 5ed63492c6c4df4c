use std::path::{Path, PathBuf};

use crate::UnitError;

/// Names derived from `<product>-server-<instance_id>`. The same base is
/// used for the OS account, the group and both units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNames {
    base: String,
    runtime_dir: PathBuf,
}

impl UnitNames {
    pub fn new(
        product: &str,
        instance_id: &str,
        runtime_root: impl AsRef<Path>,
    ) -> Result<Self, UnitError> {
        let base = format!("{}-server-{}", product, instance_id);
        if instance_id.is_empty() {
            return Err(UnitError::InvalidName {
                name: base,
                reason: "instance id is empty",
            });
        }
        if !base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(UnitError::InvalidName {
                name: base,
                reason: "only ASCII letters, digits, '-' and '_' are allowed",
            });
        }

        let runtime_dir = runtime_root.as_ref().join(&base);
        Ok(Self { base, runtime_dir })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn user(&self) -> &str {
        &self.base
    }

    pub fn group(&self) -> &str {
        &self.base
    }

    pub fn service(&self) -> String {
        format!("{}.service", self.base)
    }

    pub fn socket(&self) -> String {
        format!("{}.socket", self.base)
    }

    /// Directory holding the console FIFO, removed on uninstall.
    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    pub fn fifo_path(&self) -> PathBuf {
        self.runtime_dir.join(format!("{}.stdin", self.base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let names = UnitNames::new("minecraft", "survival", "/run").unwrap();
        assert_eq!(names.user(), "minecraft-server-survival");
        assert_eq!(names.group(), "minecraft-server-survival");
        assert_eq!(names.service(), "minecraft-server-survival.service");
        assert_eq!(names.socket(), "minecraft-server-survival.socket");
        assert_eq!(
            names.fifo_path(),
            PathBuf::from("/run/minecraft-server-survival/minecraft-server-survival.stdin")
        );
    }

    #[test]
    fn test_rejects_bad_instance_ids() {
        assert!(UnitNames::new("hytale", "", "/run").is_err());
        assert!(UnitNames::new("hytale", "a b", "/run").is_err());
        assert!(UnitNames::new("hytale", "../etc", "/run").is_err());
    }
}
