use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct JavaConfig {
    /// Explicit Java binary. When unset, `java` is looked up on `PATH`.
    pub path: Option<PathBuf>,

    /// Install a runtime through the package manager when none is suitable.
    pub auto_install: bool,

    /// Package name pattern; `{major}` is replaced by the required version.
    pub package_template: String,

    /// Directory where installed JDKs are looked for (`/usr/lib/jvm`).
    pub jvm_root: PathBuf,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            path: None,
            auto_install: true,
            package_template: "openjdk-{major}-jre-headless".to_string(),
            jvm_root: PathBuf::from("/usr/lib/jvm"),
        }
    }
}

impl JavaConfig {
    pub fn package_for(&self, major: u32) -> String {
        self.package_template.replace("{major}", &major.to_string())
    }
}
