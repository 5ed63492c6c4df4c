use std::path::{Path, PathBuf};

use hostcraft::{
    CommandOutput, DryRunRunner, HostcraftError, InstallOptions, Provisioner, RecordingRunner,
};
use hostcraft_auth::{CacheState, TokenCache};
use hostcraft_config::{HostcraftConfig, HytaleEndpoints};
use hostcraft_net::MockTransport;
use serde_json::json;
use tempfile::TempDir;

const PAPER_URL: &str = "https://cdn.test/paper-1.20.4-496.jar";
const NEW_PAPER_URL: &str = "https://cdn.test/paper-1.21.1-40.jar";
const FORGE_URL: &str = "https://cdn.test/forge-1.20.1-47.2.0-installer.jar";
const HYTALE_URL: &str = "https://cdn.test/hytale-server.zip";

const TOKEN: &str = "https://oauth.test/token";
const SESSION: &str = "https://sessions.test/new";

struct Host {
    root: TempDir,
}

impl Host {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    fn install_dir(&self) -> PathBuf {
        self.root.path().join("srv")
    }

    fn unit_dir(&self) -> PathBuf {
        self.root.path().join("units")
    }

    fn config(&self, flavor: &str, version: &str, build: &str, url: &str) -> HostcraftConfig {
        let mut config = HostcraftConfig {
            instance_id: Some("alpha".to_string()),
            install_dir: Some(self.install_dir()),
            ..HostcraftConfig::default()
        };
        config.server.flavor = Some(flavor.to_string());
        config.server.version = Some(version.to_string());
        config.server.build = Some(build.to_string());
        config.server.download_url = Some(url.to_string());
        config.server.eula = true;
        config.server.port = Some(25570);
        config.systemd.unit_dir = self.unit_dir();
        config.systemd.runtime_dir = self.root.path().join("run");
        std::fs::create_dir_all(self.unit_dir()).unwrap();
        config
    }
}

/// Runner for a host where neither the account nor the group exists yet.
fn fresh_host_runner(java_version: &str) -> RecordingRunner {
    RecordingRunner::new()
        .with_status("getent", 2)
        .with_output(
            "java -version",
            CommandOutput {
                status: 0,
                stdout: String::new(),
                stderr: format!("openjdk version \"{}\" 2024-01-16\n", java_version),
            },
        )
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_paper_install_sequence() {
    let host = Host::new();
    let runner = fresh_host_runner("21.0.2");
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");
    let provisioner = Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        transport.clone(),
        runner.clone(),
    )
    .unwrap();

    let report = provisioner.install(&InstallOptions::default()).await.unwrap();

    assert_eq!(report.names.service(), "minecraft-server-alpha.service");
    assert_eq!(report.java.major, 21);
    assert!(report.started);
    assert_eq!(read(host.install_dir().join("server.jar")), "paperclip");
    assert!(read(host.install_dir().join("eula.txt")).contains("eula=true"));
    assert!(read(host.install_dir().join("server.properties")).contains("server-port=25570"));
    assert!(host.install_dir().join("logs").is_dir());
    assert!(host.install_dir().join("backups").is_dir());

    let service = read(host.unit_dir().join("minecraft-server-alpha.service"));
    assert!(service.contains("User=minecraft-server-alpha"));
    assert!(service.contains("-Xms1G -Xmx2G -jar"));
    assert!(service.contains("--nogui"));
    assert!(host.unit_dir().join("minecraft-server-alpha.socket").is_file());

    let commands = runner.commands();
    let pos = |prefix: &str| {
        commands
            .iter()
            .position(|c| c.starts_with(prefix))
            .unwrap_or_else(|| panic!("`{prefix}` was not run: {commands:#?}"))
    };
    assert!(pos("groupadd --system minecraft-server-alpha") < pos("useradd --system"));
    assert!(pos("useradd --system") < pos("chown -R"));
    assert!(pos("chown -R") < pos("systemctl daemon-reload"));
    assert!(
        pos("systemctl daemon-reload") < pos("systemctl enable --now minecraft-server-alpha.socket")
    );
    assert!(
        pos("systemctl enable --now minecraft-server-alpha.socket")
            < pos("systemctl enable minecraft-server-alpha.service")
    );
    assert!(
        pos("systemctl enable minecraft-server-alpha.service")
            < pos("systemctl start minecraft-server-alpha.service")
    );
    assert!(!runner.ran("apt-get"));
    assert_eq!(transport.request_count(PAPER_URL), 1);
}

#[tokio::test]
async fn test_existing_account_is_reused() {
    let host = Host::new();
    let runner = fresh_host_runner("21").with_status("getent", 0);
    let provisioner = Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        MockTransport::new().with_download(PAPER_URL, b"paperclip"),
        runner.clone(),
    )
    .unwrap();

    provisioner.install(&InstallOptions::default()).await.unwrap();

    assert!(!runner.ran("groupadd"));
    assert!(!runner.ran("useradd"));
}

#[tokio::test]
async fn test_eula_refusal_changes_nothing() {
    let host = Host::new();
    let mut config = host.config("paper", "1.20.4", "496", PAPER_URL);
    config.server.eula = false;
    let runner = fresh_host_runner("21");
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");

    let err = Provisioner::new(config, transport.clone(), runner.clone())
        .unwrap()
        .install(&InstallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HostcraftError::EulaNotAccepted { .. }));
    assert!(runner.commands().is_empty());
    assert!(transport.requests().is_empty());
    assert!(!host.install_dir().exists());
}

#[tokio::test]
async fn test_proxy_needs_no_eula() {
    let host = Host::new();
    let mut config = host.config("velocity", "3.3.0", "436", PAPER_URL);
    config.server.eula = false;

    let report = Provisioner::new(
        config,
        MockTransport::new().with_download(PAPER_URL, b"velocity"),
        fresh_host_runner("21"),
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap();

    assert!(report.started);
    assert!(!host.install_dir().join("eula.txt").exists());
    assert!(!host.install_dir().join("server.properties").exists());
}

#[tokio::test]
async fn test_no_start_enables_without_starting() {
    let host = Host::new();
    let runner = fresh_host_runner("21");
    let provisioner = Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        MockTransport::new().with_download(PAPER_URL, b"paperclip"),
        runner.clone(),
    )
    .unwrap();

    let options = InstallOptions {
        no_start: true,
        ..InstallOptions::default()
    };
    let report = provisioner.install(&options).await.unwrap();

    assert!(!report.started);
    assert!(runner.ran("systemctl enable --now minecraft-server-alpha.socket"));
    assert!(runner.ran("systemctl enable minecraft-server-alpha.service"));
    assert!(!runner.ran("systemctl start"));
}

#[tokio::test]
async fn test_existing_artifact_is_kept() {
    let host = Host::new();
    std::fs::create_dir_all(host.install_dir()).unwrap();
    std::fs::write(host.install_dir().join("server.jar"), b"already here").unwrap();
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");

    Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        transport.clone(),
        fresh_host_runner("21"),
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap();

    assert_eq!(transport.request_count(PAPER_URL), 0);
    assert_eq!(read(host.install_dir().join("server.jar")), "already here");
}

#[tokio::test]
async fn test_force_download_replaces_artifact() {
    let host = Host::new();
    std::fs::create_dir_all(host.install_dir()).unwrap();
    std::fs::write(host.install_dir().join("server.jar"), b"stale").unwrap();
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");

    let options = InstallOptions {
        force_download: true,
        ..InstallOptions::default()
    };
    Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        transport.clone(),
        fresh_host_runner("21"),
    )
    .unwrap()
    .install(&options)
    .await
    .unwrap();

    assert_eq!(transport.request_count(PAPER_URL), 1);
    assert_eq!(read(host.install_dir().join("server.jar")), "paperclip");
}

#[tokio::test]
async fn test_new_version_replaces_artifact() {
    let host = Host::new();
    let transport = MockTransport::new()
        .with_download(PAPER_URL, b"old-1.20.4")
        .with_download(NEW_PAPER_URL, b"new-1.21.1");

    let install = |config: HostcraftConfig| {
        let transport = transport.clone();
        async move {
            Provisioner::new(config, transport, fresh_host_runner("21"))
                .unwrap()
                .install(&InstallOptions::default())
                .await
                .unwrap()
        }
    };

    install(host.config("paper", "1.20.4", "496", PAPER_URL)).await;
    let report = install(host.config("paper", "1.21.1", "40", NEW_PAPER_URL)).await;

    assert_eq!(report.version, "1.21.1");
    assert_eq!(transport.request_count(NEW_PAPER_URL), 1);
    assert_eq!(read(host.install_dir().join("server.jar")), "new-1.21.1");
    let service = read(host.unit_dir().join("minecraft-server-alpha.service"));
    assert!(service.contains("(paper 1.21.1)"));

    // Same build again: nothing to fetch.
    install(host.config("paper", "1.21.1", "40", NEW_PAPER_URL)).await;
    assert_eq!(transport.request_count(NEW_PAPER_URL), 1);
    assert_eq!(transport.request_count(PAPER_URL), 1);
}

#[tokio::test]
async fn test_invalid_heap_size_fails_before_changes() {
    let host = Host::new();
    let mut config = host.config("paper", "1.20.4", "496", PAPER_URL);
    config.server.memory.max = Some("4 G".to_string());
    let runner = fresh_host_runner("21");
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");

    let err = Provisioner::new(config, transport.clone(), runner.clone())
        .unwrap()
        .install(&InstallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HostcraftError::Config(hostcraft_config::ConfigError::Invalid {
            field: "server.memory.max",
            ..
        })
    ));
    assert!(runner.commands().is_empty());
    assert!(transport.requests().is_empty());
    assert!(!host.install_dir().exists());
}

#[tokio::test]
async fn test_old_java_is_replaced_by_package() {
    let host = Host::new();
    let runner = fresh_host_runner("17.0.9");
    let mut config = host.config("paper", "1.21.1", "100", PAPER_URL);
    config.java.jvm_root = host.root.path().join("jvm");

    // The rescan after installing still finds Java 17, so the install fails,
    // but only after asking the package manager for the right runtime.
    let err = Provisioner::new(
        config,
        MockTransport::new().with_download(PAPER_URL, b"paperclip"),
        runner.clone(),
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        HostcraftError::JavaUnavailable {
            required: 21,
            ..
        }
    ));
    assert!(runner.ran("env DEBIAN_FRONTEND=noninteractive apt-get install -y --no-install-recommends openjdk-21-jre-headless"));
    assert!(!runner.ran("systemctl"));
}

#[tokio::test]
async fn test_forge_installer_runs_as_service_user() {
    let host = Host::new();
    let runner = fresh_host_runner("17.0.9");
    let provisioner = Provisioner::new(
        host.config("forge", "1.20.1", "47.2.0", FORGE_URL),
        MockTransport::new().with_download(FORGE_URL, b"installer"),
        runner.clone(),
    )
    .unwrap();

    // The recorded installer writes nothing, so the startup command cannot
    // be built afterwards.
    let err = provisioner
        .install(&InstallOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HostcraftError::MissingArtifact { .. }));

    let installer = host.install_dir().join("forge-installer.jar");
    let expected = format!(
        "runuser -u minecraft-server-alpha -- java -jar {} --installServer {}",
        installer.display(),
        host.install_dir().display()
    );
    assert!(runner.ran(&expected), "{:#?}", runner.commands());
    assert!(runner.position("chown -R").unwrap() < runner.position("runuser").unwrap());
}

#[tokio::test]
async fn test_forge_installed_server_is_not_reinstalled() {
    let host = Host::new();
    let args_dir = host
        .install_dir()
        .join("libraries/net/minecraftforge/forge/1.20.1-47.2.0");
    std::fs::create_dir_all(&args_dir).unwrap();
    std::fs::write(args_dir.join("unix_args.txt"), "-cp libraries").unwrap();
    std::fs::write(host.install_dir().join("forge-installer.jar"), b"installer").unwrap();

    let runner = fresh_host_runner("17.0.9");
    Provisioner::new(
        host.config("forge", "1.20.1", "47.2.0", FORGE_URL),
        MockTransport::new(),
        runner.clone(),
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap();

    assert!(!runner.ran("runuser"));
    let service = read(host.unit_dir().join("minecraft-server-alpha.service"));
    assert!(service.contains("@libraries/net/minecraftforge/forge/1.20.1-47.2.0/unix_args.txt nogui"));
}

#[tokio::test]
async fn test_forge_upgrade_runs_installer_again() {
    let host = Host::new();
    let old = host
        .install_dir()
        .join("libraries/net/minecraftforge/forge/1.20.1-47.1.0");
    std::fs::create_dir_all(&old).unwrap();
    std::fs::write(old.join("unix_args.txt"), "-cp libraries").unwrap();
    std::fs::write(host.install_dir().join("forge-installer.jar"), b"old installer").unwrap();
    std::fs::write(
        host.install_dir().join(".hostcraft-artifact"),
        "https://cdn.test/forge-1.20.1-47.1.0-installer.jar\n",
    )
    .unwrap();

    let runner = fresh_host_runner("17.0.9");
    let transport = MockTransport::new().with_download(FORGE_URL, b"installer");
    let err = Provisioner::new(
        host.config("forge", "1.20.1", "47.2.0", FORGE_URL),
        transport.clone(),
        runner.clone(),
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap_err();

    // The recorded installer writes nothing for 47.2.0.
    assert!(matches!(err, HostcraftError::MissingArtifact { .. }));
    assert_eq!(transport.request_count(FORGE_URL), 1);
    assert_eq!(read(host.install_dir().join("forge-installer.jar")), "installer");
    assert!(runner.ran("runuser"));
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let host = Host::new();
    let transport = MockTransport::new().with_download(PAPER_URL, b"paperclip");

    let report = Provisioner::new(
        host.config("paper", "1.20.4", "496", PAPER_URL),
        transport.clone(),
        DryRunRunner,
    )
    .unwrap()
    .install(&InstallOptions::default())
    .await
    .unwrap();

    assert_eq!(report.version, "1.20.4");
    assert!(!host.install_dir().exists());
    assert_eq!(std::fs::read_dir(host.unit_dir()).unwrap().count(), 0);
    assert!(transport.requests().is_empty());
}

fn hytale_config(host: &Host) -> (HostcraftConfig, PathBuf) {
    let mut config = host.config("hytale", "2026.01", "1", HYTALE_URL);
    config.server.eula = false;
    config.hytale.server_name = Some("Orbis".to_string());
    config.hytale.auth.endpoints = HytaleEndpoints {
        device_authorization: "https://oauth.test/device/auth".to_string(),
        token: TOKEN.to_string(),
        profiles: "https://accounts.test/profiles".to_string(),
        session: SESSION.to_string(),
    };

    let config_file = host.root.path().join("alpha.yaml");
    std::fs::write(&config_file, "instance_id: alpha\n").unwrap();
    (config, config_file)
}

#[tokio::test]
async fn test_hytale_install_without_start() {
    let host = Host::new();
    let (config, config_file) = hytale_config(&host);
    let runner = fresh_host_runner("25");
    let transport = MockTransport::new().with_download(HYTALE_URL, b"PK\x03\x04");

    let options = InstallOptions {
        no_start: true,
        config_path: Some(config_file.clone()),
        ..InstallOptions::default()
    };
    let report = Provisioner::new(config, transport.clone(), runner.clone())
        .unwrap()
        .install(&options)
        .await
        .unwrap();

    assert_eq!(report.names.service(), "hytale-server-alpha.service");
    assert_eq!(report.java.major, 25);
    assert!(runner.ran("unzip -o -q"));
    assert!(!host.install_dir().join("eula.txt").exists());
    assert!(read(host.install_dir().join("config.json")).contains("Orbis"));

    let service = read(host.unit_dir().join("hytale-server-alpha.service"));
    assert!(service.contains(&format!(
        "launch --config {} --instance-id alpha",
        config_file.display()
    )));
    assert!(service.contains("HOSTCRAFT_JAVA=java"));
    // No session flow without a start.
    assert_eq!(transport.request_count(TOKEN), 0);
}

#[tokio::test]
async fn test_hytale_install_refreshes_cached_session() {
    let host = Host::new();
    let (config, config_file) = hytale_config(&host);
    std::fs::create_dir_all(host.install_dir()).unwrap();
    let cache = TokenCache::new(host.install_dir().join(".hytale-auth.json"));
    cache.store("refresh-0", "uuid-a").await.unwrap();

    let transport = MockTransport::new()
        .with_download(HYTALE_URL, b"PK\x03\x04")
        .with_json(
            TOKEN,
            json!({"access_token": "access-1", "refresh_token": "refresh-1", "expires_in": 3600}),
        )
        .with_json(
            SESSION,
            json!({"sessionToken": "sess-1", "identityToken": "ident-1"}),
        );
    let runner = fresh_host_runner("25");

    let options = InstallOptions {
        config_path: Some(config_file),
        ..InstallOptions::default()
    };
    Provisioner::new(config, transport.clone(), runner.clone())
        .unwrap()
        .install(&options)
        .await
        .unwrap();

    match cache.load().await.unwrap() {
        CacheState::Valid(record) => {
            assert_eq!(record.refresh_token, "refresh-1");
            assert_eq!(record.profile_uuid, "uuid-a");
        }
        other => panic!("unexpected cache state: {other:?}"),
    }
    assert_eq!(transport.request_count(SESSION), 1);
    assert!(runner.ran("systemctl start hytale-server-alpha.service"));
}

#[tokio::test]
async fn test_hytale_requires_config_file() {
    let host = Host::new();
    let (config, _) = hytale_config(&host);
    let runner = fresh_host_runner("25");

    let err = Provisioner::new(config, MockTransport::new(), runner.clone())
        .unwrap()
        .install(&InstallOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HostcraftError::Config(_)));
    assert!(runner.commands().is_empty());
}
