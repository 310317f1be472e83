use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid settings in {}: {source}", .path.display())]
    Yaml { path: PathBuf, source: serde_yaml::Error },
    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub data_file: PathBuf,
    pub readme_path: PathBuf,
    pub probe: ProbeConf,
    pub wol: WolConf,
    pub ssh: SshConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ProbeConf {
    pub timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WolConf {
    pub broadcast: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SshConf {
    pub binary: String,
    pub extra_args: String, // ex: "-p 2222 -i ~/.ssh/wakedeck", découpé façon shell
    pub connect_timeout_secs: Option<u32>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_file: PathBuf::from("config.json"),
            readme_path: PathBuf::from("README.md"),
            probe: ProbeConf::default(),
            wol: WolConf::default(),
            ssh: SshConf::default(),
        }
    }
}

impl Default for ProbeConf {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

impl Default for WolConf {
    fn default() -> Self {
        Self { broadcast: Ipv4Addr::BROADCAST, port: 9 }
    }
}

impl Default for SshConf {
    fn default() -> Self {
        Self {
            binary: "ssh".into(),
            extra_args: String::new(),
            connect_timeout_secs: None,
        }
    }
}

impl ProbeConf {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SshConf {
    pub fn split_extra_args(&self) -> Result<Vec<String>, shell_words::ParseError> {
        shell_words::split(&self.extra_args)
    }
}

impl ServerSettings {
    /// Fichier YAML désigné par `WAKEDECK_CONFIG` (défaut `wakedeck.yaml`),
    /// puis surcharges `WAKEDECK_LISTEN` / `WAKEDECK_DATA_FILE`.
    pub async fn load() -> Result<Self, SettingsError> {
        let path = std::env::var("WAKEDECK_CONFIG").unwrap_or_else(|_| "wakedeck.yaml".into());
        let mut settings = Self::from_file(Path::new(&path)).await?;
        settings.apply_env()?;
        Ok(settings)
    }

    pub async fn from_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            warn!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let txt = tokio::fs::read_to_string(path).await.map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }

        let settings = serde_yaml::from_str(&txt).map_err(|source| SettingsError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    fn apply_env(&mut self) -> Result<(), SettingsError> {
        if let Ok(value) = std::env::var("WAKEDECK_LISTEN") {
            self.listen = value.parse().map_err(|_| SettingsError::Env {
                var: "WAKEDECK_LISTEN",
                value,
            })?;
        }
        if let Ok(value) = std::env::var("WAKEDECK_DATA_FILE") {
            self.data_file = PathBuf::from(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ServerSettings::default();
        assert_eq!(settings.listen.port(), 8080);
        assert_eq!(settings.data_file, PathBuf::from("config.json"));
        assert_eq!(settings.wol.broadcast, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(settings.wol.port, 9);
        assert_eq!(settings.probe.timeout(), Duration::from_secs(2));
        assert!(settings.ssh.split_extra_args().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_yaml_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wakedeck.yaml");
        std::fs::write(
            &path,
            "listen: 127.0.0.1:9000\nwol:\n  broadcast: 192.168.1.255\nssh:\n  extra_args: \"-p 2222 -i '/keys/my key'\"\n",
        )
        .unwrap();

        let settings = ServerSettings::from_file(&path).await.unwrap();
        assert_eq!(settings.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.wol.broadcast, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(settings.wol.port, 9);
        assert_eq!(settings.probe.timeout_ms, 2000);
        assert_eq!(
            settings.ssh.split_extra_args().unwrap(),
            vec!["-p", "2222", "-i", "/keys/my key"]
        );
    }

    #[tokio::test]
    async fn test_missing_or_empty_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ServerSettings::from_file(&dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(missing.listen.port(), 8080);

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(ServerSettings::from_file(&empty).await.unwrap().listen.port(), 8080);
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "listen: [not, an, address]\n").unwrap();
        assert!(matches!(
            ServerSettings::from_file(&path).await,
            Err(SettingsError::Yaml { .. })
        ));
    }
}
