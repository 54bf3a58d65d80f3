use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wsync_engine::{DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_UPLOAD_CONCURRENCY, SyncOptions, SyncTarget};
use wsync_storage::StoreHandle;
use wsync_storage::backend::{S3Backend, S3Credentials};

/// Prefix of the environment variables that override every other source.
pub const ENV_PREFIX: &str = "WSYNC_";

/// Standard AWS variables, mapped onto the settings of the same name.
const AWS_ENV: &[&str] = &["AWS_REGION", "AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"];

/// `config.toml` in the platform config directory, e.g.
/// `~/.config/wsync/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "wsync").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Everything needed to build a [`WorkspaceSync`](wsync_engine::WorkspaceSync)
/// and the S3 store behind it.
///
/// Credentials are never serialized, so they cannot leak into a printed or
/// saved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub workspace_dir: Option<PathBuf>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, etc.)
    pub endpoint: Option<String>,
    pub download_concurrency: usize,
    pub upload_concurrency: usize,
    pub ignore_patterns: Vec<String>,
    #[serde(skip_serializing)]
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            workspace_dir: None,
            region: None,
            endpoint: None,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            ignore_patterns: Vec::new(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl Config {
    /// Load from every source. An explicit `path` must exist; the default
    /// path is skipped when there is no file there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// The layered sources, without extracting them.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(file_provider(path)?);
            },
            None => {
                if let Some(path) = default_config_path()
                    && path.is_file()
                {
                    tracing::debug!(path = %path.display(), "Using default config file");
                    figment = figment.merge(file_provider(&path)?);
                }
            },
        }
        Ok(figment
            .merge(Env::raw().only(&["AWS_DEFAULT_REGION"]).map(|_| "region".into()))
            .merge(
                Env::raw()
                    .only(AWS_ENV)
                    .map(|key| key.as_str().to_ascii_lowercase().trim_start_matches("aws_").to_string().into()),
            )
            .merge(Env::prefixed(ENV_PREFIX)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Invalid)
    }

    /// Engine options, validated the same way
    /// [`WorkspaceSync::new()`](wsync_engine::WorkspaceSync::new) will.
    pub fn sync_options(&self) -> Result<SyncOptions> {
        let bucket = self.bucket.clone().ok_or_raise(|| ErrorKind::Missing("bucket"))?;
        let prefix = self.prefix.clone().ok_or_raise(|| ErrorKind::Missing("prefix"))?;
        let workspace_dir = self.workspace_dir.clone().ok_or_raise(|| ErrorKind::Missing("workspace_dir"))?;
        let mut options = SyncOptions::new(bucket, prefix, workspace_dir)
            .download_concurrency(self.download_concurrency)
            .upload_concurrency(self.upload_concurrency)
            .ignore_patterns(self.ignore_patterns.iter().cloned());
        if let Some(region) = &self.region {
            options = options.region(region.clone());
        }
        options.target().or_raise(|| ErrorKind::Engine)?;
        Ok(options)
    }

    /// An S3 client for the configured endpoint, in the region `target`
    /// resolved.
    pub fn object_store(&self, target: &SyncTarget) -> Result<StoreHandle> {
        let credentials = S3Credentials {
            key_id: self.access_key_id.clone().ok_or_raise(|| ErrorKind::Missing("access_key_id"))?,
            key_secret: self.secret_access_key.clone().ok_or_raise(|| ErrorKind::Missing("secret_access_key"))?,
            session_token: self.session_token.clone(),
        };
        Ok(Arc::new(S3Backend::new("s3", target.region(), self.endpoint.clone(), credentials)))
    }
}

/// Human-readable dump with credentials reduced to whether they are set.
impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        fn opt<T: Display>(value: Option<T>) -> String {
            value.map_or_else(|| "<unset>".to_string(), |v| v.to_string())
        }
        fn secret(value: Option<&String>) -> &'static str {
            if value.is_some() { "<set>" } else { "<unset>" }
        }
        writeln!(f, "bucket = {}", opt(self.bucket.as_ref()))?;
        writeln!(f, "prefix = {}", opt(self.prefix.as_ref()))?;
        writeln!(f, "workspace_dir = {}", opt(self.workspace_dir.as_ref().map(|p| p.display())))?;
        writeln!(f, "region = {}", opt(self.region.as_ref()))?;
        writeln!(f, "endpoint = {}", opt(self.endpoint.as_ref()))?;
        writeln!(f, "download_concurrency = {}", self.download_concurrency)?;
        writeln!(f, "upload_concurrency = {}", self.upload_concurrency)?;
        writeln!(f, "ignore_patterns = [{}]", self.ignore_patterns.join(", "))?;
        writeln!(f, "access_key_id = {}", secret(self.access_key_id.as_ref()))?;
        writeln!(f, "secret_access_key = {}", secret(self.secret_access_key.as_ref()))?;
        write!(f, "session_token = {}", secret(self.session_token.as_ref()))
    }
}

fn file_provider(path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
    let figment = Figment::new();
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::Format(path.to_path_buf())),
    })
}
