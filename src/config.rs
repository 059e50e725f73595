//! Configuration file loading.
//!
//! The bot reads one YAML file at startup. Every value is validated here so
//! the rest of the program only sees well-formed configuration; any problem
//! is a [`ConfigError`] and prevents startup.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::github::{DEFAULT_CONTEXT, DEFAULT_TIMEOUT};
use crate::tracker::ApprovalPolicy;
use crate::types::{InvalidRepoId, RepoId};

/// Errors that prevent the configuration from loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Repo(#[from] InvalidRepoId),

    #[error("required-reviews must be at least 1")]
    NoRequiredReviews,

    #[error("invalid review-pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid webhook-server.addr '{0}'")]
    Addr(String),

    #[error("status-timeout-secs must be positive")]
    Timeout,

    #[error("webhook-server.{field} must start with '/', got '{value}'")]
    Path { field: &'static str, value: String },

    #[error("webhook-server.pr-path and comment-path must differ")]
    SamePaths,

    #[error("webhook-server.{field} '{value}' is reserved")]
    ReservedPath { field: &'static str, value: String },

    #[error("webhook-server.certificate and certificate-key must be set together")]
    PartialTls,
}

/// The file format, before validation.
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    repo: String,
    required_reviews: u32,
    #[serde(default)]
    reviewers: Option<Vec<String>>,
    review_pattern: String,
    #[serde(default)]
    self_review: bool,
    #[serde(default)]
    dedupe_reviewers: bool,
    access_token: String,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    status_context: Option<String>,
    #[serde(default)]
    status_timeout_secs: Option<u64>,
    webhook_server: RawWebhookServer,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawWebhookServer {
    addr: String,
    #[serde(default)]
    certificate: Option<PathBuf>,
    #[serde(default)]
    certificate_key: Option<PathBuf>,
    pr_path: String,
    comment_path: String,
    secret: String,
}

/// Validated bot configuration.
#[derive(Clone)]
pub struct Config {
    pub repo: RepoId,
    pub required_reviews: u32,
    pub reviewers: Option<Vec<String>>,
    pub review_pattern: Regex,
    pub self_review: bool,
    pub dedupe_reviewers: bool,
    pub access_token: String,
    pub api_base: Option<String>,
    pub status_context: String,
    pub status_timeout: Duration,
    pub webhook_server: WebhookServerConfig,
}

/// Listener settings.
#[derive(Clone)]
pub struct WebhookServerConfig {
    pub addr: SocketAddr,
    pub tls: Option<TlsFiles>,
    pub pr_path: String,
    pub comment_path: String,
    pub secret: String,
}

/// PEM certificate chain and private key for the TLS listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parses and validates configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        raw.validate()
    }

    pub fn repo_id(&self) -> &RepoId {
        &self.repo
    }

    /// The pattern a comment must match to count as an approval.
    pub fn approval_pattern(&self) -> &Regex {
        &self.review_pattern
    }

    pub fn approval_policy(&self) -> ApprovalPolicy {
        let policy = ApprovalPolicy::new(self.required_reviews)
            .with_self_review(self.self_review)
            .with_dedupe_reviewers(self.dedupe_reviewers);
        match &self.reviewers {
            Some(reviewers) => policy.with_reviewers(reviewers),
            None => policy,
        }
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        let repo: RepoId = self.repo.parse()?;

        if self.required_reviews == 0 {
            return Err(ConfigError::NoRequiredReviews);
        }
        if self.review_pattern.is_empty() {
            return Err(ConfigError::Empty("review-pattern"));
        }
        let review_pattern = Regex::new(&self.review_pattern)?;

        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Empty("access-token"));
        }

        let status_timeout = match self.status_timeout_secs {
            Some(0) => return Err(ConfigError::Timeout),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let status_context = match self.status_context {
            Some(ctx) if ctx.trim().is_empty() => return Err(ConfigError::Empty("status-context")),
            Some(ctx) => ctx,
            None => DEFAULT_CONTEXT.to_string(),
        };

        Ok(Config {
            repo,
            required_reviews: self.required_reviews,
            reviewers: self.reviewers,
            review_pattern,
            self_review: self.self_review,
            dedupe_reviewers: self.dedupe_reviewers,
            access_token: self.access_token,
            api_base: self.api_base.filter(|base| !base.trim().is_empty()),
            status_context,
            status_timeout,
            webhook_server: self.webhook_server.validate()?,
        })
    }
}

impl RawWebhookServer {
    fn validate(self) -> Result<WebhookServerConfig, ConfigError> {
        let addr = self
            .addr
            .parse()
            .map_err(|_| ConfigError::Addr(self.addr.clone()))?;

        check_path("pr-path", &self.pr_path)?;
        check_path("comment-path", &self.comment_path)?;
        if self.pr_path == self.comment_path {
            return Err(ConfigError::SamePaths);
        }

        if self.secret.is_empty() {
            return Err(ConfigError::Empty("webhook-server.secret"));
        }

        let tls = match (self.certificate, self.certificate_key) {
            (Some(certificate), Some(key)) => Some(TlsFiles { certificate, key }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(WebhookServerConfig {
            addr,
            tls,
            pr_path: self.pr_path,
            comment_path: self.comment_path,
            secret: self.secret,
        })
    }
}

/// Paths served by the bot itself.
const RESERVED_PATHS: &[&str] = &["/health", "/pending"];

fn check_path(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Path {
            field,
            value: value.to_string(),
        });
    }
    if RESERVED_PATHS.contains(&value) {
        return Err(ConfigError::ReservedPath {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repo", &self.repo)
            .field("required_reviews", &self.required_reviews)
            .field("reviewers", &self.reviewers)
            .field("review_pattern", &self.review_pattern.as_str())
            .field("self_review", &self.self_review)
            .field("dedupe_reviewers", &self.dedupe_reviewers)
            .field("api_base", &self.api_base)
            .field("status_context", &self.status_context)
            .field("status_timeout", &self.status_timeout)
            .field("webhook_server", &self.webhook_server)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for WebhookServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookServerConfig")
            .field("addr", &self.addr)
            .field("tls", &self.tls)
            .field("pr_path", &self.pr_path)
            .field("comment_path", &self.comment_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
repo: rolandshoemaker/rplus
required-reviews: 2
review-pattern: 'r\+'
access-token: token
webhook-server:
  addr: 127.0.0.1:8080
  pr-path: /pr
  comment-path: /comment
  secret: s3cret
"#;

    fn with_line(extra: &str) -> String {
        format!("{MINIMAL}{extra}\n")
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();

        assert_eq!(config.repo_id(), &RepoId::new("rolandshoemaker", "rplus"));
        assert_eq!(config.required_reviews, 2);
        assert!(config.reviewers.is_none());
        assert!(!config.self_review);
        assert!(!config.dedupe_reviewers);
        assert_eq!(config.status_context, "github/reviews");
        assert_eq!(config.status_timeout, Duration::from_secs(10));
        assert!(config.api_base.is_none());
        assert!(config.webhook_server.tls.is_none());
        assert_eq!(
            config.webhook_server.addr,
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(config.approval_pattern().is_match("r+"));
        assert!(!config.approval_pattern().is_match("r-"));
    }

    #[test]
    fn full_config() {
        let text = r#"
repo: owner/name
required-reviews: 1
reviewers: [alice, bob]
review-pattern: '^LGTM'
self-review: true
dedupe-reviewers: true
access-token: token
api-base: https://ghe.example.com/api/v3
status-context: ci/reviews
status-timeout-secs: 3
webhook-server:
  addr: 0.0.0.0:443
  certificate: cert.pem
  certificate-key: key.pem
  pr-path: /hooks/pr
  comment-path: /hooks/comment
  secret: s3cret
"#;
        let config = Config::from_yaml_str(text).unwrap();

        assert_eq!(config.api_base.as_deref(), Some("https://ghe.example.com/api/v3"));
        assert_eq!(config.status_context, "ci/reviews");
        assert_eq!(config.status_timeout, Duration::from_secs(3));
        assert_eq!(
            config.webhook_server.tls,
            Some(TlsFiles {
                certificate: "cert.pem".into(),
                key: "key.pem".into(),
            })
        );

        let policy = config.approval_policy();
        assert_eq!(policy.required_reviews, 1);
        assert!(policy.self_review);
        assert!(policy.dedupe_reviewers);
        assert!(policy.is_allowed_reviewer("alice"));
        assert!(!policy.is_allowed_reviewer("mallory"));
    }

    #[test]
    fn rejects_zero_required_reviews() {
        let text = MINIMAL.replace("required-reviews: 2", "required-reviews: 0");
        assert!(matches!(
            Config::from_yaml_str(&text),
            Err(ConfigError::NoRequiredReviews)
        ));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let text = MINIMAL.replace(r"'r\+'", "'r('");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Pattern(_))));
    }

    #[test]
    fn rejects_bad_repo() {
        let text = MINIMAL.replace("rolandshoemaker/rplus", "rplus");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Repo(_))));
    }

    #[test]
    fn rejects_empty_secret_and_token() {
        let text = MINIMAL.replace("secret: s3cret", "secret: ''");
        assert!(matches!(
            Config::from_yaml_str(&text),
            Err(ConfigError::Empty("webhook-server.secret"))
        ));

        let text = MINIMAL.replace("access-token: token", "access-token: ''");
        assert!(matches!(
            Config::from_yaml_str(&text),
            Err(ConfigError::Empty("access-token"))
        ));
    }

    #[test]
    fn rejects_bad_addr() {
        let text = MINIMAL.replace("127.0.0.1:8080", "localhost");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Addr(_))));
    }

    #[test]
    fn rejects_zero_timeout() {
        let text = with_line("status-timeout-secs: 0");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Timeout)));
    }

    #[test]
    fn rejects_bad_paths() {
        let text = MINIMAL.replace("pr-path: /pr", "pr-path: pr");
        assert!(matches!(
            Config::from_yaml_str(&text),
            Err(ConfigError::Path { field: "pr-path", .. })
        ));

        let text = MINIMAL.replace("comment-path: /comment", "comment-path: /pr");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::SamePaths)));

        let text = MINIMAL.replace("comment-path: /comment", "comment-path: /health");
        assert!(matches!(
            Config::from_yaml_str(&text),
            Err(ConfigError::ReservedPath { field: "comment-path", .. })
        ));
    }

    #[test]
    fn rejects_certificate_without_key() {
        let text = MINIMAL.replace("  secret: s3cret", "  secret: s3cret\n  certificate: cert.pem");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::PartialTls)));
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = with_line("reviewer-count: 3");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn rejects_missing_required_key() {
        let text = MINIMAL.replace("access-token: token\n", "");
        assert!(matches!(Config::from_yaml_str(&text), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.required_reviews, 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.yml")).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.yml"));
    }

    #[test]
    fn debug_hides_credentials() {
        let config = Config::from_yaml_str(MINIMAL).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("token"));
    }
}
