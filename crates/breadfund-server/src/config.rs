use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use jsonwebtoken::Algorithm;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Symmetric algorithms accepted for token signing.
const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

#[derive(Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_issuer: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub public_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("BREADFUND_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("BREADFUND_JWT_SECRET is unset or still a placeholder");
        }

        let alg_name = var("BREADFUND_JWT_ALG", "HS256");
        let jwt_algorithm = Algorithm::from_str(&alg_name)
            .ok()
            .filter(|alg| ALLOWED_ALGORITHMS.contains(alg))
            .with_context(|| format!("BREADFUND_JWT_ALG '{}' is not one of HS256, HS384, HS512", alg_name))?;

        let host = var("BREADFUND_HOST", "0.0.0.0");
        let port: u16 = var("BREADFUND_PORT", "8000")
            .parse()
            .context("BREADFUND_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("BREADFUND_HOST must be an IP address")?;

        let max_upload_mb: usize = var("BREADFUND_MAX_UPLOAD_MB", "16")
            .parse()
            .context("BREADFUND_MAX_UPLOAD_MB must be an integer")?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .context("BREADFUND_MAX_UPLOAD_MB is too large")?;

        Ok(Self {
            jwt_secret,
            jwt_algorithm,
            token_issuer: var("BREADFUND_TOKEN_ISSUER", "http://localhost:8000"),
            db_path: var("BREADFUND_DB_PATH", "breadfund.db").into(),
            addr,
            public_url: var("BREADFUND_PUBLIC_URL", "http://localhost:8000"),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = config(&[("BREADFUND_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.jwt_algorithm, Algorithm::HS256);
        assert_eq!(cfg.addr.port(), 8000);
        assert_eq!(cfg.db_path, PathBuf::from("breadfund.db"));
        assert_eq!(cfg.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn placeholder_or_missing_secret_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("BREADFUND_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn asymmetric_or_unknown_algorithms_are_rejected() {
        assert!(config(&[("BREADFUND_JWT_SECRET", "s"), ("BREADFUND_JWT_ALG", "RS256")]).is_err());
        assert!(config(&[("BREADFUND_JWT_SECRET", "s"), ("BREADFUND_JWT_ALG", "nope")]).is_err());

        let cfg = config(&[("BREADFUND_JWT_SECRET", "s"), ("BREADFUND_JWT_ALG", "HS512")]).unwrap();
        assert_eq!(cfg.jwt_algorithm, Algorithm::HS512);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config(&[("BREADFUND_JWT_SECRET", "s"), ("BREADFUND_PORT", "http")]).is_err());
    }

    #[test]
    fn oversized_upload_limit_is_rejected() {
        let err = config(&[
            ("BREADFUND_JWT_SECRET", "s"),
            ("BREADFUND_MAX_UPLOAD_MB", "18446744073709551615"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("too large"));

        let cfg = config(&[("BREADFUND_JWT_SECRET", "s"), ("BREADFUND_MAX_UPLOAD_MB", "2")]).unwrap();
        assert_eq!(cfg.max_upload_bytes, 2 * 1024 * 1024);
    }
}
