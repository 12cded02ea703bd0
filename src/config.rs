use anyhow::Context;
use serde::Deserialize;

/// One year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2id parameters. `iterations` is the work factor.
///
/// Defaults are Argon2's own recommendations (19 MiB, 2 passes). This is not
/// bcrypt's cost of 10: Argon2 cost grows with memory as well as passes, and
/// 10 passes at 19 MiB is several times slower than bcrypt at 10.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub server: ServerConfig,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL");
        let jwt = JwtConfig {
            secret: var("JWT_SECRET")
                .or_else(|| var("SECRETKEY"))
                .context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "mobile-auth".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "mobile-auth-users".into()),
            ttl_minutes: parse_or(var("JWT_TTL_MINUTES"), "JWT_TTL_MINUTES", 60)?,
        };
        if !(1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            anyhow::bail!(
                "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
                jwt.ttl_minutes
            );
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(
                var("PASSWORD_HASH_MEMORY_KIB"),
                "PASSWORD_HASH_MEMORY_KIB",
                defaults.memory_kib,
            )?,
            iterations: parse_or(
                var("PASSWORD_HASH_COST"),
                "PASSWORD_HASH_COST",
                defaults.iterations,
            )?,
            parallelism: parse_or(
                var("PASSWORD_HASH_PARALLELISM"),
                "PASSWORD_HASH_PARALLELISM",
                defaults.parallelism,
            )?,
        };

        let port = match var("APP_PORT") {
            Some(v) => parse_or(Some(v), "APP_PORT", 8080)?,
            None => parse_or(var("PORT"), "PORT", 8080)?,
        };
        let server = ServerConfig {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        };

        let cookie_secure = parse_or(var("COOKIE_SECURE"), "COOKIE_SECURE", false)?;

        Ok(Self {
            database_url,
            jwt,
            password,
            server,
            cookie_secure,
        })
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.jwt.ttl_minutes.clamp(0, MAX_TTL_MINUTES) * 60
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = load(&[("JWT_SECRET", "s3cret")]).expect("config");
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.jwt.issuer, "mobile-auth");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.password.iterations, argon2::Params::DEFAULT_T_COST);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert!(!cfg.cookie_secure);
        assert_eq!(cfg.session_ttl_seconds(), 3600);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn legacy_secret_name_is_accepted() {
        let cfg = load(&[("SECRETKEY", "legacy")]).expect("config");
        assert_eq!(cfg.jwt.secret, "legacy");
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("PASSWORD_HASH_COST", "4"),
            ("PORT", "9090"),
            ("COOKIE_SECURE", "true"),
            ("JWT_TTL_MINUTES", "15"),
        ])
        .expect("config");
        assert_eq!(cfg.password.iterations, 4);
        assert_eq!(cfg.server.port, 9090);
        assert!(cfg.cookie_secure);
        assert_eq!(cfg.session_ttl_seconds(), 900);
    }

    #[test]
    fn app_port_wins_over_port() {
        let cfg = load(&[("JWT_SECRET", "s"), ("PORT", "1"), ("APP_PORT", "2")]).expect("config");
        assert_eq!(cfg.server.port, 2);
    }

    #[test]
    fn ttl_outside_range_is_rejected() {
        for ttl in ["0", "-5", "10000000000000", "525601"] {
            let err = load(&[("JWT_SECRET", "s"), ("JWT_TTL_MINUTES", ttl)]).unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "ttl: {ttl}");
        }
        let cfg = load(&[("JWT_SECRET", "s"), ("JWT_TTL_MINUTES", "525600")]).expect("config");
        assert_eq!(cfg.session_ttl_seconds(), MAX_TTL_MINUTES * 60);
    }

    #[test]
    fn garbage_number_is_rejected() {
        let err = load(&[("JWT_SECRET", "s"), ("PASSWORD_HASH_COST", "ten")]).unwrap_err();
        assert!(err.to_string().contains("PASSWORD_HASH_COST"));
    }
}
