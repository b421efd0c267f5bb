use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub allowed_email_domains: Vec<String>,
    pub admin_token: String,
    pub registration_max_attempts: u32,
    pub registration_retry_base_ms: u64,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            allowed_email_domains: parse_domains(
                &env::var("ALLOWED_EMAIL_DOMAINS").unwrap_or_else(|_| "umich.edu".to_string()),
            ),
            admin_token: env::var("ADMIN_TOKEN").expect("ADMIN_TOKEN must be set"),
            registration_max_attempts: env::var("REGISTRATION_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .expect("REGISTRATION_MAX_ATTEMPTS must be a number"),
            registration_retry_base_ms: env::var("REGISTRATION_RETRY_BASE_MS")
                .unwrap_or_else(|_| "25".to_string())
                .parse()
                .expect("REGISTRATION_RETRY_BASE_MS must be a number"),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        }
    }
}

/// Comma separated list; an empty list falls back to the default institution.
fn parse_domains(raw: &str) -> Vec<String> {
    let domains: Vec<String> = raw
        .split(',')
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();

    if domains.is_empty() {
        vec!["umich.edu".to_string()]
    } else {
        domains
    }
}
