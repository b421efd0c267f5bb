use crate::error::AppError;

/// Institutional email policy. Only addresses at one of the allowed domains may register.
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    allowed_domains: Vec<String>,
}

impl EmailPolicy {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self { allowed_domains }
    }

    /// Canonical identity form of an email address.
    pub fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn describe(&self) -> String {
        self.allowed_domains.join(" or ")
    }

    /// Returns the normalized address when it is well formed and at an allowed domain.
    pub fn validate(&self, email: &str) -> Result<String, AppError> {
        let normalized = Self::normalize(email);

        let Some((local, domain)) = normalized.rsplit_once('@') else {
            return Err(AppError::InvalidEmailDomain(self.describe()));
        };

        if local.is_empty() || local.contains('@') || normalized.contains(char::is_whitespace) {
            return Err(AppError::InvalidEmailDomain(self.describe()));
        }

        if !self.allowed_domains.iter().any(|allowed| allowed == domain) {
            return Err(AppError::InvalidEmailDomain(self.describe()));
        }

        Ok(normalized)
    }
}
