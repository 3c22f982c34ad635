use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A row in the `sites` table: the public web presentation of an app.
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: String,
    pub app_id: String,
    pub title: String,
    pub icon: Option<String>,
    pub icon_background: Option<String>,
    pub description: Option<String>,
    pub default_language: String,
    pub copyright: Option<String>,
    pub privacy_policy: Option<String>,
    pub custom_disclaimer: Option<String>,
    pub customize_domain: Option<String>,
    pub customize_token_strategy: String,
    pub prompt_public: bool,
    pub status: String,
    /// Public access code; unique across all sites.
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl SiteRecord {
    pub const CODE_LEN: usize = 16;

    /// Random alphanumeric access code of [`Self::CODE_LEN`] characters.
    pub fn generate_code() -> String {
        let mut code = Uuid::new_v4().simple().to_string();
        code.truncate(Self::CODE_LEN);
        code
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generated_codes_are_short_and_distinct() {
        let a = SiteRecord::generate_code();
        let b = SiteRecord::generate_code();
        assert_eq!(a.len(), SiteRecord::CODE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
