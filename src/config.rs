use std::net::IpAddr;

use ipnet::IpNet;

/// Largest PDF accepted by the upload route.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body cap: a full-size upload plus its multipart framing.
pub const DEFAULT_MAX_BODY_SIZE: usize = MAX_UPLOAD_BYTES + 64 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub cors_origins: Vec<String>,
    pub submission_rate_limit: u32,
    pub submission_rate_window_secs: u64,
    pub log_level: String,
    pub organization_name: String,
    pub smtp: Option<SmtpConfig>,
    pub creator: CreatorConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Connection settings for the external Creator platform.
#[derive(Clone)]
pub struct CreatorConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: String,
    pub org_id: String,
    pub app_id: String,
    pub proposal_form: String,
    pub concept_form: String,
    pub community_form: String,
    pub report_name: String,
    /// Base for form (record create) calls, e.g. `https://creator.zoho.com/api/v2`.
    pub api_base: String,
    /// Base for report/upload calls, e.g. `https://www.zohoapis.com/creator/v2.1/data`.
    pub data_base: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CreatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatorConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("refresh_token", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("app_id", &self.app_id)
            .field("proposal_form", &self.proposal_form)
            .field("concept_form", &self.concept_form)
            .field("community_form", &self.community_form)
            .field("report_name", &self.report_name)
            .field("api_base", &self.api_base)
            .field("data_base", &self.data_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let host: IpAddr = env_or("INTAKE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid INTAKE_HOST: {e}"))?;

        let port: u16 = env_or("INTAKE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid INTAKE_PORT: {e}"))?;

        let max_body_size: usize =
            env_or("INTAKE_MAX_BODY_SIZE", &DEFAULT_MAX_BODY_SIZE.to_string())
                .parse()
                .map_err(|e| format!("Invalid INTAKE_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("INTAKE_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid INTAKE_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let cors_origins: Vec<String> = env_or("INTAKE_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let submission_rate_limit: u32 = env_or("INTAKE_SUBMISSION_RATE_LIMIT", "10")
            .parse()
            .map_err(|e| format!("Invalid INTAKE_SUBMISSION_RATE_LIMIT: {e}"))?;

        let submission_rate_window_secs: u64 = env_or("INTAKE_SUBMISSION_RATE_WINDOW_SECS", "60")
            .parse()
            .map_err(|e| format!("Invalid INTAKE_SUBMISSION_RATE_WINDOW_SECS: {e}"))?;

        let log_level = env_or("INTAKE_LOG_LEVEL", "info");
        let organization_name = env_or("INTAKE_ORGANIZATION_NAME", "Belize Fund");

        let smtp = match (
            std::env::var("INTAKE_SMTP_HOST").ok(),
            std::env::var("INTAKE_SMTP_PORT").ok(),
            std::env::var("INTAKE_SMTP_USER").ok(),
            std::env::var("INTAKE_SMTP_PASS").ok(),
            std::env::var("INTAKE_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid INTAKE_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        let creator = CreatorConfig::from_env()?;

        Ok(Config {
            database_url,
            host,
            port,
            max_body_size,
            trusted_proxies,
            cors_origins,
            submission_rate_limit,
            submission_rate_window_secs,
            log_level,
            organization_name,
            smtp,
            creator,
        })
    }
}

impl CreatorConfig {
    pub fn from_env() -> Result<Self, String> {
        let proposal_form = env_required("ZOHO_CREATOR_FORM_NAME")?;
        let community_form = env_or("ZOHO_CREATOR_COMMUNITY_FORM_NAME", &proposal_form);

        Ok(CreatorConfig {
            token_url: env_required("ZOHO_TOKEN_URL")?,
            client_id: env_required("ZOHO_CLIENT_ID")?,
            client_secret: env_required("ZOHO_CLIENT_SECRET")?,
            redirect_uri: env_required("ZOHO_REDIRECT_URI")?,
            refresh_token: env_required("ZOHO_REFRESH_TOKEN")?,
            org_id: env_required("ZOHO_CREATOR_ORG_ID")?,
            app_id: env_required("ZOHO_CREATOR_APP_ID")?,
            concept_form: env_required("ZOHO_CREATOR_FORM2_NAME")?,
            proposal_form,
            community_form,
            report_name: env_or("ZOHO_CREATOR_REPORT_NAME", "All_Gap_Concept_Paper"),
            api_base: env_or("ZOHO_CREATOR_API_BASE", "https://creator.zoho.com/api/v2"),
            data_base: env_or(
                "ZOHO_CREATOR_DATA_BASE",
                "https://www.zohoapis.com/creator/v2.1/data",
            ),
            timeout_secs: 30,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
