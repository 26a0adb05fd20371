use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    // HTTP server
    pub host: String,
    pub port: u16,

    // Supabase (identity provider + record store)
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Table holding the generated site, one row per user
    pub sites_table: String,

    // Netlify (hosting)
    pub netlify_token: Option<String>,
    pub netlify_api_base: String,

    // Site-name allocation
    pub name_alloc_max_attempts: u32,

    // Deploy readiness polling
    pub deploy_poll_interval: Duration,
    pub deploy_poll_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,

            supabase_url: std::env::var("SUPABASE_URL")
                .ok()
                .map(|u| u.trim_end_matches('/').to_string()),
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY").ok(),
            sites_table: std::env::var("SUPABASE_SITES_TABLE")
                .unwrap_or_else(|_| "wedding_sites".to_string()),

            netlify_token: std::env::var("NETLIFY_API_TOKEN").ok(),
            netlify_api_base: std::env::var("NETLIFY_API_BASE")
                .unwrap_or_else(|_| "https://api.netlify.com/api/v1".to_string())
                .trim_end_matches('/')
                .to_string(),

            name_alloc_max_attempts: std::env::var("NAME_ALLOC_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,

            deploy_poll_interval: Duration::from_millis(
                std::env::var("DEPLOY_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()?,
            ),
            deploy_poll_max_attempts: std::env::var("DEPLOY_POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
        })
    }
}
