use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.epsonconnect.com";

/// Connection settings for a device account. Explicit values win; anything
/// left empty falls back to the `EPSON_CONNECT_API_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub printer_email: String,
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config {
            printer_email: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        };

        if let Ok(printer_email) = std::env::var("EPSON_CONNECT_API_PRINTER_EMAIL") {
            config.printer_email = printer_email;
        }
        if let Ok(client_id) = std::env::var("EPSON_CONNECT_API_CLIENT_ID") {
            config.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var("EPSON_CONNECT_API_CLIENT_SECRET") {
            config.client_secret = client_secret;
        }
        if let Ok(base_url) = std::env::var("EPSON_CONNECT_API_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }
}
