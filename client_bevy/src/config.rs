use bevy::log::warn;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ws_url: String,
    /// Frequency of the headless update loop
    pub tick_hz: u32,
    /// Let the scripted bot drive the local player
    pub bot: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:3000/ws".to_string(),
            tick_hz: 60,
            bot: true,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `VOLLEY_WS_URL`, `VOLLEY_TICK_HZ` and `VOLLEY_BOT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("VOLLEY_WS_URL") {
            config.ws_url = url;
        }
        if let Ok(hz) = std::env::var("VOLLEY_TICK_HZ") {
            match hz.parse() {
                Ok(n) => config.tick_hz = n,
                Err(_) => warn!("Ignoring invalid VOLLEY_TICK_HZ={}", hz),
            }
        }
        if let Ok(bot) = std::env::var("VOLLEY_BOT") {
            config.bot = !matches!(bot.as_str(), "0" | "false" | "off");
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.ws_url)
            .map_err(|e| format!("invalid ws_url '{}': {}", self.ws_url, e))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(format!("ws_url must use ws:// or wss://, got {}", url.scheme()));
        }
        if self.tick_hz == 0 || self.tick_hz > 1000 {
            return Err("tick_hz must be in 1..=1000".to_string());
        }
        Ok(())
    }

    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_hz as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_config_is_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn http_url_is_rejected() {
        let config = ClientConfig {
            ws_url: "http://localhost:3000/ws".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn garbage_url_is_rejected() {
        let config = ClientConfig {
            ws_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tick_rate_invalid() {
        let config = ClientConfig {
            tick_hz: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
