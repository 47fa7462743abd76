/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    pub broadcast_rate_hz: u32,
    /// Number of seats in the match; connections beyond this are rejected
    pub player_slots: usize,
    /// CORS origins allowed to open the socket. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            tick_rate_hz: 60,
            broadcast_rate_hz: 20,
            player_slots: 2,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `VOLLEY_LISTEN_ADDR`, `VOLLEY_PLAYER_SLOTS`
    /// and `VOLLEY_ALLOWED_ORIGINS` (comma separated).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("VOLLEY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(slots) = std::env::var("VOLLEY_PLAYER_SLOTS") {
            match slots.parse() {
                Ok(n) => config.player_slots = n,
                Err(_) => tracing::warn!("Ignoring invalid VOLLEY_PLAYER_SLOTS={}", slots),
            }
        }
        if let Ok(origins) = std::env::var("VOLLEY_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.broadcast_rate_hz == 0 || self.broadcast_rate_hz > self.tick_rate_hz {
            return Err("broadcast_rate_hz must be in 1..=tick_rate_hz".to_string());
        }
        if self.player_slots == 0 {
            return Err("player_slots must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn broadcast_faster_than_tick_invalid() {
        let config = ServerConfig {
            tick_rate_hz: 30,
            broadcast_rate_hz: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_slots_invalid() {
        let config = ServerConfig {
            player_slots: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
