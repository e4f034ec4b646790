//! Client configuration.

use std::time::Duration;

use gachalink_protocol::PullKind;
use gachalink_reveal::RevealConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What each pull kind costs, in the server's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullCosts {
    /// Default: 160.
    pub single: u32,
    /// Default: 1600.
    pub ten: u32,
}

impl Default for PullCosts {
    fn default() -> Self {
        Self {
            single: 160,
            ten: 1600,
        }
    }
}

impl PullCosts {
    /// The cost of one pull of `kind`.
    pub fn cost(&self, kind: PullKind) -> u32 {
        match kind {
            PullKind::Single => self.single,
            PullKind::Ten => self.ten,
        }
    }
}

/// Everything a [`GachaClient`](crate::GachaClient) needs to know up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server endpoint. Default: `ws://localhost:8080/ws`.
    pub url: String,
    pub costs: PullCosts,
    pub reveal: RevealConfig,
    /// Send a `ping` this often while connected. `None` (the default)
    /// disables the keep-alive.
    pub ping_interval_secs: Option<f64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_owned(),
            costs: PullCosts::default(),
            reveal: RevealConfig::default(),
            ping_interval_secs: None,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_URL: &'static str = "ws://localhost:8080/ws";

    /// Default config pointed at `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn costs(mut self, costs: PullCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn reveal(mut self, reveal: RevealConfig) -> Self {
        self.reveal = reveal;
        self
    }

    /// Enables the keep-alive ping.
    pub fn ping_every(mut self, interval: Duration) -> Self {
        self.ping_interval_secs = Some(interval.as_secs_f64());
        self
    }

    /// The keep-alive interval, if one is set and usable. Zero, negative,
    /// non-finite and unrepresentably large values disable it.
    pub fn ping_interval(&self) -> Option<Duration> {
        let secs = self.ping_interval_secs?;
        if secs <= 0.0 {
            return None;
        }
        match Duration::try_from_secs_f64(secs) {
            Ok(interval) => Some(interval),
            Err(e) => {
                warn!(secs, error = %e, "unusable ping interval, keep-alive disabled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_costs() {
        let costs = PullCosts::default();
        assert_eq!(costs.cost(PullKind::Single), 160);
        assert_eq!(costs.cost(PullKind::Ten), 1600);
    }

    #[test]
    fn test_default_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.url, "ws://localhost:8080/ws");
        assert_eq!(cfg.ping_interval(), None);
        assert_eq!(cfg.reveal, RevealConfig::default());
    }

    #[test]
    fn test_builder_setters() {
        let cfg = ClientConfig::with_url("ws://gacha.example/ws")
            .costs(PullCosts { single: 100, ten: 900 })
            .reveal(RevealConfig::instant())
            .ping_every(Duration::from_secs(15));
        assert_eq!(cfg.url, "ws://gacha.example/ws");
        assert_eq!(cfg.costs.ten, 900);
        assert_eq!(cfg.ping_interval(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_unusable_ping_interval_is_disabled() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e20] {
            let cfg = ClientConfig {
                ping_interval_secs: Some(secs),
                ..Default::default()
            };
            assert_eq!(cfg.ping_interval(), None);
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let cfg: ClientConfig = serde_json::from_str(
            r#"{ "url": "ws://10.0.0.2:8080/ws", "costs": { "ten": 1500 }, "ping_interval_secs": 30 }"#,
        )
        .unwrap();
        assert_eq!(cfg.url, "ws://10.0.0.2:8080/ws");
        assert_eq!(cfg.costs, PullCosts { single: 160, ten: 1500 });
        assert_eq!(cfg.ping_interval(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.reveal, RevealConfig::default());
    }
}
