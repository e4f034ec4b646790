//! Payload types carried inside an envelope's `data` string.
//!
//! Field names follow the server's camelCase JSON (`isNew`, `imageUrl`,
//! `pityCount`), mapped onto snake_case Rust fields with
//! `#[serde(rename_all = "camelCase")]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{OutboundKind, ProtocolError};

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// The three rarity tiers the server hands out.
///
/// The numeric level on the wire (3, 4, 5) is authoritative. The client
/// only ever *maps* it to presentation; it never derives a rarity on its
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    /// Level 3.
    R,
    /// Level 4.
    Sr,
    /// Level 5.
    Ssr,
}

impl Rarity {
    /// Maps a wire level to a tier. Levels outside 3..=5 have no tier.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            3 => Some(Self::R),
            4 => Some(Self::Sr),
            5 => Some(Self::Ssr),
            _ => None,
        }
    }

    /// The wire level for this tier.
    pub fn level(self) -> u8 {
        match self {
            Self::R => 3,
            Self::Sr => 4,
            Self::Ssr => 5,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::R => "R",
            Self::Sr => "SR",
            Self::Ssr => "SSR",
        })
    }
}

// ---------------------------------------------------------------------------
// Character / PullResult
// ---------------------------------------------------------------------------

/// One character as the server describes it.
///
/// Only `PartialEq` (not `Eq`) because `rate` is a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u32,
    pub name: String,
    /// Wire rarity level: 3 = R, 4 = SR, 5 = SSR.
    pub rarity: u8,
    /// Reference to the character art. Opaque to this crate.
    #[serde(default)]
    pub image_url: String,
    /// Pull-rate weight as published by the server.
    #[serde(default)]
    pub rate: f32,
}

impl Character {
    /// The rarity tier for this character, if its level is a known one.
    pub fn tier(&self) -> Option<Rarity> {
        Rarity::from_level(self.rarity)
    }
}

/// The outcome of one pull request (1 or 10 characters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResult {
    /// Characters in reveal order.
    pub characters: Vec<Character>,
    /// `is_new[i]` is true if `characters[i]` was not owned before.
    pub is_new: Vec<bool>,
    /// Server timestamp of the pull.
    #[serde(default)]
    pub timestamp: i64,
}

impl PullResult {
    /// Checks the one structural rule the server must honor:
    /// `is_new` runs parallel to `characters`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the lengths differ.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.is_new.len() != self.characters.len() {
            return Err(ProtocolError::InvalidMessage(format!(
                "pull result has {} characters but {} isNew flags",
                self.characters.len(),
                self.is_new.len()
            )));
        }
        Ok(())
    }

    /// Number of characters in this result.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Whether the result holds no characters.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

// ---------------------------------------------------------------------------
// UserInfo
// ---------------------------------------------------------------------------

/// A snapshot of the player's account as last pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    /// Spendable pull currency.
    pub currency: u32,
    /// Pulls since the last SSR, 0..=[`UserInfo::PITY_CAP`].
    #[serde(default)]
    pub pity_count: u32,
}

impl UserInfo {
    /// The pull count at which the server guarantees an SSR.
    pub const PITY_CAP: u32 = 90;
}

// ---------------------------------------------------------------------------
// Pool / inventory
// ---------------------------------------------------------------------------

/// Published rates, already formatted by the server (e.g. `"2%"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateInfo {
    #[serde(default)]
    pub ssr: String,
    #[serde(default)]
    pub sr: String,
    #[serde(default)]
    pub r: String,
}

/// The contents of the current pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub characters: Vec<Character>,
    #[serde(default)]
    pub rates: RateInfo,
    /// Human-readable description of the pity rule.
    #[serde(default)]
    pub pity_system: String,
}

/// Characters the player owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub inventory: Vec<Character>,
    #[serde(default)]
    pub count: u32,
}

/// Payload of `add_currency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCurrencyRequest {
    pub amount: u32,
}

// ---------------------------------------------------------------------------
// PullKind
// ---------------------------------------------------------------------------

/// Which pull the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PullKind {
    Single,
    Ten,
}

impl PullKind {
    /// The request that performs this pull.
    pub fn outbound(self) -> OutboundKind {
        match self {
            Self::Single => OutboundKind::SinglePull,
            Self::Ten => OutboundKind::TenPull,
        }
    }
}

impl fmt::Display for PullKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Single => "single",
            Self::Ten => "ten",
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: u32, rarity: u8) -> Character {
        Character {
            id,
            name: format!("c{id}"),
            rarity,
            image_url: format!("img/{id}.png"),
            rate: 0.5,
        }
    }

    #[test]
    fn test_rarity_levels_round_trip() {
        for tier in [Rarity::R, Rarity::Sr, Rarity::Ssr] {
            assert_eq!(Rarity::from_level(tier.level()), Some(tier));
        }
        assert_eq!(Rarity::from_level(2), None);
        assert_eq!(Rarity::from_level(6), None);
    }

    #[test]
    fn test_rarity_display() {
        assert_eq!(Rarity::Ssr.to_string(), "SSR");
        assert_eq!(Rarity::R.to_string(), "R");
    }

    #[test]
    fn test_character_uses_camel_case_image_url() {
        let json = serde_json::to_value(character(7, 5)).unwrap();
        assert_eq!(json["imageUrl"], "img/7.png");
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_character_tier_comes_from_wire_level() {
        assert_eq!(character(1, 4).tier(), Some(Rarity::Sr));
        assert_eq!(character(1, 9).tier(), None);
    }

    #[test]
    fn test_pull_result_decodes_server_json() {
        let json = r#"{
            "characters": [
                {"id": 1, "name": "Aria", "rarity": 5, "imageUrl": "a.png", "rate": 0.6},
                {"id": 2, "name": "Bram", "rarity": 3, "imageUrl": "b.png", "rate": 88.0}
            ],
            "isNew": [true, false],
            "timestamp": 1700000000
        }"#;
        let result: PullResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.characters[0].name, "Aria");
        assert_eq!(result.is_new, vec![true, false]);
        assert_eq!(result.timestamp, 1_700_000_000);
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_pull_result_length_mismatch_is_invalid() {
        let result = PullResult {
            characters: vec![character(1, 3), character(2, 4)],
            is_new: vec![true],
            timestamp: 0,
        };
        let err = result.validate().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_empty_pull_result_is_valid() {
        let result = PullResult {
            characters: vec![],
            is_new: vec![],
            timestamp: 0,
        };
        assert!(result.is_empty());
        assert!(result.validate().is_ok());
    }

    #[test]
    fn test_user_info_camel_case() {
        let info: UserInfo = serde_json::from_str(
            r#"{"username":"mika","currency":1600,"pityCount":42}"#,
        )
        .unwrap();
        assert_eq!(info.currency, 1600);
        assert_eq!(info.pity_count, 42);
    }

    #[test]
    fn test_user_info_rejects_negative_currency() {
        let result: Result<UserInfo, _> = serde_json::from_str(
            r#"{"username":"mika","currency":-5,"pityCount":0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pool_info_decodes_rates() {
        let pool: PoolInfo = serde_json::from_str(
            r#"{"characters":[],"rates":{"ssr":"2%","sr":"10%","r":"88%"},"pitySystem":"90 pulls"}"#,
        )
        .unwrap();
        assert_eq!(pool.rates.ssr, "2%");
        assert_eq!(pool.pity_system, "90 pulls");
    }

    #[test]
    fn test_pull_kind_maps_to_request() {
        assert_eq!(PullKind::Single.outbound(), OutboundKind::SinglePull);
        assert_eq!(PullKind::Ten.outbound(), OutboundKind::TenPull);
    }
}
