use gachalink_protocol::Rarity;

/// An RGB color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);
    pub const PURPLE: Rgb = Rgb::new(0.75, 0.0, 1.0);
    pub const GOLD: Rgb = Rgb::new(1.0, 0.84, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// How a rarity level is presented when a card is revealed.
///
/// A pure function of the level: the same level always yields the same
/// style, and nothing else about the character is consulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityStyle {
    /// Star label, e.g. `"★★★★★ SSR"`.
    pub label: &'static str,
    pub color: Rgb,
    /// Which tier's reveal sound to play. `None` for unknown levels.
    pub sound: Option<Rarity>,
}

impl RarityStyle {
    /// Style for levels outside R/SR/SSR.
    pub const NEUTRAL: RarityStyle = RarityStyle {
        label: "★",
        color: Rgb::WHITE,
        sound: None,
    };

    /// Looks up the style for a wire rarity level.
    pub fn for_level(level: u8) -> Self {
        Rarity::from_level(level).map_or(Self::NEUTRAL, Self::for_rarity)
    }

    /// Style for a known tier.
    pub fn for_rarity(rarity: Rarity) -> Self {
        match rarity {
            Rarity::R => Self {
                label: "★★★ R",
                color: Rgb::GRAY,
                sound: Some(Rarity::R),
            },
            Rarity::Sr => Self {
                label: "★★★★ SR",
                color: Rgb::PURPLE,
                sound: Some(Rarity::Sr),
            },
            Rarity::Ssr => Self {
                label: "★★★★★ SSR",
                color: Rgb::GOLD,
                sound: Some(Rarity::Ssr),
            },
        }
    }
}
