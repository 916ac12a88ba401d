//! Visual kinds, derived from a node's asset identifier
//!
//! Motion parameters and overlay geometry are both looked up by kind.

use serde::{Deserialize, Serialize};

/// Which side of the tank a paired decoration sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Kind {
    // Swimmers
    Goldfish,
    Seahorse,
    YellowTang,
    BlueBeta,
    RedBeta,
    Clownfish,
    Jellyfish,
    // Tank floor
    Seaweed,
    Anemone(Option<Side>),
    Crab,
    Shell,
    #[default]
    Unknown,
}

/// Asset tokens, checked in order; first hit wins
const TOKENS: [(&str, Kind); 11] = [
    ("fish_goldfish", Kind::Goldfish),
    ("fish_seahorse", Kind::Seahorse),
    ("fish_yellow_tang", Kind::YellowTang),
    ("fish_blue_beta", Kind::BlueBeta),
    ("fish_red_beta", Kind::RedBeta),
    ("fish_clown", Kind::Clownfish),
    ("fish_jelly", Kind::Jellyfish),
    ("bottom_seaweed", Kind::Seaweed),
    ("bottom_anemone", Kind::Anemone(None)),
    ("bottom_crab", Kind::Crab),
    ("bottom_shell", Kind::Shell),
];

impl Kind {
    pub fn classify(src: &str) -> Self {
        let Some(kind) = TOKENS
            .iter()
            .find(|(token, _)| src.contains(token))
            .map(|(_, kind)| *kind)
        else {
            return Kind::Unknown;
        };

        match kind {
            Kind::Anemone(_) => {
                let side = if src.contains("left") {
                    Some(Side::Left)
                } else if src.contains("right") {
                    Some(Side::Right)
                } else {
                    None
                };
                Kind::Anemone(side)
            }
            other => other,
        }
    }

    /// Slow decorative swimmers: wider, lazier sway
    pub fn is_special(&self) -> bool {
        matches!(self, Kind::Seahorse | Kind::Jellyfish)
    }

    /// Motion lookup for an asset. Looser than [`Kind::classify`]: any
    /// seahorse or jelly image sways slowly, even without the `fish_` prefix.
    pub fn is_special_asset(src: &str) -> bool {
        Self::classify(src).is_special() || src.contains("seahorse") || src.contains("jelly")
    }

    pub fn is_swimmer(&self) -> bool {
        matches!(
            self,
            Kind::Goldfish
                | Kind::Seahorse
                | Kind::YellowTang
                | Kind::BlueBeta
                | Kind::RedBeta
                | Kind::Clownfish
                | Kind::Jellyfish
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_substring() {
        assert_eq!(Kind::classify("assets/fish_goldfish.png"), Kind::Goldfish);
        assert_eq!(Kind::classify("/img/fish_clown_2.webp"), Kind::Clownfish);
        assert_eq!(Kind::classify("bottom_seaweed_a.png"), Kind::Seaweed);
        assert_eq!(Kind::classify("rock.png"), Kind::Unknown);
        assert_eq!(Kind::classify(""), Kind::Unknown);
    }

    #[test]
    fn test_anemone_side() {
        assert_eq!(
            Kind::classify("bottom_anemone_left.png"),
            Kind::Anemone(Some(Side::Left))
        );
        assert_eq!(
            Kind::classify("bottom_anemone_right.png"),
            Kind::Anemone(Some(Side::Right))
        );
        assert_eq!(Kind::classify("bottom_anemone.png"), Kind::Anemone(None));
    }

    #[test]
    fn test_special_swimmers() {
        assert!(Kind::Seahorse.is_special());
        assert!(Kind::Jellyfish.is_special());
        assert!(!Kind::Goldfish.is_special());
        assert!(!Kind::Crab.is_swimmer());
        assert!(Kind::RedBeta.is_swimmer());
    }

    #[test]
    fn test_special_asset_without_prefix() {
        assert_eq!(Kind::classify("seahorse_2.png"), Kind::Unknown);
        assert!(Kind::is_special_asset("seahorse_2.png"));
        assert!(Kind::is_special_asset("img/jelly-blue.webp"));
        assert!(Kind::is_special_asset("fish_seahorse.png"));
        assert!(!Kind::is_special_asset("fish_goldfish.png"));
    }
}
