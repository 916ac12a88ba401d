//! Fruit and bowl colors

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BowlColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BowlColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BowlColor::Red => "Red",
            BowlColor::Orange => "Orange",
            BowlColor::Yellow => "Yellow",
            BowlColor::Green => "Green",
            BowlColor::Blue => "Blue",
            BowlColor::Purple => "Purple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "red" => Some(BowlColor::Red),
            "orange" => Some(BowlColor::Orange),
            "yellow" => Some(BowlColor::Yellow),
            "green" => Some(BowlColor::Green),
            "blue" => Some(BowlColor::Blue),
            "purple" => Some(BowlColor::Purple),
            _ => None,
        }
    }

    /// Bowls are labelled like "Red bowl"; the color is the first word
    pub fn from_label(label: &str) -> Option<Self> {
        label.split_whitespace().next().and_then(Self::from_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fruit {
    Strawberry,
    Orange,
    Banana,
    Apple,
    Blueberry,
    Berry,
}

impl Fruit {
    pub const ALL: [Fruit; 6] = [
        Fruit::Strawberry,
        Fruit::Orange,
        Fruit::Banana,
        Fruit::Apple,
        Fruit::Blueberry,
        Fruit::Berry,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Fruit::Strawberry => "Strawberry",
            Fruit::Orange => "Orange",
            Fruit::Banana => "Banana",
            Fruit::Apple => "Apple",
            Fruit::Blueberry => "Blueberry",
            Fruit::Berry => "Berry",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Bowl this fruit belongs in
    pub fn color(&self) -> BowlColor {
        match self {
            Fruit::Strawberry => BowlColor::Red,
            Fruit::Orange => BowlColor::Orange,
            Fruit::Banana => BowlColor::Yellow,
            Fruit::Apple => BowlColor::Green,
            Fruit::Blueberry => BowlColor::Blue,
            Fruit::Berry => BowlColor::Purple,
        }
    }

    pub fn asset(&self) -> &'static str {
        match self {
            Fruit::Strawberry => "../jpgs/gummy_strawberry.png",
            Fruit::Orange => "../jpgs/gummy_orange.png",
            Fruit::Banana => "../jpgs/gummy_banana.png",
            Fruit::Apple => "../jpgs/gummy_apple.png",
            Fruit::Blueberry => "../jpgs/gummy_blueberry.png",
            Fruit::Berry => "../jpgs/gummy_berry.png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_fruit_has_distinct_bowl() {
        let colors: std::collections::HashSet<_> = Fruit::ALL.iter().map(|f| f.color()).collect();
        assert_eq!(colors.len(), Fruit::ALL.len());
    }

    #[test]
    fn test_bowl_label_parsing() {
        assert_eq!(BowlColor::from_label("Red bowl"), Some(BowlColor::Red));
        assert_eq!(BowlColor::from_label("purple plate"), Some(BowlColor::Purple));
        assert_eq!(BowlColor::from_label(""), None);
        assert_eq!(BowlColor::from_label("Teal bowl"), None);
    }

    #[test]
    fn test_fruit_names() {
        assert_eq!(Fruit::from_name("banana"), Some(Fruit::Banana));
        assert_eq!(Fruit::from_name("Kiwi"), None);
        for f in Fruit::ALL {
            assert!(f.asset().ends_with(".png"));
        }
    }
}
