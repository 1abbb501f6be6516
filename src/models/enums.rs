use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Menu categories supported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Beverage,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Food, Category::Beverage];

    /// Single-character code persisted in the menu table
    pub fn code(&self) -> &'static str {
        match self {
            Category::Food => "1",
            Category::Beverage => "2",
        }
    }

    /// Label shown on the forms and the public menu
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Comidas",
            Category::Beverage => "Bebidas",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Category::Food),
            "2" => Some(Category::Beverage),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Food => write!(f, "food"),
            Category::Beverage => write!(f, "beverage"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(category) = Category::from_code(trimmed) {
            return Ok(category);
        }

        match trimmed.to_lowercase().as_str() {
            "food" => Ok(Category::Food),
            "beverage" => Ok(Category::Beverage),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes() {
        assert_eq!(Category::Food.code(), "1");
        assert_eq!(Category::Beverage.code(), "2");

        assert_eq!(Category::from_code("1"), Some(Category::Food));
        assert_eq!(Category::from_code("2"), Some(Category::Beverage));
        assert_eq!(Category::from_code("3"), None);
        assert_eq!(Category::from_code(""), None);
    }

    #[test]
    fn test_category_string_conversion() {
        assert_eq!(Category::Food.to_string(), "food");
        assert_eq!(Category::Beverage.to_string(), "beverage");

        assert_eq!("1".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" 2 ".parse::<Category>().unwrap(), Category::Beverage);
        assert_eq!("FOOD".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("Beverage".parse::<Category>().unwrap(), Category::Beverage);

        assert!("3".parse::<Category>().is_err());
        assert!("dessert".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_serialization() {
        let json = serde_json::to_string(&Category::Beverage).unwrap();
        assert_eq!(json, "\"beverage\"");

        let deserialized: Category = serde_json::from_str("\"food\"").unwrap();
        assert_eq!(deserialized, Category::Food);
    }
}
