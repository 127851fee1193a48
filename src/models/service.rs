use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A bookable studio offering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_per_hour: Decimal,
    pub duration_hours: u32,
    pub features: Vec<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Service {
    /// Price of `hours` of this service.
    pub fn price_for(&self, hours: u32) -> Decimal {
        self.price_per_hour * Decimal::from(hours)
    }
}

/// Create/replace payload for the admin catalog editor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub price_per_hour: Decimal,
    #[validate(range(min = 1, message = "duration_hours must be at least 1"))]
    pub duration_hours: u32,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ServiceInput {
    /// Trims text fields and drops blank features.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.features = self
            .features
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_features() {
        let input = ServiceInput {
            name: "  Mixing ".into(),
            description: " Stereo mixdown ".into(),
            price_per_hour: Decimal::from(80),
            duration_hours: 1,
            features: vec!["Stems".into(), "  ".into(), "".into(), " Revisions ".into()],
            is_active: true,
        }
        .normalized();

        assert_eq!(input.name, "Mixing");
        assert_eq!(input.description, "Stereo mixdown");
        assert_eq!(input.features, vec!["Stems", "Revisions"]);
    }

    #[test]
    fn test_price_for_hours() {
        let service = Service {
            id: "s1".into(),
            name: "Podcast Recording".into(),
            description: String::new(),
            price_per_hour: Decimal::from(150),
            duration_hours: 2,
            features: vec![],
            is_active: true,
            created_at: chrono::Utc::now().naive_utc(),
        };
        assert_eq!(service.price_for(2), Decimal::from(300));
    }
}
