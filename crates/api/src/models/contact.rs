//! Delivery contact domain type.

use serde::Serialize;

use orderflow_core::{ContactId, UserId};

/// A delivery address with a phone number.
///
/// Contacts are soft-deleted: the `is_deleted` flag is folded into every
/// repository lookup predicate, so a deleted contact is indistinguishable
/// from a missing one everywhere in the service.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeliveryContact {
    /// Unique contact ID.
    pub id: ContactId,
    /// Owning user.
    #[serde(skip)]
    pub user_id: UserId,
    pub city: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    pub phone: String,
}

impl DeliveryContact {
    /// One-line postal rendering used in confirmation messages.
    #[must_use]
    pub fn postal_line(&self) -> String {
        let mut line = format!("{}, {}", self.city, self.street);
        for (label, part) in [
            ("house", &self.house),
            ("structure", &self.structure),
            ("building", &self.building),
            ("apt.", &self.apartment),
        ] {
            if !part.is_empty() {
                line.push_str(&format!(", {label} {part}"));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> DeliveryContact {
        DeliveryContact {
            id: ContactId::new(1),
            user_id: UserId::new(1),
            city: "Moscow".into(),
            street: "Tverskaya".into(),
            house: "7".into(),
            structure: String::new(),
            building: "2".into(),
            apartment: "15".into(),
            phone: "+79990001122".into(),
        }
    }

    #[test]
    fn postal_line_skips_empty_components() {
        assert_eq!(
            contact().postal_line(),
            "Moscow, Tverskaya, house 7, building 2, apt. 15"
        );
    }
}
