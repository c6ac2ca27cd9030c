use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entity as supplied by a caller, before the [`Store`](crate::Store) has
/// accepted it.
///
/// There is no timestamp field: the creation time is assigned by the store at
/// insertion and can never be supplied from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl NewEntity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
        }
    }
}

/// A uniquely identified record held by the [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    pub(crate) fn stamped(new: NewEntity, created_at: DateTime<Utc>) -> Self {
        let NewEntity {
            id,
            name,
            email,
            role,
        } = new;
        Self {
            id,
            name,
            email,
            role,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_rfc3339_timestamp() {
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entity = Entity::stamped(
            NewEntity::new("1", "Alice", "alice@example.com", "admin"),
            created_at,
        );

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["role"], "admin");
        assert_eq!(json["created_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn new_entity_ignores_supplied_timestamp() {
        let new: NewEntity = serde_json::from_str(
            r#"{"id":"9","name":"Eve","email":"eve@example.com","role":"user","created_at":"1999-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(new, NewEntity::new("9", "Eve", "eve@example.com", "user"));
    }
}
