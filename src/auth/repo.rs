use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

/// The two account roles, stored and serialized under their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
pub enum Role {
    #[serde(rename = "fiel")]
    #[sqlx(rename = "fiel")]
    Member,
    #[serde(rename = "paroquiano")]
    #[sqlx(rename = "paroquiano")]
    Staff,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "fiel" => Some(Role::Member),
            "paroquiano" => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "fiel",
            Role::Staff => "paroquiano",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Salted argon2 hash. Never leaves this module's callers; the public
    /// snapshot is `SessionUser`.
    pub credential: String,
    pub role: Role,
    pub church: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub credential: &'a str,
    pub role: Role,
    pub church: Option<&'a str>,
}

impl User {
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, credential, role, church, created_at
            FROM usuarios
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn create(db: &SqlitePool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO usuarios (name, email, credential, role, church, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, name, email, credential, role, church, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.credential)
        .bind(new.role)
        .bind(new.church)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::is_unique_violation;

    #[test]
    fn role_parses_only_the_two_wire_names() {
        assert_eq!(Role::parse("fiel"), Some(Role::Member));
        assert_eq!(Role::parse("paroquiano"), Some(Role::Staff));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::parse("Fiel"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_round_trips_through_its_wire_name() {
        for role in [Role::Member, Role::Staff] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[tokio::test]
    async fn create_then_find_by_email() {
        let pool = db::test_pool().await;
        let created = User::create(
            &pool,
            NewUser {
                name: "Padre João",
                email: "joao@example.com",
                credential: "$argon2id$fake",
                role: Role::Staff,
                church: Some("St. Mark"),
            },
        )
        .await
        .unwrap();

        let found = User::find_by_email(&pool, "joao@example.com")
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Padre João");
        assert_eq!(found.role, Role::Staff);
        assert_eq!(found.church.as_deref(), Some("St. Mark"));

        assert!(User::find_by_email(&pool, "nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_email_surfaces_as_unique_violation() {
        let pool = db::test_pool().await;
        let new = |name: &'static str| NewUser {
            name,
            email: "same@example.com",
            credential: "$argon2id$fake",
            role: Role::Member,
            church: None,
        };
        User::create(&pool, new("First")).await.unwrap();
        let err = User::create(&pool, new("Second")).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
