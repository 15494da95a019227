use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::{Date, OffsetDateTime, Time};

use crate::auth::dto::SessionUser;
use crate::scope::Scope;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");
time::serde::format_description!(time_format, Time, "[hour]:[minute]:[second]");

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(with = "time_format::option")]
    pub time: Option<Time>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub notes: Option<String>,
    pub church: Option<String>,
    pub user_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated event body; `church` and `user_id` come from the acting
/// staff user at insert time, never from the client.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: Date,
    pub time: Option<Time>,
    pub kind: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub notes: Option<String>,
}

impl Event {
    /// Scoped listing, ordered by date then time ascending. On the same
    /// date, events without a time sort before timed ones (SQLite orders
    /// NULLs first ascending). The empty scope never touches storage.
    pub async fn list(db: &SqlitePool, scope: &Scope) -> sqlx::Result<Vec<Event>> {
        match scope {
            Scope::Empty => Ok(Vec::new()),
            Scope::Church(church) => {
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, title, description, date, time, kind, location,
                           organizer, notes, church, user_id, created_at, updated_at
                    FROM eventos
                    WHERE church = ?1
                    ORDER BY date ASC, time ASC
                    "#,
                )
                .bind(church)
                .fetch_all(db)
                .await
            }
            Scope::All => {
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, title, description, date, time, kind, location,
                           organizer, notes, church, user_id, created_at, updated_at
                    FROM eventos
                    ORDER BY date ASC, time ASC
                    "#,
                )
                .fetch_all(db)
                .await
            }
        }
    }

    /// Scoped point lookup. Under a church scope, an out-of-scope row is
    /// indistinguishable from an absent one.
    pub async fn get(db: &SqlitePool, scope: &Scope, id: i64) -> sqlx::Result<Option<Event>> {
        match scope {
            Scope::Empty => Ok(None),
            Scope::Church(church) => {
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, title, description, date, time, kind, location,
                           organizer, notes, church, user_id, created_at, updated_at
                    FROM eventos
                    WHERE id = ?1 AND church = ?2
                    "#,
                )
                .bind(id)
                .bind(church)
                .fetch_optional(db)
                .await
            }
            Scope::All => {
                sqlx::query_as::<_, Event>(
                    r#"
                    SELECT id, title, description, date, time, kind, location,
                           organizer, notes, church, user_id, created_at, updated_at
                    FROM eventos
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .fetch_optional(db)
                .await
            }
        }
    }

    pub async fn create(
        db: &SqlitePool,
        actor: &SessionUser,
        new: &NewEvent,
    ) -> sqlx::Result<Event> {
        let now = OffsetDateTime::now_utc();
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO eventos (title, description, date, time, kind, location,
                                 organizer, notes, church, user_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            RETURNING id, title, description, date, time, kind, location,
                      organizer, notes, church, user_id, created_at, updated_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.date)
        .bind(new.time)
        .bind(&new.kind)
        .bind(&new.location)
        .bind(&new.organizer)
        .bind(&new.notes)
        .bind(&actor.church)
        .bind(actor.id)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Rewrites the client-suppliable fields and refreshes `updated_at`.
    /// `church` and `user_id` keep their creation-time values. Returns the
    /// affected row count; 0 means the id does not exist.
    pub async fn update(db: &SqlitePool, id: i64, new: &NewEvent) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE eventos
            SET title = ?1, description = ?2, date = ?3, time = ?4, kind = ?5,
                location = ?6, organizer = ?7, notes = ?8, updated_at = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.date)
        .bind(new.time)
        .bind(&new.kind)
        .bind(&new.location)
        .bind(&new.organizer)
        .bind(&new.notes)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM eventos WHERE id = ?1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{NewUser, Role, User};
    use crate::db;
    use time::macros::{date, time};

    async fn register(
        db: &SqlitePool,
        email: &str,
        role: Role,
        church: Option<&str>,
    ) -> SessionUser {
        let user = User::create(
            db,
            NewUser {
                name: "Test User",
                email,
                credential: "$argon2id$fake",
                role,
                church,
            },
        )
        .await
        .unwrap();
        SessionUser::from(&user)
    }

    fn mass_on(d: Date) -> NewEvent {
        NewEvent {
            title: "Mass".into(),
            description: None,
            date: d,
            time: None,
            kind: None,
            location: None,
            organizer: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips_all_fields() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;

        let new = NewEvent {
            title: "Christmas Mass".into(),
            description: Some("Midnight celebration".into()),
            date: date!(2024 - 12 - 25),
            time: Some(time!(23:00:00)),
            kind: Some("mass".into()),
            location: Some("Main chapel".into()),
            organizer: Some("Fr. John".into()),
            notes: Some("Bring candles".into()),
        };
        let created = Event::create(&pool, &staff, &new).await.unwrap();

        assert_eq!(created.title, new.title);
        assert_eq!(created.description, new.description);
        assert_eq!(created.date, new.date);
        assert_eq!(created.time, new.time);
        assert_eq!(created.kind, new.kind);
        assert_eq!(created.location, new.location);
        assert_eq!(created.organizer, new.organizer);
        assert_eq!(created.notes, new.notes);
        // server-assigned pieces
        assert!(created.id > 0);
        assert_eq!(created.church.as_deref(), Some("St. Mark"));
        assert_eq!(created.user_id, Some(staff.id));
        assert_eq!(created.created_at, created.updated_at);

        let fetched = Event::get(&pool, &Scope::All, created.id)
            .await
            .unwrap()
            .expect("event should exist");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn members_only_see_their_own_church() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;
        Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        let same_church = Scope::Church("St. Mark".into());
        let listed = Event::list(&pool, &same_church).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Mass");

        let other_church = Scope::Church("Other".into());
        assert!(Event::list(&pool, &other_church).await.unwrap().is_empty());

        // A churchless member sees nothing, without error.
        assert!(Event::list(&pool, &Scope::Empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_scope_lookup_is_indistinguishable_from_absence() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;
        let event = Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        let other = Scope::Church("Other".into());
        assert!(Event::get(&pool, &other, event.id).await.unwrap().is_none());
        assert!(Event::get(&pool, &Scope::Empty, event.id)
            .await
            .unwrap()
            .is_none());
        assert!(Event::get(&pool, &Scope::All, event.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn listing_orders_by_date_then_time_with_timeless_first() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;

        let mut evening = mass_on(date!(2025 - 01 - 02));
        evening.title = "Evening".into();
        evening.time = Some(time!(19:00:00));
        let mut morning = mass_on(date!(2025 - 01 - 02));
        morning.title = "Morning".into();
        morning.time = Some(time!(08:00:00));
        let mut all_day = mass_on(date!(2025 - 01 - 02));
        all_day.title = "All day".into();
        let mut earlier_date = mass_on(date!(2025 - 01 - 01));
        earlier_date.title = "Day before".into();
        earlier_date.time = Some(time!(22:00:00));

        for new in [&evening, &morning, &all_day, &earlier_date] {
            Event::create(&pool, &staff, new).await.unwrap();
        }

        let titles: Vec<String> = Event::list(&pool, &Scope::All)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, ["Day before", "All day", "Morning", "Evening"]);
    }

    #[tokio::test]
    async fn update_rewrites_fields_and_refreshes_updated_at() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;
        let created = Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        let mut patch = mass_on(date!(2024 - 12 - 26));
        patch.title = "Boxing Day Mass".into();
        let changes = Event::update(&pool, created.id, &patch).await.unwrap();
        assert_eq!(changes, 1);

        let updated = Event::get(&pool, &Scope::All, created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Boxing Day Mass");
        assert_eq!(updated.date, date!(2024 - 12 - 26));
        // creation-time tenancy is preserved
        assert_eq!(updated.church.as_deref(), Some("St. Mark"));
        assert_eq!(updated.user_id, Some(staff.id));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_of_a_missing_id_affects_nothing() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, None).await;
        Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        let changes = Event::update(&pool, 9999, &mass_on(date!(2024 - 12 - 26)))
            .await
            .unwrap();
        assert_eq!(changes, 0);
        assert_eq!(Event::list(&pool, &Scope::All).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_affects_once_then_never_again() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, None).await;
        let event = Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        assert_eq!(Event::delete(&pool, event.id).await.unwrap(), 1);
        assert_eq!(Event::delete(&pool, event.id).await.unwrap(), 0);
        assert_eq!(Event::delete(&pool, event.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_a_user_nulls_out_their_events() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@example.com", Role::Staff, Some("St. Mark")).await;
        let event = Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();
        assert_eq!(event.user_id, Some(staff.id));

        // No API removes users; the referential action is schema-level.
        sqlx::query("DELETE FROM usuarios WHERE id = ?1")
            .bind(staff.id)
            .execute(&pool)
            .await
            .unwrap();

        let survivor = Event::get(&pool, &Scope::All, event.id)
            .await
            .unwrap()
            .expect("event must survive its creator");
        assert_eq!(survivor.user_id, None);
    }

    /// Staff at St. Mark publishes a Christmas Mass; a same-church member
    /// sees it, another church's member does not.
    #[tokio::test]
    async fn end_to_end_visibility_scenario() {
        let pool = db::test_pool().await;
        let staff = register(&pool, "staff@stmark.com", Role::Staff, Some("St. Mark")).await;
        Event::create(&pool, &staff, &mass_on(date!(2024 - 12 - 25)))
            .await
            .unwrap();

        let member = register(&pool, "member@stmark.com", Role::Member, Some("St. Mark")).await;
        let visible = Event::list(&pool, &Scope::for_session(&member)).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Mass");

        let outsider = register(&pool, "member@other.com", Role::Member, Some("Other")).await;
        assert!(Event::list(&pool, &Scope::for_session(&outsider))
            .await
            .unwrap()
            .is_empty());
    }
}
