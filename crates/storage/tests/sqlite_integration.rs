use chrono::NaiveDate;
use drill_core::model::{Card, CardId, GoalState, SchedulingMetadata, UserId};
use drill_core::progress::apply_outcome;
use drill_core::time::fixed_now;
use serde_json::json;
use storage::repository::{CardPoolRepository, GoalRepository, Storage};
use storage::sqlite::SqliteRepository;

fn build_card(id: &str, answer: &str) -> Card {
    Card::new(CardId::new(id), format!("Sentence with ___ for {answer}."), answer)
        .unwrap()
        .with_translation("çeviri")
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_order_and_progress() {
    let repo = connect("memdb_pool_roundtrip").await;
    let user = UserId::new("local");

    let practiced = apply_outcome(&build_card("exam_002", "exam"), true, fixed_now());
    let metadata = SchedulingMetadata::from_value(json!({ "stability": 3.2, "foreign": "kept" }));
    let cards = vec![
        build_card("friends_001", "friends"),
        practiced.clone().with_scheduling_metadata(metadata.clone()),
        build_card("groceries_003", "groceries")
            .with_blanked_form(Some("Groceries".into()))
            .with_session_progress(5),
    ];

    repo.save_card_pool(&user, &cards).await.unwrap();
    let loaded = repo.load_card_pool(&user).await.unwrap();

    assert_eq!(loaded.len(), 3);
    let ids: Vec<&str> = loaded.iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, vec!["friends_001", "exam_002", "groceries_003"]);
    assert_eq!(loaded[1].session_progress(), 1);
    assert_eq!(loaded[1].last_practiced(), Some(fixed_now()));
    assert_eq!(loaded[1].scheduling_metadata(), &metadata);
    assert_eq!(loaded[0].translation(), "çeviri");
    assert!(loaded[2].session_completed());
    assert_eq!(loaded[2].mastery_level(), 5);
    assert_eq!(loaded[2].blanked_form(), Some("Groceries"));
    assert_eq!(loaded[0].blanked_form(), None);
}

#[tokio::test]
async fn sqlite_save_replaces_previous_pool() {
    let repo = connect("memdb_pool_replace").await;
    let user = UserId::new("local");

    repo.save_card_pool(&user, &[build_card("a", "a"), build_card("b", "b")])
        .await
        .unwrap();
    repo.save_card_pool(&user, &[build_card("c", "c")]).await.unwrap();

    let loaded = repo.load_card_pool(&user).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), &CardId::new("c"));

    assert!(
        repo.load_card_pool(&UserId::new("other"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn sqlite_clamps_hand_edited_progress() {
    let repo = connect("memdb_pool_clamp").await;
    let user = UserId::new("local");
    repo.save_card_pool(&user, &[build_card("a", "a")]).await.unwrap();

    sqlx::query("UPDATE card_pools SET session_progress = 42, mastery_level = -1")
        .execute(repo.pool())
        .await
        .unwrap();

    let loaded = repo.load_card_pool(&user).await.unwrap();
    assert_eq!(loaded[0].session_progress(), 5);
    assert_eq!(loaded[0].mastery_level(), 5);
    assert!(loaded[0].session_completed());
}

#[tokio::test]
async fn sqlite_goal_state_upserts() {
    let repo = connect("memdb_goal").await;
    let user = UserId::new("local");
    assert!(repo.load_goal_state(&user).await.unwrap().is_none());

    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut state = GoalState::new(10, day);
    state.current_progress = 7;
    repo.save_goal_state(&user, &state).await.unwrap();

    state.current_progress = 8;
    repo.save_goal_state(&user, &state).await.unwrap();

    assert_eq!(repo.load_goal_state(&user).await.unwrap(), Some(state));
}

#[tokio::test]
async fn sqlite_clamps_oversized_goal_counter() {
    let repo = connect("memdb_goal_clamp").await;
    let user = UserId::new("local");
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    repo.save_goal_state(&user, &GoalState::new(10, day)).await.unwrap();

    sqlx::query("UPDATE goal_states SET current_progress = 5000000000")
        .execute(repo.pool())
        .await
        .unwrap();

    let loaded = repo.load_goal_state(&user).await.unwrap().unwrap();
    assert_eq!(loaded.current_progress, u32::MAX);
    assert_eq!(loaded.target_goal, 10);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn storage_sqlite_wires_both_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_wiring?mode=memory&cache=shared")
        .await
        .expect("storage");
    let user = UserId::new("local");

    storage
        .cards
        .save_card_pool(&user, &[build_card("a", "a")])
        .await
        .unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    storage
        .goals
        .save_goal_state(&user, &GoalState::new(5, day))
        .await
        .unwrap();

    assert_eq!(storage.cards.load_card_pool(&user).await.unwrap().len(), 1);
    assert_eq!(
        storage
            .goals
            .load_goal_state(&user)
            .await
            .unwrap()
            .map(|s| s.target_goal),
        Some(5)
    );
}
