use chrono::{Duration, NaiveDate};
use drill_core::model::{Card, CardId, GoalState, UserId};
use drill_core::time::{fixed_clock, fixed_now};
use drill_core::{Clock, EngineSettings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{CycleStatus, PracticeCoordinator, PracticeError, SubmitOutcome};
use storage::repository::{CardPoolRepository, GoalRepository, InMemoryRepository, Storage};

fn card(id: &str, answer: &str, progress: u8) -> Card {
    Card::new(CardId::new(id), format!("Sentence about ___ ({id})."), answer)
        .unwrap()
        .with_session_progress(progress)
}

fn today() -> NaiveDate {
    fixed_now().date_naive()
}

fn goal(current: u32, target: u32, day: NaiveDate) -> GoalState {
    let mut state = GoalState::new(target, day);
    state.current_progress = current;
    state
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

async fn setup(pool: &[Card], stored_goal: Option<GoalState>) -> (InMemoryRepository, PracticeCoordinator) {
    let repo = InMemoryRepository::new();
    let user = UserId::new("local");
    if !pool.is_empty() {
        repo.save_card_pool(&user, pool).await.unwrap();
    }
    if let Some(state) = stored_goal {
        repo.save_goal_state(&user, &state).await.unwrap();
    }
    let coordinator =
        PracticeCoordinator::new(&Storage::from_in_memory(repo.clone())).with_clock(fixed_clock());
    (repo, coordinator)
}

#[tokio::test]
async fn cycle_ends_on_goal_even_with_active_cards_left() {
    let (repo, coordinator) = setup(
        &[card("a", "exam", 4), card("b", "friends", 0)],
        Some(goal(4, 5, today())),
    )
    .await;
    let user = UserId::new("local");

    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();
    session.present(&CardId::new("a")).unwrap();

    let report = coordinator.answer(&mut session, true).await.unwrap();
    assert!(report.correct);
    assert!(report.newly_mastered);
    assert_eq!(report.card.session_progress(), 5);
    assert!(report.card.session_completed());
    assert_eq!(report.card.mastery_level(), 5);
    assert_eq!(report.card.last_practiced(), Some(fixed_now()));
    assert_eq!(report.goal.current_progress, 5);
    assert_eq!(report.status, CycleStatus::GoalReached);
    assert!(report.next_card.is_none());
    assert!(report.persist_error.is_none());

    assert!(session.is_complete());
    assert_eq!(session.active_count(), 1);
    assert!(session.current_card().is_none());

    let err = coordinator.answer(&mut session, true).await.unwrap_err();
    assert!(matches!(err, PracticeError::Completed));

    let stored = repo.load_card_pool(&user).await.unwrap();
    assert_eq!(stored[0].session_progress(), 5);
    assert_eq!(stored[1].session_progress(), 0);
    assert_eq!(
        repo.load_goal_state(&user).await.unwrap().map(|g| g.current_progress),
        Some(5)
    );
}

#[tokio::test]
async fn single_active_card_is_presented_again_after_a_miss() {
    let (_repo, coordinator) = setup(&[card("a", "exam", 4)], None).await;
    let mut session = coordinator.start(UserId::new("local"), rng()).await.unwrap();
    assert_eq!(session.current_card().map(|c| c.id().as_str()), Some("a"));

    let outcome = coordinator.submit(&mut session, "zzzzzz").await.unwrap();
    let SubmitOutcome::Graded(report) = outcome else {
        panic!("far miss must be graded");
    };
    assert!(!report.correct);
    assert_eq!(report.card.session_progress(), 3);
    assert_eq!(report.goal.current_progress, 0);
    assert_eq!(report.next_card, Some(CardId::new("a")));
    assert_eq!(session.current_card().map(|c| c.id().as_str()), Some("a"));
}

#[tokio::test]
async fn near_miss_is_a_free_retry() {
    let (repo, coordinator) = setup(&[card("a", "exam", 2)], Some(goal(1, 10, today()))).await;
    let user = UserId::new("local");
    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();

    let outcome = coordinator.submit(&mut session, "exan").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Retry { ref card_id } if card_id.as_str() == "a"));

    assert_eq!(session.pool()[0].session_progress(), 2);
    assert!(session.pool()[0].last_practiced().is_none());
    assert_eq!(session.goal().current_progress, 1);
    assert_eq!(session.answered_count(), 0);
    assert_eq!(repo.load_card_pool(&user).await.unwrap()[0].session_progress(), 2);

    let outcome = coordinator.submit(&mut session, "  Exam ").await.unwrap();
    let SubmitOutcome::Graded(report) = outcome else {
        panic!("exact answer must be graded");
    };
    assert!(report.correct);
    assert_eq!(report.card.session_progress(), 3);
    assert_eq!(report.goal.current_progress, 2);
}

#[tokio::test]
async fn empty_pool_is_seeded_and_saved_on_first_answer() {
    let (repo, coordinator) = setup(&[], None).await;
    let user = UserId::new("local");

    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();
    assert_eq!(session.pool().len(), 3);
    assert_eq!(session.goal().target_goal, 20);
    assert!(session.current_card().is_some());
    assert!(repo.load_card_pool(&user).await.unwrap().is_empty());

    coordinator.answer(&mut session, true).await.unwrap();
    let stored = repo.load_card_pool(&user).await.unwrap();
    let ids: Vec<&str> = stored.iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, vec!["friends_001", "exam_002", "groceries_003"]);
}

#[tokio::test]
async fn empty_pool_without_seed_is_an_error() {
    let (_repo, coordinator) = setup(&[], None).await;
    let coordinator = coordinator.with_seed_pool(Vec::new());
    let err = coordinator
        .start(UserId::new("local"), rng())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, PracticeError::EmptyPool));
}

#[tokio::test]
async fn failed_save_keeps_local_state_until_flushed() {
    let (repo, coordinator) = setup(&[card("a", "exam", 0)], None).await;
    let user = UserId::new("local");
    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();

    repo.set_fail_writes(true);
    let report = coordinator.answer(&mut session, true).await.unwrap();
    assert!(report.persist_error.is_some());
    assert_eq!(report.card.session_progress(), 1);
    assert_eq!(session.pool()[0].session_progress(), 1);
    assert_eq!(session.goal().current_progress, 1);
    assert!(session.has_unsaved_changes());
    assert_eq!(repo.load_card_pool(&user).await.unwrap()[0].session_progress(), 0);

    let err = coordinator.flush(&mut session).await.unwrap_err();
    assert!(matches!(err, PracticeError::Storage(_)));

    repo.set_fail_writes(false);
    coordinator.flush(&mut session).await.unwrap();
    assert!(!session.has_unsaved_changes());
    assert_eq!(repo.load_card_pool(&user).await.unwrap()[0].session_progress(), 1);
    assert_eq!(
        repo.load_goal_state(&user).await.unwrap().map(|g| g.current_progress),
        Some(1)
    );
}

#[tokio::test]
async fn stale_goal_rolls_over_on_start() {
    let yesterday = today().pred_opt().unwrap();
    let (repo, coordinator) = setup(&[card("a", "exam", 0)], Some(goal(7, 10, yesterday))).await;
    let user = UserId::new("local");

    let session = coordinator.start(user.clone(), rng()).await.unwrap();
    assert_eq!(session.goal(), &goal(0, 10, today()));
    assert_eq!(repo.load_goal_state(&user).await.unwrap(), Some(goal(0, 10, today())));
}

#[tokio::test]
async fn day_change_mid_session_restarts_the_count() {
    let (_repo, coordinator) = setup(&[card("a", "exam", 0), card("b", "friends", 0)], None).await;
    let mut session = coordinator.start(UserId::new("local"), rng()).await.unwrap();

    let report = coordinator.answer(&mut session, true).await.unwrap();
    assert_eq!(report.goal.current_progress, 1);

    let tomorrow = coordinator
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::days(1)));
    let report = tomorrow.answer(&mut session, true).await.unwrap();
    assert_eq!(report.goal.current_progress, 1);
    assert_eq!(report.goal.last_progress_date, today().succ_opt().unwrap());
}

#[tokio::test]
async fn goal_reached_yesterday_reopens_the_cycle_today() {
    let (repo, coordinator) = setup(
        &[card("a", "exam", 2), card("b", "friends", 0)],
        Some(goal(2, 3, today())),
    )
    .await;
    let user = UserId::new("local");
    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();

    let report = coordinator.answer(&mut session, true).await.unwrap();
    assert_eq!(report.status, CycleStatus::GoalReached);
    assert!(session.current_card().is_none());

    let tomorrow = coordinator
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::days(1)));
    let outcome = tomorrow.submit(&mut session, "zzzzzzzz").await.unwrap();
    let SubmitOutcome::Graded(report) = outcome else {
        panic!("expected a graded miss");
    };
    assert!(!report.correct);
    assert_eq!(report.goal.current_progress, 0);
    assert_eq!(report.goal.last_progress_date, today().succ_opt().unwrap());
    assert_eq!(report.status, CycleStatus::InProgress);
    assert!(report.next_card.is_some());

    assert_eq!(repo.load_goal_state(&user).await.unwrap(), Some(report.goal));
}

#[tokio::test]
async fn reset_reopens_a_fully_mastered_pool() {
    let (repo, coordinator) = setup(
        &[card("a", "exam", 5), card("b", "friends", 5)],
        Some(goal(3, 10, today())),
    )
    .await;
    let user = UserId::new("local");

    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();
    assert_eq!(session.status(), CycleStatus::AllMastered);
    assert!(session.current_card().is_none());
    assert!(matches!(
        coordinator.submit(&mut session, "exam").await,
        Err(PracticeError::Completed)
    ));

    coordinator.reset(&mut session).await.unwrap();
    assert_eq!(session.status(), CycleStatus::InProgress);
    assert_eq!(session.progress_histogram(), [2, 0, 0, 0, 0, 0]);
    assert_eq!(session.goal().current_progress, 0);
    assert_eq!(session.goal().target_goal, 10);
    assert!(session.current_card().is_some());

    let stored = repo.load_card_pool(&user).await.unwrap();
    assert!(stored.iter().all(|c| c.mastery_level() == 0 && !c.session_completed()));
}

#[tokio::test]
async fn changing_the_goal_restarts_the_count() {
    let (repo, coordinator) = setup(&[card("a", "exam", 0)], Some(goal(5, 5, today()))).await;
    let user = UserId::new("local");

    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();
    assert_eq!(session.status(), CycleStatus::GoalReached);

    coordinator.set_goal(&mut session, 8).await.unwrap();
    assert_eq!(session.goal().target_goal, 8);
    assert_eq!(session.goal().current_progress, 0);
    assert_eq!(session.status(), CycleStatus::InProgress);
    assert_eq!(session.current_card().map(|c| c.id().as_str()), Some("a"));

    coordinator.set_goal(&mut session, -3).await.unwrap();
    assert_eq!(session.goal().target_goal, 20);
    assert_eq!(
        repo.load_goal_state(&user).await.unwrap().map(|g| g.target_goal),
        Some(20)
    );
}

#[tokio::test]
async fn custom_settings_drive_defaults_and_grading() {
    let (_repo, coordinator) = setup(&[card("a", "exam", 0)], None).await;
    let coordinator = coordinator
        .with_settings(
            EngineSettings::new()
                .with_default_target_goal(3)
                .with_near_miss_threshold(0.9),
        )
        .unwrap();

    let mut session = coordinator.start(UserId::new("local"), rng()).await.unwrap();
    assert_eq!(session.goal().target_goal, 3);

    // 0.75 similarity is no longer close enough for a retry.
    let outcome = coordinator.submit(&mut session, "exan").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Graded(ref r) if !r.correct));

    let invalid = coordinator.with_settings(EngineSettings::new().with_default_target_goal(0));
    assert!(matches!(invalid, Err(PracticeError::Settings(_))));
}

#[tokio::test]
async fn imported_cards_join_the_pool() {
    let (repo, coordinator) = setup(&[], None).await;
    let user = UserId::new("local");
    let mut session = coordinator.start(user.clone(), rng()).await.unwrap();

    let csv = "word,sentence,word_mean,sentence_translation\n\
               apple,I ate an apple,elma,Bir elma yedim.\n\
               ,no word,,\n\
               river,The river is wide | extra,nehir,Nehir geniş.\n";
    let report = coordinator
        .import_cards(&mut session, csv.as_bytes())
        .await
        .unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(session.pool().len(), 5);
    assert_eq!(session.pool()[3].prompt(), "I ate an ___.");
    assert_eq!(session.pool()[4].id().as_str(), "river_2");
    assert_eq!(repo.load_card_pool(&user).await.unwrap().len(), 5);
}
