use chrono::NaiveDate;
use habitxp_core::Clock;
use habitxp_core::db::open_db_in_memory;
use habitxp_core::repo::SqliteStore;
use habitxp_core::{
    EngineError, FixedClock, GamificationService, HabitDraft, TaskDraft, TaskSize,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> GamificationService<SqliteStore<'_>, FixedClock> {
    let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    GamificationService::new(SqliteStore::try_new(conn).unwrap(), FixedClock::at(today))
}

#[test]
fn reconcile_credits_lost_experience() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("dee").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Practice piano"))
        .unwrap()
        .habit;
    service.complete_habit(habit.uuid).unwrap();
    service.clock().advance_days(1);
    service.complete_habit(habit.uuid).unwrap();
    let task = service
        .create_task(user.uuid, TaskDraft::new("Tune piano").size(TaskSize::Large))
        .unwrap();
    service.complete_task(task.uuid).unwrap();

    conn.execute("UPDATE users SET experience = 10, level = 1;", [])
        .unwrap();

    assert_eq!(service.replay_experience(user.uuid).unwrap(), 22 + 24 + 50);
    let outcome = service.reconcile_experience(user.uuid).unwrap();
    assert_eq!(outcome.stored_experience, 10);
    assert_eq!(outcome.replayed_experience, 96);
    assert_eq!(outcome.credited, 86);
    assert_eq!(outcome.update.experience, 96);
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 96);

    let again = service.reconcile_experience(user.uuid).unwrap();
    assert_eq!(again.credited, 0);
}

#[test]
fn reconcile_never_lowers_experience() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("dee").unwrap();
    service.apply_experience(user.uuid, 500).unwrap();

    let outcome = service.reconcile_experience(user.uuid).unwrap();
    assert_eq!(outcome.replayed_experience, 0);
    assert_eq!(outcome.credited, 0);
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 500);
}

#[test]
fn drifted_level_is_an_invariant_violation_until_reconciled() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("dee").unwrap();
    service.apply_experience(user.uuid, 150).unwrap();
    conn.execute("UPDATE users SET level = 4;", []).unwrap();

    let err = service.apply_experience(user.uuid, 10).unwrap_err();
    assert!(matches!(err, EngineError::InvariantViolation(_)));
    assert_eq!(err.status_class(), 500);
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 150);

    let outcome = service.reconcile_experience(user.uuid).unwrap();
    assert_eq!(outcome.credited, 0);
    assert_eq!(outcome.update.old_level, 4);
    assert_eq!(outcome.update.new_level, 2);

    let update = service.apply_experience(user.uuid, 10).unwrap();
    assert_eq!(update.experience, 160);
}

#[test]
fn apply_experience_reports_level_ups_and_rejects_negative_delta() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("dee").unwrap();

    let update = service.apply_experience(user.uuid, 300).unwrap();
    assert_eq!(update.old_level, 1);
    assert_eq!(update.new_level, 3);
    assert!(update.level_up);

    let err = service.apply_experience(user.uuid, -1).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 300);
}

#[test]
fn user_stats_summarize_progress() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.seed_default_catalogue().unwrap();
    let user = service.create_user("dee").unwrap();
    let run = service
        .create_habit(user.uuid, HabitDraft::new("Run"))
        .unwrap()
        .habit;
    let read = service
        .create_habit(user.uuid, HabitDraft::new("Read"))
        .unwrap()
        .habit;

    for _ in 0..3 {
        service.complete_habit(run.uuid).unwrap();
        service.clock().advance_days(1);
    }
    service.complete_habit(read.uuid).unwrap();

    let stats = service.user_stats(user.uuid).unwrap();
    assert_eq!(stats.total_habits, 2);
    assert_eq!(stats.completed_count, 4);
    assert_eq!(stats.longest_streak, 3);
    assert_eq!(stats.completed_tasks, 0);
    assert_eq!(stats.unlocked_achievements, 1);
    // 50 (first habit) + 22 + 24 + 26 + 22
    assert_eq!(stats.experience, 144);
    assert_eq!(stats.level, 2);
    assert_eq!(stats.progress.xp_into_level, 44);
    assert_eq!(service.level_progress(user.uuid).unwrap(), stats.progress);

    assert_eq!(service.replay_experience(user.uuid).unwrap(), 144);
}

#[test]
fn stats_report_current_streak_and_metrics() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("dee").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Journal"))
        .unwrap()
        .habit;

    for _ in 0..3 {
        service.complete_habit(habit.uuid).unwrap();
        service.clock().advance_days(1);
    }
    service
        .record_missed_day(habit.uuid, service.clock().today())
        .unwrap();
    service.clock().advance_days(1);
    service.complete_habit(habit.uuid).unwrap();
    service
        .record_metric(user.uuid, "days_without_games", 2.0)
        .unwrap();

    let stats = service.user_stats(user.uuid).unwrap();
    assert_eq!(stats.longest_streak, 3);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.metrics.get("days_without_games"), Some(&2.0));
    assert_eq!(stats.metrics.len(), 1);
}
