use chrono::NaiveDate;
use habitxp_core::db::open_db_in_memory;
use habitxp_core::repo::{HabitRepository, SqliteStore};
use habitxp_core::{
    CompletionRecord, EngineError, FixedClock, GamificationService, Habit, HabitDraft,
    HabitFrequency, HabitPriority,
};
use rusqlite::Connection;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn service(conn: &Connection) -> GamificationService<SqliteStore<'_>, FixedClock> {
    GamificationService::new(SqliteStore::try_new(conn).unwrap(), FixedClock::at(day(1)))
}

#[test]
fn completion_awards_base_xp_plus_streak_bonus() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Read 10 pages"))
        .unwrap()
        .habit;

    let outcome = service.complete_habit(habit.uuid).unwrap();

    assert_eq!(outcome.new_streak, 1);
    assert_eq!(outcome.date, day(1));
    assert_eq!(outcome.experience_awarded, 22);
    assert_eq!(outcome.update.experience, 22);
    assert!(!outcome.update.level_up);

    let stored = service.get_habit(habit.uuid).unwrap();
    assert_eq!(stored.streak, 1);
    assert!(stored.completed_today);
    assert_eq!(
        stored.completion_history,
        vec![CompletionRecord {
            date: day(1),
            completed: true
        }]
    );
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 22);
}

#[test]
fn second_completion_on_same_day_is_rejected_without_side_effects() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Stretch"))
        .unwrap()
        .habit;
    service.complete_habit(habit.uuid).unwrap();
    let before = service.get_habit(habit.uuid).unwrap();

    let err = service.complete_habit(habit.uuid).unwrap_err();

    assert!(matches!(err, EngineError::DuplicateCompletion(_)));
    assert_eq!(err.status_class(), 409);
    assert_eq!(service.get_habit(habit.uuid).unwrap(), before);
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 22);
}

#[test]
fn seventh_daily_medium_completion_awards_34_xp() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();

    let mut habit = Habit::new(
        user.uuid,
        "Meditate",
        HabitFrequency::Daily,
        HabitPriority::Medium,
    );
    habit.completion_history = (1..=6)
        .map(|d| CompletionRecord {
            date: day(d),
            completed: true,
        })
        .collect();
    habit.streak = 6;
    service.store().create_habit(&habit).unwrap();
    service.clock().advance_days(6);

    let outcome = service.complete_habit(habit.uuid).unwrap();

    assert_eq!(outcome.date, day(7));
    assert_eq!(outcome.new_streak, 7);
    assert_eq!(outcome.experience_awarded, 34);
    assert_eq!(outcome.update.experience, 34);
    assert_eq!(outcome.update.new_level, 1);
    assert!(!outcome.update.level_up);
}

#[test]
fn day_rollover_clears_completed_today_and_extends_streak() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Walk"))
        .unwrap()
        .habit;
    service.complete_habit(habit.uuid).unwrap();

    service.clock().advance_days(1);
    let listed = service.list_habits(user.uuid).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].completed_today);

    let outcome = service.complete_habit(habit.uuid).unwrap();
    assert_eq!(outcome.new_streak, 2);
    assert_eq!(outcome.experience_awarded, 24);
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 46);
}

#[test]
fn missed_day_resets_streak_and_bonus() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(
            user.uuid,
            HabitDraft::new("Journal")
                .frequency(HabitFrequency::Weekly)
                .priority(HabitPriority::High),
        )
        .unwrap()
        .habit;
    service.complete_habit(habit.uuid).unwrap();

    service.clock().advance_days(2);
    let missed = service.record_missed_day(habit.uuid, day(2)).unwrap();
    assert_eq!(missed.streak, 0);
    assert!(!missed.completed_today);
    assert_eq!(missed.completion_history.len(), 2);

    let outcome = service.complete_habit(habit.uuid).unwrap();
    assert_eq!(outcome.new_streak, 1);
    // weekly (30) + high (15) + streak 1 bonus (2)
    assert_eq!(outcome.experience_awarded, 47);
}

#[test]
fn missed_day_in_the_future_is_invalid_input() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Swim"))
        .unwrap()
        .habit;

    let err = service.record_missed_day(habit.uuid, day(5)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn failed_user_update_rolls_back_habit_completion() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let user = service.create_user("ana").unwrap();
    let habit = service
        .create_habit(user.uuid, HabitDraft::new("Floss"))
        .unwrap()
        .habit;

    conn.execute_batch(
        "CREATE TRIGGER fail_user_update BEFORE UPDATE ON users
         BEGIN
            SELECT RAISE(ABORT, 'injected failure');
         END;",
    )
    .unwrap();

    let err = service.complete_habit(habit.uuid).unwrap_err();
    assert!(matches!(err, EngineError::Repo(_)));
    assert!(err.to_string().contains("injected failure"));

    conn.execute_batch("DROP TRIGGER fail_user_update;").unwrap();
    let stored = service.get_habit(habit.uuid).unwrap();
    assert_eq!(stored.streak, 0);
    assert!(!stored.completed_today);
    assert!(stored.completion_history.is_empty());
    assert_eq!(service.get_user(user.uuid).unwrap().experience, 0);

    let retried = service.complete_habit(habit.uuid).unwrap();
    assert_eq!(retried.new_streak, 1);
}

#[test]
fn completing_unknown_habit_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.complete_habit(uuid::Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { entity: "habit", .. }));
    assert_eq!(err.status_class(), 404);
}

#[test]
fn five_day_streak_unlocks_streak_achievement() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service.seed_default_catalogue().unwrap();
    let user = service.create_user("ana").unwrap();

    let created = service
        .create_habit(user.uuid, HabitDraft::new("Run"))
        .unwrap();
    assert_eq!(created.unlocked, vec!["first-habit".to_string()]);

    let mut last = None;
    for offset in 0..5 {
        if offset > 0 {
            service.clock().advance_days(1);
        }
        last = Some(service.complete_habit(created.habit.uuid).unwrap());
    }
    let last = last.unwrap();

    assert_eq!(last.new_streak, 5);
    assert_eq!(last.unlocked, vec!["streak-5".to_string()]);
    // 50 (first habit) + 22 + 24 + 26 + 28 + 30 + 100 (streak 5)
    assert_eq!(last.update.experience, 280);
    assert_eq!(last.update.old_level, 2);
    assert_eq!(last.update.new_level, 2);
}
