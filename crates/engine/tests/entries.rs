use engine::{Engine, EngineError, Entry, HistoryPoint};
use tempfile::TempDir;

async fn engine_with_file_db() -> (Engine, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::builder()
        .database_path(dir.path().join("data.db"))
        .build()
        .await
        .unwrap();
    engine.ensure_schema().await.unwrap();
    (engine, dir)
}

fn entry(id: i64, date: &str, amount: f64, description: &str, category: &str) -> Entry {
    Entry {
        id,
        date: date.to_string(),
        amount,
        description: description.to_string(),
        category: category.to_string(),
    }
}

#[tokio::test]
async fn add_entry_is_listed_with_fresh_id() {
    let (engine, _dir) = engine_with_file_db().await;

    let first = engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();
    let second = engine
        .add_entry("2024-01-02", "-40", "refund", "divers")
        .await
        .unwrap();
    assert_ne!(first, second);

    let entries = engine.entries().await.unwrap();
    assert_eq!(
        entries,
        vec![
            entry(first, "2024-01-01", 12.5, "coffee", "food"),
            entry(second, "2024-01-02", -40.0, "refund", "divers"),
        ]
    );
}

#[tokio::test]
async fn add_entry_rejects_invalid_input_without_writing() {
    let (engine, _dir) = engine_with_file_db().await;

    assert_eq!(
        engine.add_entry("", "1", "x", "y").await,
        Err(EngineError::MissingDate)
    );
    for amount in ["abc", "nan", "inf", "-Infinity", ""] {
        let err = engine
            .add_entry("2024-01-01", amount, "x", "y")
            .await
            .unwrap_err();
        assert!(err.is_validation(), "{amount}: {err}");
    }

    assert!(engine.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_replaces_every_field() {
    let (engine, _dir) = engine_with_file_db().await;
    let id = engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();

    engine
        .update_entry(id, "2024-02-02", "3", "bus", "deplacement")
        .await
        .unwrap();

    assert_eq!(
        engine.entries().await.unwrap(),
        vec![entry(id, "2024-02-02", 3.0, "bus", "deplacement")]
    );
}

#[tokio::test]
async fn update_with_invalid_amount_leaves_entry_untouched() {
    let (engine, _dir) = engine_with_file_db().await;
    let id = engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();

    let err = engine
        .update_entry(id, "2024-02-02", "NaN", "bus", "deplacement")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::NonFiniteAmount("NaN".to_string()));

    let err = engine
        .update_entry(id, "2024-02-02", "twelve", "bus", "deplacement")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidAmount("twelve".to_string()));

    assert_eq!(
        engine.entry(id).await.unwrap(),
        Some(entry(id, "2024-01-01", 12.5, "coffee", "food"))
    );
}

#[tokio::test]
async fn update_and_delete_of_missing_id_are_silent() {
    let (engine, _dir) = engine_with_file_db().await;
    let id = engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();

    engine
        .update_entry(id + 100, "2024-02-02", "3", "bus", "deplacement")
        .await
        .unwrap();
    engine.delete_entry(id + 100).await.unwrap();

    assert_eq!(
        engine.entries().await.unwrap(),
        vec![entry(id, "2024-01-01", 12.5, "coffee", "food")]
    );
}

#[tokio::test]
async fn delete_removes_entry() {
    let (engine, _dir) = engine_with_file_db().await;
    let keep = engine.add_entry("2024-01-01", "1", "a", "x").await.unwrap();
    let removed = engine.add_entry("2024-01-02", "2", "b", "y").await.unwrap();

    engine.delete_entry(removed).await.unwrap();

    let ids: Vec<i64> = engine
        .entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![keep]);
    assert_eq!(engine.entry(removed).await.unwrap(), None);
}

#[tokio::test]
async fn history_projects_date_amount_category() {
    let (engine, _dir) = engine_with_file_db().await;
    engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();
    engine
        .add_entry("2024-01-03", "-5", "ticket", "jeux")
        .await
        .unwrap();

    assert_eq!(
        engine.history().await.unwrap(),
        vec![
            HistoryPoint {
                date: "2024-01-01".to_string(),
                amount: 12.5,
                category: "food".to_string(),
            },
            HistoryPoint {
                date: "2024-01-03".to_string(),
                amount: -5.0,
                category: "jeux".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn data_survives_a_new_engine_on_the_same_file() {
    let (engine, dir) = engine_with_file_db().await;
    let id = engine
        .add_entry("2024-01-01", "12.50", "coffee", "food")
        .await
        .unwrap();

    let reopened = Engine::builder()
        .database_path(dir.path().join("data.db"))
        .create_if_missing(false)
        .build()
        .await
        .unwrap();
    assert_eq!(
        reopened.entries().await.unwrap(),
        vec![entry(id, "2024-01-01", 12.5, "coffee", "food")]
    );
    drop(dir);
}

#[tokio::test]
async fn missing_file_is_an_error_when_creation_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let engine = Engine::builder()
        .database_path(&path)
        .create_if_missing(false)
        .build()
        .await
        .unwrap();

    let err = engine.entries().await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    assert!(!path.exists());
}

#[tokio::test]
async fn file_names_are_not_parsed_as_urls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odd?mode=ro#100%.db");
    let engine = Engine::builder().database_path(&path).build().await.unwrap();

    engine
        .add_entry("2024-01-01", "1", "coffee", "food")
        .await
        .unwrap();

    assert!(path.exists());
    assert_eq!(engine.entries().await.unwrap().len(), 1);
}
