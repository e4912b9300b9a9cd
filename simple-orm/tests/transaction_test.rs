mod common;

use std::sync::Arc;

use common::{RecordingConnector, blog_schema};
use pretty_assertions::assert_eq;
use simple_orm::{Connector, Error, InsertOptions, Row, Transaction, UpdateOptions, Value};

fn named(name: &str) -> Row {
    Row::from_iter([("name".to_string(), Value::from(name))])
}

#[tokio::test]
async fn test_nested_transactions_commit_once() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());
    let users = schema.model("users")?;
    let tx = Transaction::new(db.clone());

    tx.perform(|outer| async move {
        let conn: Arc<dyn Connector> = outer.clone();
        users.insert(InsertOptions::row(named("ada")).transaction(conn)).await?;

        outer
            .perform(|inner| async move {
                assert_eq!(inner.depth().await, 2);
                users
                    .update(UpdateOptions::new().filter("id", 1).set("name", "bob").transaction(inner))
                    .await?;
                Ok::<_, Error>(())
            })
            .await?;
        Ok::<_, Error>(())
    })
    .await?;

    let statements = db.statements();
    assert_eq!(statements.len(), 4);
    assert_eq!(statements[0], "BEGIN");
    assert!(statements[1].starts_with("INSERT INTO `users`"));
    assert!(statements[2].starts_with("UPDATE  `users` `U`"));
    assert_eq!(statements[3], "COMMIT");
    assert_eq!(tx.depth().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_failed_operation_rolls_back_and_returns_its_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let tx = Transaction::new(db.clone());

    let result = tx
        .perform(|_| async { Err::<(), _>(Error::invalid_argument("boom")) })
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg == "boom"));
    assert_eq!(db.statements(), vec!["BEGIN", "ROLLBACK"]);
    Ok(())
}

#[tokio::test]
async fn test_inner_failure_rolls_back_the_outer_transaction() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let tx = Transaction::new(db.clone());

    tx.perform(|outer| async move {
        let inner = outer
            .perform(|_| async { Err::<(), _>(Error::invalid_argument("inner")) })
            .await;
        assert!(inner.is_err());
        Ok::<_, Error>(())
    })
    .await?;

    assert_eq!(db.statements(), vec!["BEGIN", "ROLLBACK"]);
    Ok(())
}

#[tokio::test]
async fn test_ending_an_idle_transaction_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tx = Transaction::new(RecordingConnector::new());
    assert!(matches!(tx.end(false).await, Err(Error::InvalidArgument(_))));
    Ok(())
}
