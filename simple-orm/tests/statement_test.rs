mod common;

use common::{RecordingConnector, blog_schema};
use pretty_assertions::assert_eq;
use simple_orm::{DeleteOptions, Error, InsertOptions, Row, Term, UpdateOptions, Value};

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn test_insert_maps_reference_names_to_columns() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema
        .model("avatars")?
        .insert(InsertOptions::rows(vec![
            row(&[("user", Value::from(1)), ("url", Value::from("a.png"))]),
            row(&[("userId", Value::from(2))]),
        ]))
        .await?;

    assert_eq!(
        db.last().unwrap(),
        "INSERT INTO `avatars`(`userId`, `url`) VALUES \n    (1, 'a.png'),\n    (2, NULL);"
    );
    Ok(())
}

#[tokio::test]
async fn test_insert_rejects_unknown_keys() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    let err = schema
        .model("avatars")?
        .insert(InsertOptions::row(row(&[("owner", Value::from(1))])))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = schema.model("avatars")?.insert(InsertOptions::rows(Vec::new())).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(db.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_update_across_a_join() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    let result = schema
        .model("avatars")?
        .update(
            UpdateOptions::new()
                .filter("user.name", "ada")
                .set("url", "b.png")
                .set_path("id", "user.id")
                .limit(1),
        )
        .await?;
    assert_eq!(result.affected_rows, 1);

    assert_eq!(
        db.last().unwrap(),
        "UPDATE  `avatars` `A` \n\
         JOIN `users` `U` ON `A`.`userId` = `U`.`id`\n   \
         SET `A`.`url` = ('b.png'),\n       \
         `A`.`id` = (`U`.`id`)\n\
         WHERE (`U`.`name` = 'ada')\n\
         LIMIT 1\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_update_with_raw_terms_and_nothing_to_set() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema
        .model("users")?
        .update(UpdateOptions::new().filter("id", vec![1, 2]).set_term("name", Term::as_is("UPPER(`name`)")))
        .await?;
    assert_eq!(
        db.last().unwrap(),
        "UPDATE  `users` `U` \n   SET `U`.`name` = (UPPER(`name`))\nWHERE (`U`.`id` IN (1, 2))\n;"
    );

    let err = schema
        .model("users")?
        .update(UpdateOptions::new().filter("id", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn test_delete_names_the_root_only_when_joining() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema.model("users")?.delete(DeleteOptions::new().filter("id", 3)).await?;
    assert_eq!(
        db.last().unwrap(),
        "DELETE\nFROM  `users` `U` \nWHERE (`U`.`id` = 3)\n;"
    );

    schema
        .model("avatars")?
        .delete(DeleteOptions::new().filter("user.id", 3).limit(2))
        .await?;
    assert_eq!(
        db.last().unwrap(),
        "DELETE `A`\n\
         FROM  `avatars` `A` \n\
         JOIN `users` `U` ON `A`.`userId` = `U`.`id`\n\
         WHERE (`U`.`id` = 3)\n\
         LIMIT 2\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_with_unresolved_condition_deletes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    let err = schema
        .model("users")?
        .delete(DeleteOptions::new().filter("nickname", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(db.statements().is_empty());
    Ok(())
}
