mod common;

use common::{RecordingConnector, blog_schema};
use pretty_assertions::assert_eq;
use simple_orm::{
    ConditionValue, Error, FieldDefinition, FindOptions, ModelDefinition, OrderItem, Row, Schema, Show, Value,
};

#[tokio::test]
async fn test_find_on_own_field_needs_no_join() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    let users = schema.model("users")?;
    let query = users.find_query(&FindOptions::new().filter("id", 3))?;
    assert_eq!(query.from.len(), 1);

    users.find(FindOptions::new().filter("id", 3)).await?;
    assert_eq!(
        db.last().unwrap(),
        "SELECT `U`.`id`, `U`.`name`\nFROM  `users` `U` \nWHERE (`U`.`id` = 3)\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_condition_through_a_reference_joins_the_target() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema
        .model("avatars")?
        .find(FindOptions::new().show("user.name").filter("user.id", 3))
        .await?;

    assert_eq!(
        db.last().unwrap(),
        "SELECT `A`.`id`, `A`.`userId`, `A`.`url`, `U`.`name` AS `user.name`\n\
         FROM  `avatars` `A` \n\
         JOIN `users` `U` ON `A`.`userId` = `U`.`id`\n\
         WHERE (`U`.`id` = 3)\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_shared_path_prefix_is_joined_once() -> Result<(), Box<dyn std::error::Error>> {
    let schema = blog_schema(RecordingConnector::new());

    let query = schema.model("comments")?.find_query(
        &FindOptions::new()
            .show("avatar.url")
            .show("avatar.user.name")
            .filter("avatar.user.id", 1),
    )?;

    let aliases: Vec<_> = query.from.iter().map(|f| f.key().to_string()).collect();
    assert_eq!(aliases, vec!["C", "A", "U"]);
    Ok(())
}

#[tokio::test]
async fn test_back_reference_and_join_modifiers() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema
        .model("users")?
        .find(FindOptions::new().show_only(["name"]).filter("?avatars.url", Value::Null))
        .await?;

    assert_eq!(
        db.last().unwrap(),
        "SELECT `U`.`name`\n\
         FROM  `users` `U` \n\
         LEFT JOIN `avatars` `A` ON `U`.`id` = `A`.`userId`\n\
         WHERE (`A`.`url` IS NULL)\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_hidden_fields_cannot_be_shown() -> Result<(), Box<dyn std::error::Error>> {
    let schema = blog_schema(RecordingConnector::new());

    let err = schema
        .model("users")?
        .find(FindOptions::new().show("password"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Visibility(_)));

    let err = schema
        .model("comments")?
        .find_query(&FindOptions::new().show("avatar.user.password"))
        .unwrap_err();
    assert!(matches!(err, Error::Visibility(_)));

    // omitted by default but showable on request
    let query = schema.model("users")?.find_query(&FindOptions::new().show("bio"))?;
    assert_eq!(query.select.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_unresolved_condition_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    let err = schema
        .model("avatars")?
        .find(FindOptions::new().filter("owner.id", 3))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = schema
        .model("users")?
        .find_query(&FindOptions::new().filter("id", ConditionValue::op("~=", 1)))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    assert!(db.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_between_and_empty_lists_render_valid_sql() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());
    let users = schema.model("users")?;

    users
        .find(FindOptions::new().filter("id", ConditionValue::op("BETWEEN", vec![1, 5])))
        .await?;
    assert_eq!(
        db.last().unwrap(),
        "SELECT `U`.`id`, `U`.`name`\nFROM  `users` `U` \nWHERE (`U`.`id` BETWEEN 1 AND 5)\n;"
    );

    users.find(FindOptions::new().filter("id", Vec::<i64>::new())).await?;
    assert_eq!(
        db.last().unwrap(),
        "SELECT `U`.`id`, `U`.`name`\nFROM  `users` `U` \nWHERE (FALSE)\n;"
    );

    let err = users
        .find(FindOptions::new().filter("id", ConditionValue::op("BETWEEN", vec![1])))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn test_order_limit_and_functions() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = blog_schema(db.clone());

    schema
        .model("avatars")?
        .find(
            FindOptions::new()
                .show_only([Show::func("COUNT", vec!["id".into()]).alias("n")])
                .group_by("user.name")
                .order_by(OrderItem::desc("user.name"))
                .order_by("nowhere")
                .limit((10u64, 5u64)),
        )
        .await?;

    assert_eq!(
        db.last().unwrap(),
        "SELECT COUNT(`A`.`id`) AS `n`\n\
         FROM  `avatars` `A` \n\
         JOIN `users` `U` ON `A`.`userId` = `U`.`id`\n\
         GROUP BY `U`.`name` \n\
         ORDER BY `U`.`name` DESC\n\
         LIMIT 10, 5\n;"
    );
    Ok(())
}

#[tokio::test]
async fn test_find_one_forces_a_single_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut row = Row::new();
    row.insert("id".into(), Value::from(7));
    row.insert("name".into(), Value::from("ada"));
    let db = RecordingConnector::with_rows(vec![row.clone(), row.clone()]);
    let schema = blog_schema(db.clone());

    let found = schema
        .model("users")?
        .find_one(FindOptions::new().limit((20u64, 50u64)))
        .await?;
    assert_eq!(found, Some(row));
    assert!(db.last().unwrap().contains("LIMIT 20, 1\n"));
    Ok(())
}

#[tokio::test]
async fn test_alias_prefix_applies_to_every_table() -> Result<(), Box<dyn std::error::Error>> {
    let schema = blog_schema(RecordingConnector::new());

    let query = schema
        .model("avatars")?
        .with_alias_prefix("p_")
        .find_query(&FindOptions::new().filter("user.id", 3))?;

    let aliases: Vec<_> = query.from.iter().map(|f| f.key().to_string()).collect();
    assert_eq!(aliases, vec!["p_A", "p_U"]);
    Ok(())
}

#[tokio::test]
async fn test_hooks_and_row_mapper() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::with_rows(vec![Row::from_iter([("id".to_string(), Value::from(1))])]);

    let mut schema = Schema::new("hooks").with_connection(db.clone());
    schema.add_model(
        ModelDefinition::new("tags")
            .field(FieldDefinition::id())
            .field(FieldDefinition::new("label", "text"))
            .find_preprocess(|query, _| {
                let mut query = query.clone();
                query.distinct = true;
                Some(query)
            })
            .find_postprocess(|mut rows, _| {
                for row in &mut rows {
                    row.insert("seen".into(), Value::from(true));
                }
                Ok(rows)
            }),
    )?;
    schema.finalize()?;

    let rows = schema
        .model("tags")?
        .find(FindOptions::new().map_row(|mut row| {
            row.shift_remove("id");
            row
        }))
        .await?;

    assert!(db.last().unwrap().starts_with("SELECT DISTINCT "));
    assert_eq!(rows, vec![Row::from_iter([("seen".to_string(), Value::from(true))])]);
    Ok(())
}

#[tokio::test]
async fn test_missing_connection_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut schema = Schema::new("offline");
    schema.add_model(ModelDefinition::new("tags").field(FieldDefinition::id()))?;
    schema.finalize()?;

    let err = schema.model("tags")?.find(FindOptions::new()).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    Ok(())
}
