mod common;

use common::RecordingConnector;
use pretty_assertions::assert_eq;
use simple_orm::{Entity, Error, FindOptions, InsertOptions, Schema};

#[derive(Debug, Clone, Entity)]
#[orm(table = "users")]
struct User {
    #[orm(id)]
    id: i32,
    #[orm(size = 255)]
    name: String,
    #[orm(hidden)]
    password: String,
    bio: Option<String>,
}

#[derive(Debug, Clone, Entity)]
#[orm(table = "avatars")]
struct Avatar {
    #[orm(id)]
    id: i32,
    #[orm(references = "users")]
    user_id: i32,
    #[orm(values = "small, large")]
    size: String,
    #[orm(omit)]
    url: Option<String>,
}

#[derive(Entity)]
struct BlogPost {
    #[orm(primary_key, sql_type = "char(36)")]
    slug: String,
    title: String,
}

fn schema(db: std::sync::Arc<RecordingConnector>) -> Schema {
    let mut schema = Schema::new("entities").with_connection(db);
    schema.add_entity::<User>().unwrap();
    schema.add_entity::<Avatar>().unwrap();
    schema.add_entity::<BlogPost>().unwrap();
    schema.finalize().unwrap();
    schema
}

#[test]
fn test_derived_definitions() -> Result<(), Box<dyn std::error::Error>> {
    let schema = schema(RecordingConnector::new());

    assert_eq!(User::model_name(), "users");
    assert_eq!(BlogPost::model_name(), "blogPost");

    let users = schema.model("users")?.get_schema();
    let types: Vec<_> = users.fields.iter().map(|f| (f.name.as_str(), f.field_type.as_str())).collect();
    assert_eq!(
        types,
        vec![("id", "int"), ("name", "varchar(255)"), ("password", "text"), ("bio", "text")]
    );
    assert!(users.fields[3].can_be_null);
    assert!(users.fields[0].auto_increment);
    assert_eq!(users.primary_key, vec!["id"]);

    let avatars = schema.model("avatars")?;
    let user_id = avatars.model().field("user_id").unwrap();
    assert_eq!(user_id.field_type(), "int");
    assert_eq!(user_id.reference_name(), Some("user"));
    assert_eq!(avatars.model().field("size").unwrap().values(), ["small", "large"]);

    let posts = schema.model("blogPost")?.get_schema();
    assert_eq!(posts.primary_key, vec!["slug"]);
    assert_eq!(posts.fields[0].field_type, "char(36)");

    assert_eq!(user_fields::PASSWORD, "password");
    assert_eq!(avatar_fields::USER_ID, "user_id");
    assert_eq!(blog_post_fields::TITLE, "title");
    Ok(())
}

#[tokio::test]
async fn test_entities_insert_and_join() -> Result<(), Box<dyn std::error::Error>> {
    let db = RecordingConnector::new();
    let schema = schema(db.clone());

    let avatar = Avatar {
        id: 1,
        user_id: 2,
        size: "small".into(),
        url: None,
    };
    schema.model("avatars")?.insert(InsertOptions::entity(avatar)).await?;
    assert_eq!(
        db.last().unwrap(),
        "INSERT INTO `avatars`(`id`, `user_id`, `size`, `url`) VALUES \n    (1, 2, 'small', NULL);"
    );

    schema
        .model("avatars")?
        .find(FindOptions::new().show("user.name").filter("user.id", 2))
        .await?;
    assert_eq!(
        db.last().unwrap(),
        "SELECT `A`.`id`, `A`.`user_id`, `A`.`size`, `U`.`name` AS `user.name`\n\
         FROM  `avatars` `A` \n\
         JOIN `users` `U` ON `A`.`user_id` = `U`.`id`\n\
         WHERE (`U`.`id` = 2)\n;"
    );

    let err = schema
        .model("users")?
        .find(FindOptions::new().show("password"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Visibility(_)));

    let user = User {
        id: 5,
        name: "ada".into(),
        password: "secret".into(),
        bio: Some("hi".into()),
    };
    schema.model("users")?.insert(InsertOptions::entities(vec![user])).await?;
    assert!(db.last().unwrap().ends_with("(5, 'ada', 'secret', 'hi');"));
    Ok(())
}
