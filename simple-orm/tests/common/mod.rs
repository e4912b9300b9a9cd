#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use simple_orm::{
    Connector, Dialect, ExecResult, FieldDefinition, ModelDefinition, MysqlDialect, Result, Row, Schema,
};

/// Records every statement and answers queries with canned rows.
#[derive(Default)]
pub struct RecordingConnector {
    dialect: MysqlDialect,
    log: Mutex<Vec<String>>,
    rows: Mutex<Vec<Row>>,
}

impl RecordingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_rows(rows: Vec<Row>) -> Arc<Self> {
        let connector = Self::default();
        *connector.rows.lock().unwrap() = rows;
        Arc::new(connector)
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.log.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn fetch_sql(&self, sql: &str) -> Result<Vec<Row>> {
        self.log.lock().unwrap().push(sql.to_string());
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn execute_sql(&self, sql: &str) -> Result<ExecResult> {
        self.log.lock().unwrap().push(sql.to_string());
        Ok(ExecResult {
            affected_rows: 1,
            last_insert_id: 0,
        })
    }
}

/// `users`, `avatars` (referencing users) and `comments` (referencing
/// avatars), finalized and bound to `connector`.
pub fn blog_schema(connector: Arc<RecordingConnector>) -> Schema {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut schema = Schema::new("blog").with_connection(connector);
    schema
        .add_model(
            ModelDefinition::new("users")
                .field(FieldDefinition::id())
                .field(FieldDefinition::new("name", "varchar(255)"))
                .field(FieldDefinition::new("password", "varchar(255)").can_be_shown(false))
                .field(FieldDefinition::new("bio", "text").show(false)),
        )
        .unwrap();
    schema
        .add_model(
            ModelDefinition::new("avatars")
                .field(FieldDefinition::id())
                .field(FieldDefinition::references("users").name("user"))
                .field(FieldDefinition::new("url", "text")),
        )
        .unwrap();
    schema
        .add_model(
            ModelDefinition::new("comments")
                .field(FieldDefinition::id())
                .field(FieldDefinition::references("avatars").name("avatar"))
                .field(FieldDefinition::new("body", "text")),
        )
        .unwrap();
    schema.finalize().unwrap();
    schema
}
