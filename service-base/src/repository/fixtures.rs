//! Shared test entities and in-memory databases

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::context::Context;
use super::entity::{Entity, Join, Schema};
use super::field::Field;
use super::include::{BelongsTo, HasMany};
use super::value::Value;

pub(crate) const SCHEMA_SQL: &str = r#"
CREATE TABLE categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE TABLE widgets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER REFERENCES categories (id),
    name TEXT NOT NULL,
    rank INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE memberships (
    group_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    PRIMARY KEY (group_id, user_id)
);
"#;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct Category {
    pub id: i64,
    pub name: String,
    #[sqlx(skip)]
    pub widgets: Vec<Widget>,
}

static CATEGORY: Schema = Schema {
    name: "Category",
    table: "categories",
    columns: &["id", "name"],
    key: &["id"],
    generated_key: true,
    joins: &[],
};

impl Category {
    pub const NAME: Field<Category> = Field::new("name");

    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            widgets: Vec::new(),
        }
    }

    pub fn widgets_include() -> HasMany<Category, Widget> {
        HasMany::new("widgets", "category_id", |category, widgets| {
            category.widgets = widgets
        })
    }
}

impl Entity for Category {
    fn schema() -> &'static Schema {
        &CATEGORY
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("name", self.name.clone().into())]
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct Widget {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub rank: i64,
    #[sqlx(skip)]
    pub category: Option<Category>,
}

static WIDGET: Schema = Schema {
    name: "Widget",
    table: "widgets",
    columns: &["id", "category_id", "name", "rank"],
    key: &["id"],
    generated_key: true,
    joins: &[Join {
        name: "category",
        local_column: "category_id",
        remote_column: "id",
        target: Category::schema,
    }],
};

impl Widget {
    pub const NAME: Field<Widget> = Field::new("name");
    pub const RANK: Field<Widget> = Field::new("rank");
    pub const CATEGORY_ID: Field<Widget> = Field::new("category_id");
    pub const CATEGORY: Field<Widget> = Field::new("category");

    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            category_id: None,
            name: name.to_string(),
            rank: 0,
            category: None,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn ranked(mut self, rank: i64) -> Self {
        self.rank = rank;
        self
    }

    pub fn category_include() -> BelongsTo<Widget, Category> {
        BelongsTo::new("category", "category_id", |widget, category| {
            widget.category = category
        })
    }
}

impl Entity for Widget {
    fn schema() -> &'static Schema {
        &WIDGET
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("category_id", self.category_id.into()),
            ("name", self.name.clone().into()),
            ("rank", self.rank.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct Membership {
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
}

static MEMBERSHIP: Schema = Schema {
    name: "Membership",
    table: "memberships",
    columns: &["group_id", "user_id", "role"],
    key: &["group_id", "user_id"],
    generated_key: false,
    joins: &[],
};

impl Membership {
    pub fn new(group_id: i64, user_id: i64, role: &str) -> Self {
        Self {
            group_id,
            user_id,
            role: role.to_string(),
        }
    }
}

impl Entity for Membership {
    fn schema() -> &'static Schema {
        &MEMBERSHIP
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("group_id", self.group_id.into()),
            ("user_id", self.user_id.into()),
            ("role", self.role.clone().into()),
        ]
    }
}

/// Single-connection in-memory database with the fixture tables
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await.unwrap();
    pool
}

pub(crate) async fn memory_context() -> Context {
    Context::new(memory_pool().await)
}

/// Categories `hardware` (bolt, nut) and `empty`, plus one uncategorised widget
pub(crate) async fn seeded_context() -> Context {
    let context = memory_context().await;
    sqlx::raw_sql(
        r#"
        INSERT INTO categories (id, name) VALUES (1, 'hardware'), (2, 'empty');
        INSERT INTO widgets (id, category_id, name, rank) VALUES
            (1, 1, 'bolt', 2),
            (2, 1, 'nut', 1),
            (3, NULL, 'orphan', 3);
        "#,
    )
    .execute(context.pool())
    .await
    .unwrap();
    context
}
