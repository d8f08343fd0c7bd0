//! Example catalog: navigation classes and the example classes under them

use serde::Serialize;
use service_base::repository::{
    BelongsTo, Context, Entity, EntityService, Field, GenericRepository, HasMany, Include, Join,
    Page, QueryOptions, RepositoryResult, Schema, Value,
};
use std::sync::Arc;

/// Tables for the catalog; safe to run more than once
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS navigation_classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS example_classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    navigation_class_id INTEGER NOT NULL REFERENCES navigation_classes (id),
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS example_classes_navigation_class_id
    ON example_classes (navigation_class_id);
"#;

/// Create the catalog tables if they are missing
pub async fn create_schema(context: &Context) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA_SQL).execute(context.pool()).await?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct NavigationClass {
    pub id: i64,
    pub name: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub example_classes: Vec<ExampleClass>,
}

static NAVIGATION_CLASS: Schema = Schema {
    name: "NavigationClass",
    table: "navigation_classes",
    columns: &["id", "name"],
    key: &["id"],
    generated_key: true,
    joins: &[],
};

impl NavigationClass {
    pub const NAME: Field<NavigationClass> = Field::new("name");

    /// A new, unsaved navigation class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            example_classes: Vec::new(),
        }
    }

    pub fn example_classes_include() -> HasMany<NavigationClass, ExampleClass> {
        HasMany::new(
            "example_classes",
            "navigation_class_id",
            |parent, children| parent.example_classes = children,
        )
    }
}

impl Entity for NavigationClass {
    fn schema() -> &'static Schema {
        &NAVIGATION_CLASS
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", self.id.into()), ("name", self.name.clone().into())]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ExampleClass {
    pub id: i64,
    pub navigation_class_id: i64,
    pub name: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_class: Option<NavigationClass>,
}

static EXAMPLE_CLASS: Schema = Schema {
    name: "ExampleClass",
    table: "example_classes",
    columns: &["id", "navigation_class_id", "name"],
    key: &["id"],
    generated_key: true,
    joins: &[Join {
        name: "navigation_class",
        local_column: "navigation_class_id",
        remote_column: "id",
        target: NavigationClass::schema,
    }],
};

impl ExampleClass {
    pub const NAME: Field<ExampleClass> = Field::new("name");
    pub const NAVIGATION_CLASS_ID: Field<ExampleClass> = Field::new("navigation_class_id");
    pub const NAVIGATION_CLASS: Field<ExampleClass> = Field::new("navigation_class");

    /// A new, unsaved example class under `navigation_class_id`
    pub fn new(navigation_class_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            navigation_class_id,
            name: name.into(),
            navigation_class: None,
        }
    }

    pub fn navigation_class_include() -> BelongsTo<ExampleClass, NavigationClass> {
        BelongsTo::new(
            "navigation_class",
            "navigation_class_id",
            |row, parent| row.navigation_class = parent,
        )
    }
}

impl Entity for ExampleClass {
    fn schema() -> &'static Schema {
        &EXAMPLE_CLASS
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("navigation_class_id", self.navigation_class_id.into()),
            ("name", self.name.clone().into()),
        ]
    }
}

pub struct ExampleService {
    repository: GenericRepository<ExampleClass>,
}

impl ExampleService {
    pub fn new(context: Context) -> Self {
        Self {
            repository: GenericRepository::new(context),
        }
    }

    fn by_navigation_class(navigation_class_id: i64) -> QueryOptions<ExampleClass> {
        QueryOptions::new()
            .filter(ExampleClass::NAVIGATION_CLASS_ID.eq(navigation_class_id))
            .order_by(ExampleClass::NAME.asc())
    }

    /// Every example class under a navigation class, by name, with its parent loaded
    pub async fn get_many_by_navigation_class_id(
        &self,
        navigation_class_id: i64,
    ) -> RepositoryResult<Vec<ExampleClass>> {
        self.get_many(
            Self::by_navigation_class(navigation_class_id)
                .include(ExampleClass::navigation_class_include()),
        )
        .await
    }

    /// One page of example classes under a navigation class, by name
    pub async fn get_page_by_navigation_class_id(
        &self,
        navigation_class_id: i64,
        page: &Page<ExampleClass>,
    ) -> RepositoryResult<Page<ExampleClass>> {
        self.get_many_paged(page, Self::by_navigation_class(navigation_class_id))
            .await
    }

    /// Look up one example class with its parent loaded
    pub async fn get_with_navigation_class(
        &self,
        id: i64,
    ) -> RepositoryResult<Option<ExampleClass>> {
        let includes: Vec<Arc<dyn Include<ExampleClass>>> =
            vec![Arc::new(ExampleClass::navigation_class_include())];
        self.get_by_id(id, &includes).await
    }
}

impl EntityService<ExampleClass> for ExampleService {
    fn repository(&self) -> &GenericRepository<ExampleClass> {
        &self.repository
    }
}

pub struct NavigationService {
    repository: GenericRepository<NavigationClass>,
}

impl NavigationService {
    pub fn new(context: Context) -> Self {
        Self {
            repository: GenericRepository::new(context),
        }
    }

    /// Every navigation class by name, with its example classes loaded
    pub async fn get_all_with_example_classes(&self) -> RepositoryResult<Vec<NavigationClass>> {
        self.get_many(
            QueryOptions::new()
                .order_by(NavigationClass::NAME.asc())
                .include(NavigationClass::example_classes_include()),
        )
        .await
    }
}

impl EntityService<NavigationClass> for NavigationService {
    fn repository(&self) -> &GenericRepository<NavigationClass> {
        &self.repository
    }
}
