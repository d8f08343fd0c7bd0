use anyhow::Result;
use service_base::repository::{Context, EntityService, RepositoryResult};

use crate::catalog::{ExampleClass, ExampleService, NavigationClass, NavigationService};
use crate::output::{self, Output};

/// Summary of one seeding run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seeded {
    pub navigation_ids: Vec<i64>,
    pub example_classes: usize,
}

/// Insert `navigations` navigation classes with `per_navigation` example classes each
pub async fn seed(
    context: &Context,
    navigations: u32,
    per_navigation: u32,
) -> RepositoryResult<Seeded> {
    let parents: Vec<NavigationClass> = (1..=navigations)
        .map(|n| NavigationClass::new(format!("navigation-{}", n)))
        .collect();
    let parents = NavigationService::new(context.clone())
        .create_many(&parents)
        .await?;

    let children: Vec<ExampleClass> = parents
        .iter()
        .enumerate()
        .flat_map(|(n, parent)| {
            (1..=per_navigation).map(move |m| {
                ExampleClass::new(parent.id, format!("example-{}-{:03}", n + 1, m))
            })
        })
        .collect();
    let children = ExampleService::new(context.clone())
        .create_many(&children)
        .await?;

    tracing::info!(
        navigations = parents.len(),
        example_classes = children.len(),
        "Seeded catalog"
    );

    Ok(Seeded {
        navigation_ids: parents.iter().map(|p| p.id).collect(),
        example_classes: children.len(),
    })
}

pub async fn execute(
    context: &Context,
    output: Output,
    navigations: u32,
    per_navigation: u32,
) -> Result<()> {
    let seeded = seed(context, navigations, per_navigation).await?;

    output::status(
        output,
        &format!(
            "Seeded {} navigation classes (ids {:?}) with {} example classes",
            seeded.navigation_ids.len(),
            seeded.navigation_ids,
            seeded.example_classes
        ),
        serde_json::json!({
            "navigation_ids": seeded.navigation_ids,
            "example_classes": seeded.example_classes,
        }),
    )
}
