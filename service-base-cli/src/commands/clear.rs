use anyhow::Result;
use service_base::repository::{Context, EntityService, RepositoryResult};

use crate::catalog::{ExampleService, NavigationService};
use crate::output::{self, Output};

/// Remove example classes, then navigation classes; returns both counts
pub async fn clear(context: &Context) -> RepositoryResult<(u64, u64)> {
    let examples = ExampleService::new(context.clone()).clear_entity().await?;
    let navigations = NavigationService::new(context.clone()).clear_entity().await?;
    Ok((examples, navigations))
}

pub async fn execute(context: &Context, output: Output) -> Result<()> {
    let (examples, navigations) = clear(context).await?;

    output::status(
        output,
        &format!(
            "Removed {} example classes and {} navigation classes",
            examples, navigations
        ),
        serde_json::json!({
            "example_classes": examples,
            "navigation_classes": navigations,
        }),
    )
}
