use anyhow::Result;
use service_base::repository::{Context, EntityService, RepositoryResult};

use crate::catalog::{ExampleClass, ExampleService};
use crate::output::{self, Output};

/// Load, rename and store one example class
pub async fn rename(
    service: &ExampleService,
    id: i64,
    name: String,
) -> RepositoryResult<Option<ExampleClass>> {
    let Some(mut row) = service.get_by_id(id, &[]).await? else {
        return Ok(None);
    };
    row.name = name;
    service.update(&row).await.map(Some)
}

pub async fn execute(context: &Context, output: Output, id: i64, name: String) -> Result<()> {
    let service = ExampleService::new(context.clone());
    let Some(row) = rename(&service, id, name).await? else {
        anyhow::bail!("Example class {} not found", id);
    };

    match output {
        Output::Json => output::json(&row),
        Output::Table => output::status(
            output,
            &format!("Renamed example class {} to '{}'", row.id, row.name),
            serde_json::Value::Null,
        ),
    }
}
