use anyhow::Result;
use service_base::repository::{Context, EntityService};

use crate::catalog::ExampleService;
use crate::output::{self, Output};

pub async fn execute(context: &Context, output: Output, id: i64) -> Result<()> {
    let service = ExampleService::new(context.clone());

    match service.delete(id).await {
        Ok(()) => output::status(
            output,
            &format!("Deleted example class {}", id),
            serde_json::json!({ "id": id }),
        ),
        Err(e) if e.is_not_found() => anyhow::bail!("Example class {} not found", id),
        Err(e) => Err(e.into()),
    }
}
