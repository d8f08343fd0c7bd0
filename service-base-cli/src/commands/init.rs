use anyhow::{Context as _, Result};
use service_base::repository::Context;

use crate::catalog;
use crate::output::{self, Output};

pub async fn execute(context: &Context, output: Output) -> Result<()> {
    catalog::create_schema(context)
        .await
        .context("Failed to create catalog tables")?;

    output::status(output, "Catalog tables ready", serde_json::json!({}))
}
