use anyhow::Result;
use service_base::repository::Context;

use crate::catalog::ExampleService;
use crate::output::{self, Output};

pub async fn execute(context: &Context, output: Output, id: i64) -> Result<()> {
    let Some(row) = ExampleService::new(context.clone())
        .get_with_navigation_class(id)
        .await?
    else {
        anyhow::bail!("Example class {} not found", id);
    };

    match output {
        Output::Json => output::json(&row),
        Output::Table => output::examples(output, std::slice::from_ref(&row)),
    }
}
