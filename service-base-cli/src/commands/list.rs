use anyhow::Result;
use service_base::repository::Context;

use crate::catalog::ExampleService;
use crate::output::{self, Output};

pub async fn execute(context: &Context, output: Output, navigation_id: i64) -> Result<()> {
    let rows = ExampleService::new(context.clone())
        .get_many_by_navigation_class_id(navigation_id)
        .await?;

    output::examples(output, &rows)
}
