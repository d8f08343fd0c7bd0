use anyhow::Result;
use service_base::repository::{Context, Page};

use crate::catalog::ExampleService;
use crate::output::{self, Output};

pub async fn execute(
    context: &Context,
    output: Output,
    navigation_id: i64,
    page: u32,
    size: u32,
) -> Result<()> {
    let result = ExampleService::new(context.clone())
        .get_page_by_navigation_class_id(navigation_id, &Page::new(page, size))
        .await?;

    output::page(output, &result)
}
