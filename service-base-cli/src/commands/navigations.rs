use anyhow::Result;
use service_base::repository::Context;

use crate::catalog::NavigationService;
use crate::output::{self, Output};

pub async fn execute(context: &Context, output: Output) -> Result<()> {
    let navigations = NavigationService::new(context.clone())
        .get_all_with_example_classes()
        .await?;

    output::navigations(output, &navigations)
}
