use anyhow::Result;
use service_base::repository::{Context, EntityService};

use crate::catalog::{ExampleClass, ExampleService, NavigationClass};
use crate::output::{self, Output};

pub async fn execute(
    context: &Context,
    output: Output,
    navigation_id: Option<i64>,
    navigation_name: Option<String>,
) -> Result<()> {
    let service = ExampleService::new(context.clone());
    let filter = match (navigation_id, navigation_name.as_deref()) {
        (Some(id), _) => Some(ExampleClass::NAVIGATION_CLASS_ID.eq(id)),
        (None, Some(name)) => Some(
            ExampleClass::NAVIGATION_CLASS
                .then(NavigationClass::NAME)
                .eq(name),
        ),
        (None, None) => None,
    };
    let total = service.count(filter.as_ref()).await?;

    match output {
        Output::Json => output::json(&serde_json::json!({
            "navigation_id": navigation_id,
            "navigation_name": navigation_name,
            "count": total,
        })),
        Output::Table => {
            match (navigation_id, navigation_name) {
                (Some(id), _) => {
                    println!("{} example classes under navigation class {}", total, id)
                }
                (None, Some(name)) => {
                    println!("{} example classes under navigation class '{}'", total, name)
                }
                (None, None) => println!("{} example classes", total),
            }
            Ok(())
        }
    }
}
