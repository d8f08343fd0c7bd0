use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use service_base::repository::Page;

use crate::catalog::{ExampleClass, NavigationClass};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Aligned, colored text
    Table,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Print any serializable value as pretty JSON
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

/// Print a status line, or `{"status": .., ..fields}` in JSON mode
pub fn status(output: Output, message: &str, fields: serde_json::Value) -> Result<()> {
    match output {
        Output::Json => {
            let mut object = serde_json::json!({ "status": message });
            if let (Some(target), serde_json::Value::Object(extra)) =
                (object.as_object_mut(), fields)
            {
                target.extend(extra);
            }
            json(&object)
        }
        Output::Table => {
            println!("{} {}", "✓".green().bold(), message);
            Ok(())
        }
    }
}

pub fn format_row(row: &ExampleClass) -> String {
    let parent = row
        .navigation_class
        .as_ref()
        .map(|n| format!(" ({})", n.name))
        .unwrap_or_default();
    format!(
        "{:>6}  {:>6}{}  {}",
        row.id,
        row.navigation_class_id,
        parent.dimmed(),
        row.name
    )
}

fn header() {
    println!("{}", format!("{:>6}  {:>6}  {}", "ID", "NAV", "NAME").bold());
}

/// Print example classes as a table or JSON array
pub fn examples(output: Output, rows: &[ExampleClass]) -> Result<()> {
    match output {
        Output::Json => json(rows),
        Output::Table => {
            if rows.is_empty() {
                println!("{}", "No example classes found".yellow());
                return Ok(());
            }
            header();
            for row in rows {
                println!("{}", format_row(row));
            }
            Ok(())
        }
    }
}

pub fn format_navigation(navigation: &NavigationClass) -> String {
    let count = match navigation.example_classes.len() {
        1 => "1 example class".to_string(),
        n => format!("{} example classes", n),
    };
    format!("{:>6}  {}  {}", navigation.id, navigation.name, count.dimmed())
}

/// Print navigation classes as a table or JSON array
pub fn navigations(output: Output, navigations: &[NavigationClass]) -> Result<()> {
    match output {
        Output::Json => json(navigations),
        Output::Table => {
            if navigations.is_empty() {
                println!("{}", "No navigation classes found".yellow());
                return Ok(());
            }
            println!("{}", format!("{:>6}  {}", "ID", "NAME").bold());
            for navigation in navigations {
                println!("{}", format_navigation(navigation));
                for row in &navigation.example_classes {
                    println!("        {:>6}  {}", row.id, row.name);
                }
            }
            Ok(())
        }
    }
}

/// Print one page with its position in the whole set
pub fn page(output: Output, page: &Page<ExampleClass>) -> Result<()> {
    match output {
        Output::Json => json(page),
        Output::Table => {
            examples(Output::Table, page.rows())?;
            println!();
            println!(
                "Page {} of {} ({} rows total, {} per page)",
                page.page_number().to_string().bold(),
                page.total_pages().max(1),
                page.total_rows(),
                page.page_size()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_row_includes_parent_name() {
        colored::control::set_override(false);
        let mut row = ExampleClass::new(2, "apple");
        row.id = 7;
        assert_eq!(format_row(&row), "     7       2  apple");

        let mut parent = NavigationClass::new("fruit");
        parent.id = 2;
        row.navigation_class = Some(parent);
        assert!(format_row(&row).contains("(fruit)"));
    }

    #[test]
    fn test_format_navigation_counts_children() {
        colored::control::set_override(false);
        let mut navigation = NavigationClass::new("fruit");
        navigation.id = 3;
        assert_eq!(format_navigation(&navigation), "     3  fruit  0 example classes");

        navigation.example_classes.push(ExampleClass::new(3, "apple"));
        assert_eq!(format_navigation(&navigation), "     3  fruit  1 example class");
    }
}
