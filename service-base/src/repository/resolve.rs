//! Field-path resolution
//!
//! Turns a [`FieldPath`] into the chain of to-one joins it walks and the
//! scalar column it ends on. Resolution only consults static [`Schema`]
//! metadata; SQL rendering happens elsewhere.

use super::entity::{Join, Schema};
use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::field::FieldPath;

/// A validated field path
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Navigations walked from the root entity, outermost first
    pub joins: Vec<&'static Join>,
    /// Schema that owns `column`
    pub owner: &'static Schema,
    /// Terminal scalar column
    pub column: &'static str,
}

/// Resolves field paths against entity schemas
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldResolver;

impl FieldResolver {
    /// Resolve `path` starting at `schema`
    ///
    /// Every segment but the last must name a navigation on the entity
    /// reached so far; the last must name one of its scalar columns.
    pub fn resolve(schema: &'static Schema, path: &FieldPath) -> RepositoryResult<ResolvedField> {
        let segments = path.segments();
        let Some((leaf, navigations)) = segments.split_last() else {
            return Err(unknown(schema, path, "empty field path"));
        };

        let mut current = schema;
        let mut joins = Vec::with_capacity(navigations.len());
        for segment in navigations {
            let join = current.join(segment).ok_or_else(|| {
                unknown(
                    schema,
                    path,
                    &format!("`{}` is not a navigation of {}", segment, current.name),
                )
            })?;
            joins.push(join);
            current = (join.target)();
        }

        let column = current
            .columns
            .iter()
            .copied()
            .find(|column| column == leaf)
            .ok_or_else(|| {
                unknown(
                    schema,
                    path,
                    &format!("`{}` is not a column of {}", leaf, current.name),
                )
            })?;

        Ok(ResolvedField {
            joins,
            owner: current,
            column,
        })
    }
}

fn unknown(schema: &Schema, path: &FieldPath, detail: &str) -> RepositoryError {
    RepositoryError::contract_violation(
        RepositoryOperation::GetMany,
        format!("cannot resolve field path `{}`: {}", path, detail),
    )
    .with_entity_type(schema.name)
}
