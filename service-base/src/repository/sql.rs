//! SQL rendering for SQLite
//!
//! Everything here produces a [`QueryBuilder`] with owned bind arguments.
//! The root table is aliased `t0`; each distinct navigation prefix a query
//! walks becomes a `LEFT JOIN` aliased `j1`, `j2`, and so on. Identifiers
//! are always double-quoted.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite};

use super::entity::{Join, Schema};
use super::error::{RepositoryError, RepositoryOperation, RepositoryResult};
use super::field::{Expr, FieldPath};
use super::filter::{Condition, FilterOperator};
use super::order::OrderDirection;
use super::resolve::FieldResolver;
use super::value::{Key, Value};

pub(crate) const ROOT_ALIAS: &str = "t0";

pub(crate) type SqlBuilder = QueryBuilder<'static, Sqlite>;

/// Quote an identifier, doubling embedded quotes
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualify(alias: &str, column: &str) -> String {
    format!("{}.{}", quote(alias), quote(column))
}

/// Bind one value
pub(crate) fn push_value(builder: &mut SqlBuilder, value: &Value) {
    match value {
        Value::Null => builder.push_bind(None::<i64>),
        Value::Bool(b) => builder.push_bind(*b),
        Value::Integer(i) => builder.push_bind(*i),
        Value::Float(x) => builder.push_bind(*x),
        Value::Text(s) => builder.push_bind(s.clone()),
        Value::Uuid(u) => builder.push_bind(*u),
        Value::Timestamp(t) => builder.push_bind(*t),
    };
}

fn push_values(builder: &mut SqlBuilder, values: &[Value]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(builder, value);
    }
}

/// `= NULL` never matches in SQL; such comparisons render as `IS [NOT] NULL`
fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Value::Null))
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

struct PlannedJoin {
    prefix: String,
    alias: String,
    parent_alias: String,
    join: &'static Join,
}

/// Join aliases and qualified columns for every path a query references
pub(crate) struct JoinPlan {
    schema: &'static Schema,
    joins: Vec<PlannedJoin>,
    columns: HashMap<FieldPath, String>,
}

impl JoinPlan {
    pub(crate) fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            joins: Vec::new(),
            columns: HashMap::new(),
        }
    }

    /// Resolve `path`, adding any joins it needs
    pub(crate) fn add(&mut self, path: &FieldPath) -> RepositoryResult<()> {
        if self.columns.contains_key(path) {
            return Ok(());
        }
        let resolved = FieldResolver::resolve(self.schema, path)?;

        let mut parent = ROOT_ALIAS.to_string();
        let mut prefix = String::new();
        for join in resolved.joins {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(join.name);

            let existing = self
                .joins
                .iter()
                .find(|planned| planned.prefix == prefix)
                .map(|planned| planned.alias.clone());
            let alias = match existing {
                Some(alias) => alias,
                None => {
                    let alias = format!("j{}", self.joins.len() + 1);
                    self.joins.push(PlannedJoin {
                        prefix: prefix.clone(),
                        alias: alias.clone(),
                        parent_alias: parent.clone(),
                        join,
                    });
                    alias
                }
            };
            parent = alias;
        }

        self.columns
            .insert(path.clone(), qualify(&parent, resolved.column));
        Ok(())
    }

    fn column(&self, path: &FieldPath) -> RepositoryResult<&str> {
        self.columns.get(path).map(String::as_str).ok_or_else(|| {
            RepositoryError::contract_violation(
                RepositoryOperation::GetMany,
                format!("field path `{}` was not planned", path),
            )
            .with_entity_type(self.schema.name)
        })
    }

    fn push_from(&self, builder: &mut SqlBuilder) {
        builder.push(" FROM ");
        builder.push(quote(self.schema.table));
        builder.push(" AS ");
        builder.push(quote(ROOT_ALIAS));
        for planned in &self.joins {
            let target = (planned.join.target)();
            builder.push(" LEFT JOIN ");
            builder.push(quote(target.table));
            builder.push(" AS ");
            builder.push(quote(&planned.alias));
            builder.push(" ON ");
            builder.push(qualify(&planned.alias, planned.join.remote_column));
            builder.push(" = ");
            builder.push(qualify(&planned.parent_alias, planned.join.local_column));
        }
    }

    fn push_expr(&self, builder: &mut SqlBuilder, expr: &Expr) -> RepositoryResult<()> {
        match expr {
            Expr::Column(path) => {
                builder.push(self.column(path)?);
            }
            Expr::Literal(value) => push_value(builder, value),
            Expr::Cast(inner, ty) => {
                builder.push("CAST(");
                self.push_expr(builder, inner)?;
                builder.push(" AS ");
                builder.push(ty.as_sql());
                builder.push(")");
            }
            Expr::Lower(inner) => {
                builder.push("lower(");
                self.push_expr(builder, inner)?;
                builder.push(")");
            }
        }
        Ok(())
    }

    fn push_condition(
        &self,
        builder: &mut SqlBuilder,
        condition: &Condition,
    ) -> RepositoryResult<()> {
        match condition {
            Condition::Compare {
                left,
                operator: operator @ (FilterOperator::Equal | FilterOperator::NotEqual),
                right,
            } if is_null(left) || is_null(right) => {
                let operand = if is_null(left) { right } else { left };
                self.push_expr(builder, operand)?;
                builder.push(match operator {
                    FilterOperator::Equal => " IS NULL",
                    _ => " IS NOT NULL",
                });
            }
            Condition::Compare {
                left,
                operator,
                right,
            } => {
                self.push_expr(builder, left)?;
                builder.push(" ");
                builder.push(operator.as_sql());
                builder.push(" ");
                self.push_expr(builder, right)?;
            }
            Condition::In { values, .. } if values.is_empty() => {
                builder.push("1 = 0");
            }
            Condition::In { expr, values } => {
                self.push_expr(builder, expr)?;
                builder.push(" IN (");
                push_values(builder, values);
                builder.push(")");
            }
            Condition::IsNull(expr) => {
                self.push_expr(builder, expr)?;
                builder.push(" IS NULL");
            }
            Condition::IsNotNull(expr) => {
                self.push_expr(builder, expr)?;
                builder.push(" IS NOT NULL");
            }
            Condition::And(children) => self.push_junction(builder, children, " AND ", "1 = 1")?,
            Condition::Or(children) => self.push_junction(builder, children, " OR ", "1 = 0")?,
            Condition::Not(inner) => {
                builder.push("NOT (");
                self.push_condition(builder, inner)?;
                builder.push(")");
            }
        }
        Ok(())
    }

    fn push_junction(
        &self,
        builder: &mut SqlBuilder,
        children: &[Condition],
        separator: &str,
        empty: &str,
    ) -> RepositoryResult<()> {
        if children.is_empty() {
            builder.push(empty);
            return Ok(());
        }
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                builder.push(separator);
            }
            builder.push("(");
            self.push_condition(builder, child)?;
            builder.push(")");
        }
        Ok(())
    }

    fn push_where(
        &self,
        builder: &mut SqlBuilder,
        condition: Option<&Condition>,
    ) -> RepositoryResult<()> {
        if let Some(condition) = condition {
            builder.push(" WHERE ");
            self.push_condition(builder, condition)?;
        }
        Ok(())
    }
}

/// Everything needed to render one `SELECT`
pub(crate) struct Select<'a> {
    pub schema: &'static Schema,
    pub condition: Option<&'a Condition>,
    pub order: Vec<(&'a FieldPath, OrderDirection)>,
    pub tie_breakers: &'a [&'static str],
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

/// `SELECT "t0".* ... [WHERE] [ORDER BY] [LIMIT/OFFSET]`
///
/// Key columns in `tie_breakers` are appended ascending whenever at least
/// one order entry is present.
pub(crate) fn select(spec: &Select<'_>) -> RepositoryResult<SqlBuilder> {
    let mut plan = JoinPlan::new(spec.schema);
    if let Some(condition) = spec.condition {
        for path in condition.paths() {
            plan.add(path)?;
        }
    }
    for (path, _) in &spec.order {
        plan.add(path)?;
    }

    let mut builder = SqlBuilder::new(format!("SELECT {}.*", quote(ROOT_ALIAS)));
    plan.push_from(&mut builder);
    plan.push_where(&mut builder, spec.condition)?;

    if !spec.order.is_empty() {
        builder.push(" ORDER BY ");
        for (i, (path, direction)) in spec.order.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(plan.column(path)?);
            builder.push(" ");
            builder.push(direction.as_sql());
        }
        for column in spec.tie_breakers {
            builder.push(", ");
            builder.push(qualify(ROOT_ALIAS, column));
            builder.push(" ASC");
        }
    }

    match (spec.take, spec.skip) {
        (Some(take), skip) => {
            builder.push(" LIMIT ");
            builder.push_bind(to_i64(take));
            if let Some(skip) = skip {
                builder.push(" OFFSET ");
                builder.push_bind(to_i64(skip));
            }
        }
        (None, Some(skip)) => {
            builder.push(" LIMIT -1 OFFSET ");
            builder.push_bind(to_i64(skip));
        }
        (None, None) => {}
    }

    Ok(builder)
}

/// `SELECT COUNT(*) ... [WHERE]`
pub(crate) fn count(
    schema: &'static Schema,
    condition: Option<&Condition>,
) -> RepositoryResult<SqlBuilder> {
    let mut plan = JoinPlan::new(schema);
    if let Some(condition) = condition {
        for path in condition.paths() {
            plan.add(path)?;
        }
    }
    let mut builder = SqlBuilder::new("SELECT COUNT(*)");
    plan.push_from(&mut builder);
    plan.push_where(&mut builder, condition)?;
    Ok(builder)
}

/// Composite equality over the key columns
pub(crate) fn key_condition(key_names: &[&'static str], key: &Key) -> Condition {
    Condition::And(
        key_names
            .iter()
            .zip(key.values())
            .map(|(name, value)| Condition::Compare {
                left: Expr::column(name),
                operator: FilterOperator::Equal,
                right: Expr::Literal(value.clone()),
            })
            .collect(),
    )
}

/// `INSERT ... RETURNING *`
///
/// With a store-generated key, key columns holding NULL or zero are left
/// out so the store assigns them.
pub(crate) fn insert(schema: &'static Schema, values: Vec<(&'static str, Value)>) -> SqlBuilder {
    let values: Vec<(&'static str, Value)> = values
        .into_iter()
        .filter(|(column, value)| {
            !(schema.generated_key
                && schema.is_key_column(column)
                && matches!(value, Value::Null | Value::Integer(0)))
        })
        .collect();

    let mut builder = SqlBuilder::new("INSERT INTO ");
    builder.push(quote(schema.table));
    if values.is_empty() {
        builder.push(" DEFAULT VALUES");
    } else {
        builder.push(" (");
        for (i, (column, _)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(quote(column));
        }
        builder.push(") VALUES (");
        for (i, (_, value)) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, value);
        }
        builder.push(")");
    }
    builder.push(" RETURNING *");
    builder
}

fn push_key_where(builder: &mut SqlBuilder, key_names: &[&'static str], key: &Key) {
    builder.push(" WHERE ");
    for (i, (name, value)) in key_names.iter().zip(key.values()).enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        builder.push(quote(name));
        builder.push(" = ");
        push_value(builder, value);
    }
}

/// `UPDATE ... SET <non-key columns> WHERE <key> RETURNING *`
pub(crate) fn update(
    schema: &'static Schema,
    key_names: &[&'static str],
    key: &Key,
    values: Vec<(&'static str, Value)>,
) -> SqlBuilder {
    let mut builder = SqlBuilder::new("UPDATE ");
    builder.push(quote(schema.table));
    builder.push(" SET ");

    let assignments: Vec<_> = values
        .into_iter()
        .filter(|(column, _)| !key_names.contains(column))
        .collect();
    if assignments.is_empty() {
        // Nothing but key columns: a self-assignment keeps RETURNING working
        let first = key_names.first().copied().unwrap_or("rowid");
        builder.push(format!("{} = {}", quote(first), quote(first)));
    }
    for (i, (column, value)) in assignments.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(quote(column));
        builder.push(" = ");
        push_value(&mut builder, value);
    }

    push_key_where(&mut builder, key_names, key);
    builder.push(" RETURNING *");
    builder
}

/// `DELETE FROM ... WHERE <key>`
pub(crate) fn delete(schema: &'static Schema, key_names: &[&'static str], key: &Key) -> SqlBuilder {
    let mut builder = SqlBuilder::new("DELETE FROM ");
    builder.push(quote(schema.table));
    push_key_where(&mut builder, key_names, key);
    builder
}

/// `DELETE FROM ...` without a predicate
pub(crate) fn clear(schema: &'static Schema) -> SqlBuilder {
    SqlBuilder::new(format!("DELETE FROM {}", quote(schema.table)))
}

/// `SELECT * ... WHERE column IN (..) ORDER BY <key>` for eager loading
pub(crate) fn select_in(
    schema: &'static Schema,
    column: &str,
    values: &[Value],
    key_names: &[&'static str],
) -> SqlBuilder {
    let mut builder = SqlBuilder::new("SELECT * FROM ");
    builder.push(quote(schema.table));
    builder.push(" WHERE ");
    builder.push(quote(column));
    if values.is_empty() {
        builder.push(" IN (NULL)");
    } else {
        builder.push(" IN (");
        push_values(&mut builder, values);
        builder.push(")");
    }
    if !key_names.is_empty() {
        builder.push(" ORDER BY ");
        for (i, key) in key_names.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(quote(key));
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::field::SqlType;
    use crate::repository::filter::{Filter, FilterOperator};
    use crate::repository::fixtures::{Membership, Widget};
    use crate::repository::Entity;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    fn plain(schema: &'static Schema) -> Select<'static> {
        Select {
            schema,
            condition: None,
            order: Vec::new(),
            tie_breakers: &[],
            skip: None,
            take: None,
        }
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        assert_eq!(quote("name"), "\"name\"");
        assert_eq!(quote("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_select_all() {
        let sql = select(&plain(Widget::schema())).unwrap().into_sql();
        assert_eq!(sql, r#"SELECT "t0".* FROM "widgets" AS "t0""#);
    }

    #[test]
    fn test_select_with_join_filter_order_and_window() {
        let filter = Widget::CATEGORY
            .then(crate::repository::fixtures::Category::NAME)
            .eq("tools");
        let name = path("name");
        let spec = Select {
            schema: Widget::schema(),
            condition: Some(filter.condition()),
            order: vec![(&name, OrderDirection::Descending)],
            tie_breakers: &["id"],
            skip: Some(30),
            take: Some(15),
        };
        let sql = select(&spec).unwrap().into_sql();
        assert_eq!(
            sql,
            concat!(
                r#"SELECT "t0".* FROM "widgets" AS "t0" "#,
                r#"LEFT JOIN "categories" AS "j1" ON "j1"."id" = "t0"."category_id" "#,
                r#"WHERE "j1"."name" = ? "#,
                r#"ORDER BY "t0"."name" DESC, "t0"."id" ASC LIMIT ? OFFSET ?"#
            )
        );
    }

    #[test]
    fn test_same_navigation_joins_once() {
        let filter: Filter<Widget> =
            Filter::eq("category.name", "a").and(Filter::is_not_null("category.id"));
        let category_name = path("category.name");
        let spec = Select {
            order: vec![(&category_name, OrderDirection::Ascending)],
            condition: Some(filter.condition()),
            ..plain(Widget::schema())
        };
        let sql = select(&spec).unwrap().into_sql();
        assert_eq!(sql.matches("LEFT JOIN").count(), 1);
    }

    #[test]
    fn test_skip_without_take() {
        let spec = Select {
            skip: Some(5),
            ..plain(Widget::schema())
        };
        let sql = select(&spec).unwrap().into_sql();
        assert!(sql.ends_with("LIMIT -1 OFFSET ?"));
    }

    #[test]
    fn test_no_tie_breakers_without_order() {
        let spec = Select {
            tie_breakers: &["id"],
            ..plain(Widget::schema())
        };
        let sql = select(&spec).unwrap().into_sql();
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn test_unknown_path_fails_rendering() {
        let filter: Filter<Widget> = Filter::eq("colour", "red");
        let spec = Select {
            condition: Some(filter.condition()),
            ..plain(Widget::schema())
        };
        let Err(err) = select(&spec) else {
            panic!("rendering an unknown path should fail");
        };
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_null_equality_renders_is_null() {
        let missing: Filter<Widget> = Widget::CATEGORY_ID.eq(None::<i64>);
        let sql = count(Widget::schema(), Some(missing.condition()))
            .unwrap()
            .into_sql();
        assert!(sql.ends_with(r#"WHERE "t0"."category_id" IS NULL"#));

        let present: Filter<Widget> = Widget::CATEGORY_ID.ne(None::<i64>);
        let sql = count(Widget::schema(), Some(present.condition()))
            .unwrap()
            .into_sql();
        assert!(sql.ends_with(r#"WHERE "t0"."category_id" IS NOT NULL"#));

        let ordered: Filter<Widget> = Widget::RANK.gt(None::<i64>);
        let sql = count(Widget::schema(), Some(ordered.condition()))
            .unwrap()
            .into_sql();
        assert!(sql.ends_with(r#"WHERE "t0"."rank" > ?"#));
    }

    #[test]
    fn test_empty_junctions_and_lists() {
        let nothing: Filter<Widget> = Filter::is_in("id", Vec::<i64>::new());
        let sql = count(Widget::schema(), Some(nothing.condition())).unwrap().into_sql();
        assert!(sql.ends_with("WHERE 1 = 0"));

        let everything: Filter<Widget> = Filter::all(Vec::new());
        let sql = count(Widget::schema(), Some(everything.condition())).unwrap().into_sql();
        assert!(sql.ends_with("WHERE 1 = 1"));

        let none: Filter<Widget> = Filter::any(Vec::new());
        let sql = count(Widget::schema(), Some(none.condition())).unwrap().into_sql();
        assert!(sql.ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn test_cast_and_lower_render() {
        let filter: Filter<Widget> = Filter::expr(
            Widget::NAME.expr().lower(),
            FilterOperator::Equal,
            Expr::literal("bolt"),
        )
        .and(Filter::expr(
            Widget::RANK.expr().cast(SqlType::Text),
            FilterOperator::Like,
            Expr::literal("1%"),
        ));
        let sql = count(Widget::schema(), Some(filter.condition())).unwrap().into_sql();
        assert!(sql.contains(r#"lower("t0"."name") = ?"#));
        assert!(sql.contains(r#"CAST("t0"."rank" AS TEXT) LIKE ?"#));
    }

    #[test]
    fn test_insert_omits_generated_zero_key() {
        let sql = insert(Widget::schema(), Widget::new(0, "bolt").values()).into_sql();
        assert!(!sql.contains(r#""id""#));
        assert!(sql.starts_with(r#"INSERT INTO "widgets" ("#));
        assert!(sql.ends_with("RETURNING *"));

        let sql = insert(Widget::schema(), Widget::new(7, "bolt").values()).into_sql();
        assert!(sql.contains(r#""id""#));
    }

    #[test]
    fn test_insert_keeps_natural_key() {
        let membership = Membership {
            group_id: 0,
            user_id: 0,
            role: "member".into(),
        };
        let sql = insert(Membership::schema(), membership.values()).into_sql();
        assert!(sql.contains(r#""group_id", "user_id", "role""#));
    }

    #[test]
    fn test_update_sets_non_key_columns() {
        let widget = Widget::new(3, "nut");
        let key: Key = 3_i64.into();
        let sql = update(Widget::schema(), &["id"], &key, widget.values()).into_sql();
        assert!(sql.starts_with(r#"UPDATE "widgets" SET "#));
        assert!(!sql.contains(r#""id" = ?,"#));
        assert!(sql.ends_with(r#"WHERE "id" = ? RETURNING *"#));
    }

    #[test]
    fn test_delete_by_composite_key() {
        let key: Key = (1_i64, 2_i64).into();
        let sql = delete(Membership::schema(), &["group_id", "user_id"], &key).into_sql();
        assert_eq!(
            sql,
            r#"DELETE FROM "memberships" WHERE "group_id" = ? AND "user_id" = ?"#
        );
    }

    #[test]
    fn test_select_in_orders_by_key() {
        let sql = select_in(
            Widget::schema(),
            "category_id",
            &[Value::Integer(1)],
            &["id"],
        )
        .into_sql();
        assert_eq!(
            sql,
            r#"SELECT * FROM "widgets" WHERE "category_id" IN (?) ORDER BY "id""#
        );
    }
}
