//! PostgreSQL adapter built on `sqlx::QueryBuilder`.
//!
//! Column and table names come from [`Entity`] constants and condition fields are
//! `&'static str`, so only values are ever bound as parameters. Sort keys from requests
//! are checked against `Entity::SORTABLE` before they reach SQL.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{effective_sort_key, Entity, Patch, QueryResult, Repository, UpdateOutcome};
use crate::error::AppError;
use crate::filter::{ConditionSet, Predicate, Value};
use crate::pagination::PaginationRequest;

pub struct PgRepository<T> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for PgRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Text(s) => {
            builder.push_bind(s.clone());
        }
        Value::Uuid(id) => {
            builder.push_bind(*id);
        }
        Value::Timestamp(at) => {
            builder.push_bind(*at);
        }
        Value::Enum {
            type_name, label, ..
        } => {
            builder.push_bind(label.to_string());
            builder.push("::");
            builder.push(*type_name);
        }
        // Only nullable text columns take NULL.
        Value::Null => {
            builder.push_bind(None::<String>);
        }
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub(crate) fn push_where(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &str,
    conditions: &ConditionSet,
) {
    for (i, condition) in conditions.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        let column = format!("{}.{}", table, condition.field);
        match &condition.predicate {
            Predicate::Eq(value) => {
                builder.push(&column).push(" = ");
                push_value(builder, value);
            }
            Predicate::Contains(term) => {
                builder
                    .push(&column)
                    .push(" ILIKE ")
                    .push_bind(format!("%{}%", escape_like(term)));
            }
            Predicate::Range { lower, upper } => match (lower, upper) {
                (Some(lower), Some(upper)) => {
                    builder.push(&column).push(" BETWEEN ");
                    push_value(builder, lower);
                    builder.push(" AND ");
                    push_value(builder, upper);
                }
                (Some(lower), None) => {
                    builder.push(&column).push(" >= ");
                    push_value(builder, lower);
                }
                (None, Some(upper)) => {
                    builder.push(&column).push(" <= ");
                    push_value(builder, upper);
                }
                (None, None) => {
                    builder.push("TRUE");
                }
            },
        }
    }
}

fn projection<T: Entity>(relations: &[String]) -> String {
    let mut columns: Vec<String> = T::COLUMNS
        .iter()
        .map(|c| format!("{}.{}", T::TABLE, c))
        .collect();
    let mut loaded: Vec<&str> = Vec::new();
    for relation in relations {
        if loaded.contains(&relation.as_str()) {
            continue;
        }
        match T::relation(relation) {
            Some(sql) => {
                columns.push(sql.to_string());
                loaded.push(relation);
            }
            None => log::debug!("unknown relation {:?} on {} ignored", relation, T::TABLE),
        }
    }
    columns.join(", ")
}

pub(crate) fn build_count<T: Entity>(conditions: &ConditionSet) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    push_where(&mut builder, T::TABLE, conditions);
    builder
}

pub(crate) fn build_page<T: Entity>(
    conditions: &ConditionSet,
    relations: &[String],
    pagination: &PaginationRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        projection::<T>(relations),
        T::TABLE
    ));
    push_where(&mut builder, T::TABLE, conditions);

    let sort_key = effective_sort_key::<T>(&pagination.sort_key);
    builder.push(format!(
        " ORDER BY {}.{} {}",
        T::TABLE,
        sort_key,
        pagination.sort_direction.as_sql()
    ));

    if pagination.limit > 0 {
        builder
            .push(" LIMIT ")
            .push_bind(pagination.limit as i64)
            .push(" OFFSET ")
            .push_bind(pagination.skip as i64);
    }
    builder
}

pub(crate) fn build_update<T: Entity>(
    conditions: &ConditionSet,
    patch: &T::Patch,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
    for (column, value) in patch.assignments() {
        builder.push(column).push(" = ");
        push_value(&mut builder, &value);
        builder.push(", ");
    }
    builder.push("updated_at = NOW()");
    push_where(&mut builder, T::TABLE, conditions);
    builder
}

pub(crate) fn build_insert<T: Entity>(record: &T) -> QueryBuilder<'static, Postgres> {
    let values = record.values();
    let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        T::TABLE,
        columns.join(", ")
    ));
    for (i, (_, value)) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(format!(") RETURNING {}", T::COLUMNS.join(", ")));
    builder
}

#[async_trait]
impl<T> Repository<T> for PgRepository<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow>,
{
    async fn find_and_count(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
        pagination: &PaginationRequest,
    ) -> Result<QueryResult<T>, AppError> {
        let mut count_query = build_count::<T>(conditions);
        let mut page_query = build_page::<T>(conditions, relations, pagination);

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;
        let (total,): (i64,) = count_query.build_query_as().fetch_one(&mut *tx).await?;
        let items: Vec<T> = page_query.build_query_as().fetch_all(&mut *tx).await?;
        tx.commit().await?;

        Ok(QueryResult {
            items,
            total_count: total.max(0) as u64,
        })
    }

    async fn find_one(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
    ) -> Result<Option<T>, AppError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            projection::<T>(relations),
            T::TABLE
        ));
        push_where(&mut builder, T::TABLE, conditions);
        builder.push(" LIMIT 1");

        let row = builder.build_query_as().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn insert(&self, record: &T) -> Result<T, AppError> {
        let mut builder = build_insert(record);
        let row = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(row)
    }

    async fn update_by(
        &self,
        conditions: &ConditionSet,
        patch: &T::Patch,
    ) -> Result<UpdateOutcome<T>, AppError> {
        let mut update = build_update::<T>(conditions, patch);
        let mut reread = QueryBuilder::new(format!(
            "SELECT {} FROM {}",
            projection::<T>(&[]),
            T::TABLE
        ));
        push_where(&mut reread, T::TABLE, conditions);
        reread.push(" LIMIT 1");

        // Write and read-back share one transaction so the returned row is the one
        // this call produced.
        let mut tx = self.pool.begin().await?;
        let affected = update.build().execute(&mut *tx).await?.rows_affected();
        let updated_entity: Option<T> = reread.build_query_as().fetch_optional(&mut *tx).await?;
        tx.commit().await?;

        Ok(UpdateOutcome {
            updated_entity,
            matched: affected > 0,
        })
    }

    async fn delete_by(&self, conditions: &ConditionSet) -> Result<u64, AppError> {
        let mut builder = QueryBuilder::new(format!("DELETE FROM {}", T::TABLE));
        push_where(&mut builder, T::TABLE, conditions);
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
