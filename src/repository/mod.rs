//! Generic persistence layer.
//!
//! [`Repository`] is implemented once per store, not once per entity: [`PgRepository`]
//! talks to PostgreSQL through `sqlx`, [`MemoryRepository`] keeps rows in process for
//! development and tests. Entities describe themselves through [`Entity`] and their
//! partial updates through [`Patch`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::filter::{ConditionSet, Value};
use crate::pagination::PaginationRequest;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Items of one page plus the number of rows matching the conditions before skip/limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// Result of [`Repository::update_by`].
///
/// `matched` is false when no row satisfied the conditions; `updated_entity` is the row
/// re-read after the write, if any. Neither case is an error at this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome<T> {
    pub updated_entity: Option<T>,
    pub matched: bool,
}

/// A persisted record type.
pub trait Entity: Clone + Send + Sync + Unpin + 'static {
    /// Partial update applied by [`Repository::update_by`].
    type Patch: Patch<Self>;

    const TABLE: &'static str;
    /// Columns selected when reading a row, in `FromRow` order.
    const COLUMNS: &'static [&'static str];
    /// Columns a caller may sort by.
    const SORTABLE: &'static [&'static str];
    /// Columns whose values must be unique across rows.
    const UNIQUE: &'static [&'static str] = &[];

    /// Current value of a column, used by stores that evaluate conditions themselves.
    fn field(&self, name: &str) -> Option<Value>;

    /// Every column with its value, for inserts.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Records a modification time.
    fn touch(&mut self, at: DateTime<Utc>);

    /// SQL projection that loads the named relation as a JSON column, if the entity
    /// knows it.
    fn relation(_name: &str) -> Option<&'static str> {
        None
    }

    fn is_sortable(key: &str) -> bool {
        Self::SORTABLE.contains(&key)
    }
}

/// An explicit partial update: every field is either set or left alone.
pub trait Patch<T>: Send + Sync {
    /// Column assignments for the fields that are set, in a fixed order.
    fn assignments(&self) -> Vec<(&'static str, Value)>;

    /// Applies the set fields to an in-memory record in the same order.
    fn apply(&self, target: &mut T);

    fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Counts rows matching `conditions` and fetches one sorted page of them.
    ///
    /// Count and page come from the same snapshot. Unknown relations are ignored and an
    /// unsortable key falls back to `created_at`.
    async fn find_and_count(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
        pagination: &PaginationRequest,
    ) -> Result<QueryResult<T>, AppError>;

    async fn find_one(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
    ) -> Result<Option<T>, AppError>;

    async fn insert(&self, record: &T) -> Result<T, AppError>;

    /// Applies `patch` to every row matching `conditions`, then re-reads with the same
    /// conditions. Both steps run atomically.
    async fn update_by(
        &self,
        conditions: &ConditionSet,
        patch: &T::Patch,
    ) -> Result<UpdateOutcome<T>, AppError>;

    /// Deletes every row matching `conditions`, returning how many were removed.
    async fn delete_by(&self, conditions: &ConditionSet) -> Result<u64, AppError>;
}

/// Sort key actually used for `T`: the requested one if it's sortable, else `created_at`.
pub(crate) fn effective_sort_key<'a, T: Entity>(requested: &'a str) -> &'a str {
    if T::is_sortable(requested) {
        requested
    } else {
        log::warn!(
            "ignoring unsortable key {:?} for {}, using created_at",
            requested,
            T::TABLE
        );
        "created_at"
    }
}
