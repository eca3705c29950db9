//! In-process store for development and tests.
//!
//! Rows live in a `Vec` behind a `tokio` lock. Conditions are evaluated through
//! [`Entity::field`], so the same `ConditionSet` that drives the SQL adapter drives
//! this one. Relations are never populated here.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{effective_sort_key, Entity, Patch, QueryResult, Repository, UpdateOutcome};
use crate::error::AppError;
use crate::filter::ConditionSet;
use crate::pagination::{PaginationRequest, SortDirection};

pub struct MemoryRepository<T: Entity> {
    rows: RwLock<Vec<T>>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn with_rows(rows: Vec<T>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<T: Entity> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn matches<T: Entity>(row: &T, conditions: &ConditionSet) -> bool {
    conditions.matches(|field| row.field(field))
}

fn compare_by<T: Entity>(a: &T, b: &T, key: &str) -> Ordering {
    match (a.field(key), b.field(key)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// First unique column on which `candidate` collides with a row outside `skip`.
fn unique_conflict<T: Entity>(rows: &[T], candidate: &T, skip: &[usize]) -> Option<&'static str> {
    T::UNIQUE.iter().copied().find(|column| {
        let value = candidate.field(column);
        rows.iter()
            .enumerate()
            .filter(|(idx, _)| !skip.contains(idx))
            .any(|(_, row)| value.is_some() && row.field(column) == value)
    })
}

fn log_ignored_relations<T: Entity>(relations: &[String]) {
    for relation in relations {
        log::debug!("memory store does not load relation {:?} on {}", relation, T::TABLE);
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn find_and_count(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
        pagination: &PaginationRequest,
    ) -> Result<QueryResult<T>, AppError> {
        log_ignored_relations::<T>(relations);
        let rows = self.rows.read().await;

        let mut matching: Vec<&T> = rows.iter().filter(|r| matches(*r, conditions)).collect();
        let total_count = matching.len() as u64;

        let key = effective_sort_key::<T>(&pagination.sort_key);
        matching.sort_by(|a, b| {
            let ord = compare_by(*a, *b, key);
            match pagination.sort_direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let take = if pagination.limit == 0 {
            usize::MAX
        } else {
            pagination.limit as usize
        };
        let items = matching
            .into_iter()
            .skip(pagination.skip as usize)
            .take(take)
            .cloned()
            .collect();

        Ok(QueryResult { items, total_count })
    }

    async fn find_one(
        &self,
        conditions: &ConditionSet,
        relations: &[String],
    ) -> Result<Option<T>, AppError> {
        log_ignored_relations::<T>(relations);
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| matches(*r, conditions)).cloned())
    }

    async fn insert(&self, record: &T) -> Result<T, AppError> {
        let mut rows = self.rows.write().await;
        if let Some(column) = unique_conflict(&rows, record, &[]) {
            return Err(AppError::Conflict(format!(
                "duplicate value for {}.{}",
                T::TABLE,
                column
            )));
        }
        rows.push(record.clone());
        Ok(record.clone())
    }

    async fn update_by(
        &self,
        conditions: &ConditionSet,
        patch: &T::Patch,
    ) -> Result<UpdateOutcome<T>, AppError> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();

        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| matches(*r, conditions))
            .map(|(idx, _)| idx)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for &idx in &targets {
            let mut row = rows[idx].clone();
            patch.apply(&mut row);
            row.touch(now);
            if let Some(column) = unique_conflict(&rows, &row, &targets) {
                return Err(AppError::Conflict(format!(
                    "duplicate value for {}.{}",
                    T::TABLE,
                    column
                )));
            }
            updated.push((idx, row));
        }
        for (idx, row) in updated {
            rows[idx] = row;
        }

        let updated_entity = rows.iter().find(|r| matches(*r, conditions)).cloned();
        Ok(UpdateOutcome {
            updated_entity,
            matched: !targets.is_empty(),
        })
    }

    async fn delete_by(&self, conditions: &ConditionSet) -> Result<u64, AppError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !matches(r, conditions));
        Ok((before - rows.len()) as u64)
    }
}
