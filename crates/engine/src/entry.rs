//! The module contains the `Entry` type representing one expense or income.
//!
//! Expenses and income share the same shape; the sign of `amount` tells
//! them apart.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
}

/// The `(date, amount, category)` projection used for charting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: String,
    pub amount: f64,
    pub category: String,
}

impl From<Model> for Entry {
    fn from(entry: Model) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            amount: entry.amount,
            description: entry.description,
            category: entry.category,
        }
    }
}

impl From<(String, f64, String)> for HistoryPoint {
    fn from((date, amount, category): (String, f64, String)) -> Self {
        Self {
            date,
            amount,
            category,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub date: String,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub description: String,
    pub category: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
