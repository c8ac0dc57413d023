use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{EngineError, Entry, HistoryPoint, ResultEngine, amount::parse_amount, entry};

use super::{Engine, with_db};

impl Engine {
    /// Store a new entry and return the id assigned by the database.
    pub async fn add_entry(
        &self,
        date: &str,
        amount: &str,
        description: &str,
        category: &str,
    ) -> ResultEngine<i64> {
        if date.is_empty() {
            return Err(EngineError::MissingDate);
        }
        let amount = parse_amount(amount)?;

        let active = entry::ActiveModel {
            id: ActiveValue::NotSet,
            date: ActiveValue::Set(date.to_string()),
            amount: ActiveValue::Set(amount),
            description: ActiveValue::Set(description.to_string()),
            category: ActiveValue::Set(category.to_string()),
        };

        let id = with_db!(self, |db| {
            let res = entry::Entity::insert(active).exec(&db).await?;
            Ok(res.last_insert_id)
        })?;
        tracing::debug!("added entry {id}");
        Ok(id)
    }

    /// All entries in insertion order.
    pub async fn entries(&self) -> ResultEngine<Vec<Entry>> {
        with_db!(self, |db| {
            let models = entry::Entity::find()
                .order_by_asc(entry::Column::Id)
                .all(&db)
                .await?;
            Ok(models.into_iter().map(Entry::from).collect())
        })
    }

    /// Look up a single entry.
    pub async fn entry(&self, id: i64) -> ResultEngine<Option<Entry>> {
        with_db!(self, |db| {
            Ok(entry::Entity::find_by_id(id).one(&db).await?.map(Entry::from))
        })
    }

    /// The `(date, amount, category)` of every entry, in insertion order.
    pub async fn history(&self) -> ResultEngine<Vec<HistoryPoint>> {
        with_db!(self, |db| {
            let rows: Vec<(String, f64, String)> = entry::Entity::find()
                .select_only()
                .column(entry::Column::Date)
                .column(entry::Column::Amount)
                .column(entry::Column::Category)
                .order_by_asc(entry::Column::Id)
                .into_tuple()
                .all(&db)
                .await?;
            Ok(rows.into_iter().map(HistoryPoint::from).collect())
        })
    }

    /// Replace every mutable field of entry `id`.
    ///
    /// An unknown id is not an error: nothing is written and the call
    /// succeeds.
    pub async fn update_entry(
        &self,
        id: i64,
        date: &str,
        amount: &str,
        description: &str,
        category: &str,
    ) -> ResultEngine<()> {
        let amount = parse_amount(amount)?;

        let updated = with_db!(self, |db| {
            let res = entry::Entity::update_many()
                .col_expr(entry::Column::Date, Expr::value(date))
                .col_expr(entry::Column::Amount, Expr::value(amount))
                .col_expr(entry::Column::Description, Expr::value(description))
                .col_expr(entry::Column::Category, Expr::value(category))
                .filter(entry::Column::Id.eq(id))
                .exec(&db)
                .await?;
            Ok(res.rows_affected)
        })?;
        if updated == 0 {
            tracing::debug!("update of missing entry {id} ignored");
        }
        Ok(())
    }

    /// Remove entry `id`. An unknown id is a no-op.
    pub async fn delete_entry(&self, id: i64) -> ResultEngine<()> {
        let deleted = with_db!(self, |db| {
            let res = entry::Entity::delete_by_id(id).exec(&db).await?;
            Ok(res.rows_affected)
        })?;
        if deleted == 0 {
            tracing::debug!("delete of missing entry {id} ignored");
        }
        Ok(())
    }
}
