use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_condition, parse_datetime, parse_parameter},
    models::{NewNotification, Notification},
};
use crate::models::{NotificationId, UserId};

const SELECT_COLUMNS: &str =
    "SELECT id, owner_id, parameter, condition, threshold, created_at FROM notifications";

fn row_to_notification(row: &Row) -> Result<Notification> {
    let parameter: String = row.get("parameter")?;
    let condition: String = row.get("condition")?;
    let created_at: String = row.get("created_at")?;

    Ok(Notification {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        parameter: parse_parameter(&parameter)?,
        condition: parse_condition(&condition)?,
        threshold: row.get("threshold")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn insert_notification(&self, notification: &NewNotification) -> Result<NotificationId> {
        let record = notification.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO notifications (owner_id, parameter, condition, threshold, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.owner_id,
                    record.parameter.as_str(),
                    record.condition.as_str(),
                    record.threshold,
                    record.created_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert notification")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Notifications of one owner in creation order, so list numbering is stable.
    pub async fn get_notifications_for_owner(&self, owner_id: UserId) -> Result<Vec<Notification>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY id ASC"
            ))?;

            let mut rows = stmt.query(params![owner_id])?;
            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                notifications.push(row_to_notification(row)?);
            }

            Ok(notifications)
        })
        .await
    }

    pub async fn get_all_notifications(&self) -> Result<Vec<Notification>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;

            let mut rows = stmt.query([])?;
            let mut notifications = Vec::new();
            while let Some(row) = rows.next()? {
                notifications.push(row_to_notification(row)?);
            }

            Ok(notifications)
        })
        .await
    }

    /// Delete a notification only if `owner_id` owns it.
    ///
    /// The ownership check and the delete share one transaction. Returns
    /// `false` for unknown ids and for ids owned by someone else.
    pub async fn delete_owned_notification(
        &self,
        owner_id: UserId,
        notification_id: NotificationId,
    ) -> Result<bool> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            let owned: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM notifications WHERE id = ?1 AND owner_id = ?2",
                    params![notification_id, owner_id],
                    |row| row.get(0),
                )
                .optional()?;

            if owned.is_none() {
                return Ok(false);
            }

            let rows_affected = tx.execute(
                "DELETE FROM notifications WHERE owner_id = ?1 AND id = ?2",
                params![owner_id, notification_id],
            )?;
            tx.commit().context("failed to commit notification delete")?;

            Ok(rows_affected > 0)
        })
        .await
    }
}
