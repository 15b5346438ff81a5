// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD and listing queries.

use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use smsrelay_core::{
    ChatId, Message, MessageDraft, MessageFilter, MessageId, MessageStatus, SmsRelayError,
    SortOrder, UserMetadata,
};

use crate::database::{Database, map_tr_err};

const COLUMNS: &str = "id, chat_id, phone, app, body, user_data, message_type, status, mode, created_at, updated_at";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Insert a draft, assigning a fresh id and both timestamps.
pub async fn insert_message(db: &Database, draft: MessageDraft) -> Result<Message, SmsRelayError> {
    let user_json = serde_json::to_string(&draft.user).map_err(|e| SmsRelayError::Storage {
        source: Box::new(e),
    })?;
    let timestamp = now();
    let message = Message {
        id: MessageId(uuid::Uuid::new_v4().to_string()),
        chat_id: draft.chat_id,
        phone: draft.phone,
        app: draft.app,
        text: draft.text,
        user: draft.user,
        message_type: draft.message_type,
        status: draft.status,
        mode: draft.mode,
        created_at: timestamp.clone(),
        updated_at: timestamp,
    };

    let row = message.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (id, chat_id, phone, app, body, user_data, message_type, status, mode, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    row.id.0,
                    row.chat_id.0,
                    row.phone,
                    row.app,
                    row.text,
                    user_json,
                    row.message_type.to_string(),
                    row.status.to_string(),
                    row.mode.to_string(),
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(message)
}

/// Fetch a message by id.
pub async fn get_message(db: &Database, id: &MessageId) -> Result<Option<Message>, SmsRelayError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite the status and refresh `updated_at`. Returns the updated row,
/// or `None` if no message has that id.
pub async fn update_status(
    db: &Database,
    id: &MessageId,
    status: MessageStatus,
) -> Result<Option<Message>, SmsRelayError> {
    let id = id.0.clone();
    let updated_at = now();
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE messages SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.to_string(), updated_at, id],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let message = tx.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )?;
            tx.commit()?;
            Ok(Some(message))
        })
        .await
        .map_err(map_tr_err)
}

/// One page of messages matching `filter`.
pub async fn find_messages(
    db: &Database,
    filter: &MessageFilter,
    sort: SortOrder,
    skip: u64,
    limit: u32,
) -> Result<Vec<Message>, SmsRelayError> {
    let (where_clause, mut values) = filter_clause(filter);
    let direction = match sort {
        SortOrder::NewestFirst => "DESC",
        SortOrder::OldestFirst => "ASC",
    };
    let sql = format!(
        "SELECT {COLUMNS} FROM messages{where_clause}
         ORDER BY created_at {direction}, rowid {direction}
         LIMIT ? OFFSET ?"
    );
    values.push(Value::Integer(i64::from(limit)));
    values.push(Value::Integer(i64::try_from(skip).unwrap_or(i64::MAX)));

    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), row_to_message)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of messages matching `filter`.
pub async fn count_messages(db: &Database, filter: &MessageFilter) -> Result<u64, SmsRelayError> {
    let (where_clause, values) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM messages{where_clause}");

    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Build a `WHERE` clause (with leading space) and its positional values.
///
/// Text filters are case-insensitive substring matches, folded with full
/// Unicode rules on both sides; the rest are exact.
fn filter_clause(filter: &MessageFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(message_type) = filter.message_type {
        conditions.push("message_type = ?");
        values.push(Value::Text(message_type.to_string()));
    }
    if let Some(status) = filter.status {
        conditions.push("status = ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(phone) = &filter.phone {
        conditions.push("instr(unicode_lower(phone), ?) > 0");
        values.push(Value::Text(phone.to_lowercase()));
    }
    if let Some(app) = &filter.app {
        conditions.push("instr(unicode_lower(app), ?) > 0");
        values.push(Value::Text(app.to_lowercase()));
    }
    if let Some(chat_id) = &filter.chat_id {
        conditions.push("chat_id = ?");
        values.push(Value::Text(chat_id.0.clone()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn row_to_message(row: &Row<'_>) -> Result<Message, rusqlite::Error> {
    let user_json: String = row.get(5)?;
    let user = serde_json::from_str::<UserMetadata>(&user_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Message {
        id: MessageId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        phone: row.get(2)?,
        app: row.get(3)?,
        text: row.get(4)?,
        user,
        message_type: parse_column(row, 6)?,
        status: parse_column(row, 7)?,
        mode: parse_column(row, 8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
