use crate::models::{CaseRow, NewCase};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SELECT_CASE: &str = "SELECT id, case_title, input_json, formal_letter, legal_arguments, \
     supporting_sections_json, relevant_documents_json, created_at FROM cases";

pub async fn insert_case(pool: &SqlitePool, case: &NewCase) -> anyhow::Result<String> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    sqlx::query(
        r#"
        INSERT INTO cases (id, case_title, input_json, formal_letter, legal_arguments,
                           supporting_sections_json, relevant_documents_json, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&id)
    .bind(&case.case_title)
    .bind(serde_json::to_string(&case.input)?)
    .bind(&case.formal_letter)
    .bind(&case.legal_arguments)
    .bind(serde_json::to_string(&case.supporting_sections)?)
    .bind(serde_json::to_string(&case.relevant_documents)?)
    .bind(case.created_at.to_rfc3339_opts(SecondsFormat::Micros, true))
    .execute(pool)
    .await
    .context("insert case")?;
    Ok(id)
}

pub async fn get_case(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<CaseRow>> {
    let row = sqlx::query(&format!("{SELECT_CASE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(|r| decode(&r)).transpose()
}

/// All cases, newest first.
pub async fn list_cases(pool: &SqlitePool) -> anyhow::Result<Vec<CaseRow>> {
    let rows = sqlx::query(&format!(
        "{SELECT_CASE} ORDER BY created_at DESC, rowid DESC"
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(decode).collect()
}

pub async fn delete_case(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM cases WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

fn decode(row: &SqliteRow) -> anyhow::Result<CaseRow> {
    let input: String = row.try_get("input_json")?;
    let sections: String = row.try_get("supporting_sections_json")?;
    let documents: String = row.try_get("relevant_documents_json")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(CaseRow {
        id: row.try_get("id")?,
        case_title: row.try_get("case_title")?,
        input: serde_json::from_str(&input).context("decode input_json")?,
        formal_letter: row.try_get("formal_letter")?,
        legal_arguments: row.try_get("legal_arguments")?,
        supporting_sections: serde_json::from_str(&sections)
            .context("decode supporting_sections_json")?,
        relevant_documents: serde_json::from_str(&documents)
            .context("decode relevant_documents_json")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .context("decode created_at")?
            .with_timezone(&Utc),
    })
}
