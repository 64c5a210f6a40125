//! # Knowledge Pills
//!
//! Short educational messages broadcast on a rotation to a role/channel
//! filtered user subset. The rotation picks the row with the oldest (or
//! missing) last-sent timestamp. Business outcomes ("disabled", "no content",
//! "no recipients") are reported as values, not errors, so both the timer and
//! the manual trigger can log them without crashing.

use crate::{
    errors::QuizError,
    notify::{self, Notifier},
    questions::{join_list, split_list},
    settings::{self, SettingKey},
    store::{int_at, now_timestamp, opt_int_at, opt_text_at, text_at, Store},
    users,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turso::params;

/// A knowledge pill. Empty `cargos`/`canais` lists mean unrestricted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pill {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub cargos: Vec<String>,
    #[serde(default)]
    pub canais: Vec<String>,
    #[serde(default)]
    pub tema: String,
    pub conteudo: String,
    #[serde(default)]
    pub arquivo_origem: String,
    #[serde(default)]
    pub pagina: Option<i64>,
    #[serde(default)]
    pub telegram_file_id: Option<String>,
    #[serde(default)]
    pub last_sent_at: Option<String>,
}

const PILL_COLUMNS: &str =
    "id, cargos, canais, tema, conteudo, arquivo_origem, pagina, telegram_file_id, last_sent_at";

fn row_to_pill(row: &turso::Row) -> Result<Pill, QuizError> {
    Ok(Pill {
        id: int_at(row, 0)?,
        cargos: split_list(&text_at(row, 1)?),
        canais: split_list(&text_at(row, 2)?),
        tema: text_at(row, 3)?,
        conteudo: text_at(row, 4)?,
        arquivo_origem: text_at(row, 5)?,
        pagina: opt_int_at(row, 6)?,
        telegram_file_id: opt_text_at(row, 7)?,
        last_sent_at: opt_text_at(row, 8)?,
    })
}

pub async fn list_pills(store: &Store) -> Result<Vec<Pill>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(&format!("SELECT {PILL_COLUMNS} FROM pills ORDER BY id"), ())
        .await?;
    let mut pills = Vec::new();
    while let Some(row) = rows.next().await? {
        pills.push(row_to_pill(&row)?);
    }
    Ok(pills)
}

pub async fn insert_pill(store: &Store, pill: &Pill) -> Result<i64, QuizError> {
    if pill.conteudo.trim().is_empty() {
        return Err(QuizError::Validation("conteudo is required".to_string()));
    }
    let conn = store.connect()?;
    conn.execute(
        "INSERT INTO pills (cargos, canais, tema, conteudo, arquivo_origem, pagina, \
         telegram_file_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            join_list(&pill.cargos),
            join_list(&pill.canais),
            pill.tema.clone(),
            pill.conteudo.clone(),
            pill.arquivo_origem.clone(),
            pill.pagina,
            pill.telegram_file_id.clone()
        ],
    )
    .await?;
    crate::store::last_insert_rowid(&conn).await
}

pub async fn update_pill(store: &Store, id: i64, pill: &Pill) -> Result<(), QuizError> {
    if pill.conteudo.trim().is_empty() {
        return Err(QuizError::Validation("conteudo is required".to_string()));
    }
    let conn = store.connect()?;
    let changed = conn
        .execute(
            "UPDATE pills SET cargos = ?, canais = ?, tema = ?, conteudo = ?, \
             arquivo_origem = ?, pagina = ?, telegram_file_id = ? WHERE id = ?",
            params![
                join_list(&pill.cargos),
                join_list(&pill.canais),
                pill.tema.clone(),
                pill.conteudo.clone(),
                pill.arquivo_origem.clone(),
                pill.pagina,
                pill.telegram_file_id.clone(),
                id
            ],
        )
        .await?;
    if changed == 0 {
        return Err(QuizError::NotFound(format!("pill {id}")));
    }
    Ok(())
}

pub async fn delete_pill(store: &Store, id: i64) -> Result<(), QuizError> {
    let conn = store.connect()?;
    let changed = conn
        .execute("DELETE FROM pills WHERE id = ?", params![id])
        .await?;
    if changed == 0 {
        return Err(QuizError::NotFound(format!("pill {id}")));
    }
    Ok(())
}

/// The outcome of a bulk pill import.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PillImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Parses a semicolon-delimited pill file:
/// `cargos;canais;tema;conteudo;arquivo_origem;pagina`.
/// Rows without content are skipped, not fatal.
pub fn parse_pill_csv(data: &str) -> Result<(Vec<Pill>, usize), QuizError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut pills = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
        let conteudo = cell(3);
        if conteudo.is_empty() {
            warn!(row = line + 1, "Skipping pill import row without content.");
            skipped += 1;
            continue;
        }
        pills.push(Pill {
            id: 0,
            cargos: split_list(&cell(0)),
            canais: split_list(&cell(1)),
            tema: cell(2),
            conteudo,
            arquivo_origem: cell(4),
            pagina: cell(5).parse::<i64>().ok(),
            telegram_file_id: None,
            last_sent_at: None,
        });
    }
    Ok((pills, skipped))
}

pub async fn import_pills(store: &Store, data: &str) -> Result<PillImportReport, QuizError> {
    let (pills, skipped) = parse_pill_csv(data)?;
    let conn = store.connect()?;
    conn.execute("BEGIN", ()).await?;
    let steps = async {
        for pill in &pills {
            conn.execute(
                "INSERT INTO pills (cargos, canais, tema, conteudo, arquivo_origem, pagina) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    join_list(&pill.cargos),
                    join_list(&pill.canais),
                    pill.tema.clone(),
                    pill.conteudo.clone(),
                    pill.arquivo_origem.clone(),
                    pill.pagina
                ],
            )
            .await?;
        }
        Ok::<(), QuizError>(())
    };
    match steps.await {
        Ok(()) => conn.execute("COMMIT", ()).await?,
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(e);
        }
    };
    Ok(PillImportReport {
        imported: pills.len(),
        skipped,
    })
}

/// The structured outcome of one send attempt, for logging and for the
/// manual-trigger endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PillOutcome {
    pub sent: bool,
    pub pill_id: Option<i64>,
    pub recipients: usize,
    pub failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Picks the least-recently-sent pill: NULL timestamps first, then oldest.
async fn next_pill(store: &Store) -> Result<Option<Pill>, QuizError> {
    let conn = store.connect()?;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {PILL_COLUMNS} FROM pills \
                 ORDER BY CASE WHEN last_sent_at IS NULL THEN 0 ELSE 1 END, \
                 last_sent_at ASC, id ASC LIMIT 1"
            ),
            (),
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_pill(&row)?)),
        None => Ok(None),
    }
}

async fn mark_sent(store: &Store, pill_id: i64) -> Result<(), QuizError> {
    let conn = store.connect()?;
    conn.execute(
        "UPDATE pills SET last_sent_at = ? WHERE id = ?",
        params![now_timestamp(), pill_id],
    )
    .await?;
    Ok(())
}

/// Formats the broadcast text for a pill.
fn pill_message(pill: &Pill) -> String {
    let mut text = String::new();
    if !pill.tema.is_empty() {
        text.push_str(&format!("💊 {}\n\n", pill.tema));
    }
    text.push_str(&pill.conteudo);
    if !pill.arquivo_origem.is_empty() {
        match pill.pagina {
            Some(page) => text.push_str(&format!("\n\nFonte: {} (pág. {page})", pill.arquivo_origem)),
            None => text.push_str(&format!("\n\nFonte: {}", pill.arquivo_origem)),
        }
    }
    text
}

/// Sends the next pill in the rotation. Used by both the scheduler tick and
/// the manual "send now" admin endpoint.
pub async fn send_next_pill(
    store: &Store,
    notifier: &dyn Notifier,
) -> Result<PillOutcome, QuizError> {
    if !settings::get_bool(store, SettingKey::PillsEnabled).await? {
        return Ok(PillOutcome {
            sent: false,
            pill_id: None,
            recipients: 0,
            failures: 0,
            reason: Some("disabled".to_string()),
        });
    }

    let Some(pill) = next_pill(store).await? else {
        return Ok(PillOutcome {
            sent: false,
            pill_id: None,
            recipients: 0,
            failures: 0,
            reason: Some("no content".to_string()),
        });
    };

    let recipients = users::list_recipient_ids(store, &pill.cargos, &pill.canais).await?;
    if recipients.is_empty() {
        // Still rotate the pill forward so one untargetable row can't block
        // the queue head.
        mark_sent(store, pill.id).await?;
        info!(pill_id = pill.id, "Pill had no eligible recipients; rotated anyway.");
        return Ok(PillOutcome {
            sent: true,
            pill_id: Some(pill.id),
            recipients: 0,
            failures: 0,
            reason: Some("no eligible recipients".to_string()),
        });
    }

    let text = pill_message(&pill);
    let file_id = pill.telegram_file_id.clone();
    let tally = notify::broadcast(&recipients, |chat_id| {
        let text = text.clone();
        let file_id = file_id.clone();
        async move {
            match &file_id {
                Some(file_id) => notifier.send_document(&chat_id, file_id, &text).await,
                None => notifier.send_text(&chat_id, &text).await,
            }
        }
    })
    .await;

    mark_sent(store, pill.id).await?;
    info!(
        pill_id = pill.id,
        delivered = tally.delivered,
        failed = tally.failed,
        "Pill broadcast finished."
    );

    Ok(PillOutcome {
        sent: true,
        pill_id: Some(pill.id),
        recipients: tally.delivered,
        failures: tally.failed,
        reason: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pill_message_formats_source_and_page() {
        let pill = Pill {
            id: 1,
            cargos: vec![],
            canais: vec![],
            tema: "Planos".to_string(),
            conteudo: "O plano X inclui 20GB.".to_string(),
            arquivo_origem: "catalogo.pdf".to_string(),
            pagina: Some(12),
            telegram_file_id: None,
            last_sent_at: None,
        };
        let text = pill_message(&pill);
        assert!(text.contains("Planos"));
        assert!(text.contains("O plano X inclui 20GB."));
        assert!(text.contains("catalogo.pdf"));
        assert!(text.contains("12"));
    }

    #[test]
    fn test_parse_pill_csv_skips_empty_content() {
        let data = "cargos;canais;tema;conteudo;arquivo_origem;pagina\n\
                    Vendedor;Varejo;Planos;Conteudo valido;doc.pdf;3\n\
                    Vendedor;Varejo;Planos;;doc.pdf;4\n";
        let (pills, skipped) = parse_pill_csv(data).unwrap();
        assert_eq!(pills.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(pills[0].pagina, Some(3));
        assert_eq!(pills[0].cargos, vec!["Vendedor".to_string()]);
    }
}
