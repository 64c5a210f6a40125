//! # Question Bulk Import
//!
//! Parses the semicolon-delimited flat question source. A malformed row is
//! skipped and counted, never an error for the whole file. Expected columns:
//!
//! `pergunta;opcoes;resposta_correta;tema;subtema;feedback;fonte;publico_alvo;canais`
//!
//! `opcoes`, `publico_alvo` and `canais` are pipe-delimited lists. The
//! `resposta_correta` cell is either a single letter (mapped by alphabetic
//! position into the option list) or the literal answer text, matched
//! case-insensitively.

use super::{join_list, split_list, Question, QuestionCache};
use crate::{errors::QuizError, store::Store};
use serde::Serialize;
use tracing::{info, warn};
use turso::params;

/// The outcome of a bulk import: partial success, not all-or-nothing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Resolves the correct-answer marker against the option list.
///
/// Returns the verbatim option text, or `None` when the marker resolves to
/// nothing (which rejects the row).
fn resolve_correct_answer(marker: &str, options: &[String]) -> Option<String> {
    let marker = marker.trim();
    if marker.is_empty() {
        return None;
    }

    // Single-letter form: 'a' selects the first option, 'b' the second, ...
    let mut chars = marker.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            let index = (letter.to_ascii_lowercase() as u8 - b'a') as usize;
            if let Some(option) = options.get(index) {
                return Some(option.clone());
            }
            // A letter that doesn't map to an option falls through to the
            // literal match: a one-letter option text is legal.
        }
    }

    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(marker))
        .cloned()
}

/// Parses the flat source into validated questions plus a skipped-row count.
pub fn parse_question_csv(data: &str) -> Result<(Vec<Question>, usize), QuizError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut questions = Vec::new();
    let mut skipped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let pergunta = cell(0);
        let opcoes = split_list(&cell(1));
        let marker = cell(2);
        // The audience cell must be present, even if empty (empty = all roles).
        let audience_present = record.get(7).is_some();

        if pergunta.is_empty() || opcoes.is_empty() || !audience_present {
            warn!(row = line + 1, "Skipping import row with missing fields.");
            skipped += 1;
            continue;
        }

        let Some(resposta_correta) = resolve_correct_answer(&marker, &opcoes) else {
            warn!(row = line + 1, "Skipping import row with unresolvable correct answer.");
            skipped += 1;
            continue;
        };

        questions.push(Question {
            id: 0,
            pergunta,
            opcoes,
            resposta_correta,
            tema: cell(3),
            subtema: cell(4),
            feedback: cell(5),
            fonte: cell(6),
            publico_alvo: split_list(&cell(7)),
            canais: split_list(&cell(8)),
        });
    }

    Ok((questions, skipped))
}

/// Parses and inserts a flat question file inside one transaction, then
/// invalidates the cache. Skipped rows are reported, not fatal.
pub async fn import_questions(
    store: &Store,
    cache: &QuestionCache,
    data: &str,
) -> Result<ImportReport, QuizError> {
    let (questions, skipped) = parse_question_csv(data)?;

    let conn = store.connect()?;
    conn.execute("BEGIN", ()).await?;
    let steps = async {
        for question in &questions {
            conn.execute(
                "INSERT INTO questions (pergunta, opcoes, resposta_correta, tema, subtema, \
                 feedback, fonte, publico_alvo, canais) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    question.pergunta.clone(),
                    join_list(&question.opcoes),
                    question.resposta_correta.clone(),
                    question.tema.clone(),
                    question.subtema.clone(),
                    question.feedback.clone(),
                    question.fonte.clone(),
                    join_list(&question.publico_alvo),
                    join_list(&question.canais)
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

    cache.invalidate().await;
    let report = ImportReport {
        imported: questions.len(),
        skipped,
    };
    info!(imported = report.imported, skipped = report.skipped, "Question import finished.");
    Ok(report)
}
