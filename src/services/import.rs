//! Batch import of holdings from a spreadsheet CSV export
//!
//! Upserts Book, MarcRecord, Target and Curation rows keyed by the
//! unique registration code. The whole file runs in one transaction; a
//! dry run validates everything and rolls back.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    marc::{clean_isbn, clean_issn, first_subfield, split_multi},
    models::{book::UpsertBook, marc::MarcRecord},
    repository::Repository,
};

/// The one column every row must carry
const COL_REGISTRATION_NO: &str = "registration_no";

/// Counters reported after an import run
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub rows: u32,
    pub created_books: u32,
    pub updated_books: u32,
    pub created_marc: u32,
    pub updated_marc: u32,
    pub created_target_names: u32,
    pub created_targets: u32,
    pub created_curations: u32,
    pub dry_run: bool,
}

#[derive(Clone)]
pub struct ImportService {
    repository: Repository,
}

impl ImportService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Import a CSV file. With `dry_run` all writes are validated against
    /// the database and then rolled back.
    pub async fn import_csv(
        &self,
        path: &Path,
        dry_run: bool,
        default_location: &str,
    ) -> AppResult<ImportReport> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| AppError::BadRequest(format!("Cannot read CSV {}: {}", path.display(), e)))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::BadRequest(format!("Invalid CSV header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if !headers.iter().any(|h| h == COL_REGISTRATION_NO) {
            return Err(AppError::BadRequest(format!(
                "CSV header missing required column: {}",
                COL_REGISTRATION_NO
            )));
        }

        // Parse the whole file up front so a malformed row fails before
        // any database work starts
        let mut rows: Vec<HashMap<String, String>> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                AppError::BadRequest(format!("[line {}] invalid CSV row: {}", line + 2, e))
            })?;
            let row: HashMap<String, String> = headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect();
            rows.push(row);
        }

        let mut report = ImportReport {
            dry_run,
            ..Default::default()
        };

        let mut tx = self.repository.pool.begin().await?;

        for (i, row) in rows.iter().enumerate() {
            let line = i + 2;
            let cell = |key: &str| row.get(key).map(String::as_str).unwrap_or("").trim();
            let opt = |key: &str| {
                let v = cell(key);
                (!v.is_empty()).then(|| v.to_string())
            };

            let book_code = cell(COL_REGISTRATION_NO);
            if book_code.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "[line {}] '{}' is required",
                    line, COL_REGISTRATION_NO
                )));
            }

            let f020 = cell("020");
            let f020_set = cell("020_set");
            let f022 = cell("022");
            let f245 = cell("245");
            let f260 = cell("260");

            // ISBN: 020 $a, falling back to the set ISBN
            let isbn_raw = first_subfield(f020, "a")
                .or_else(|| first_subfield(f020_set, "a"))
                .or_else(|| (!f020_set.is_empty()).then(|| f020_set.to_string()));
            let isbn = isbn_raw.as_deref().and_then(clean_isbn);

            // ISSN: 022 $a, else try each piece of a multi-value cell
            let issn = first_subfield(f022, "a")
                .as_deref()
                .and_then(clean_issn)
                .or_else(|| {
                    split_multi(f022).iter().find_map(|piece| {
                        let cand = first_subfield(piece, "a").unwrap_or_else(|| piece.clone());
                        clean_issn(&cand)
                    })
                });

            let book = UpsertBook {
                book_code: book_code.to_string(),
                title: opt("title"),
                author: first_subfield(f245, "d"),
                publisher: first_subfield(f260, "b"),
                isbn,
                issn,
                callnumber: opt("090_callnumber"),
                location: Some(default_location.to_string()),
                edition: None,
                description: None,
                cover_url: opt("cover_url"),
            };

            let (book_id, created) = self
                .repository
                .books
                .upsert_by_code(&mut tx, &book)
                .await
                .map_err(|e| match e {
                    AppError::Database(_) | AppError::Conflict(_) => {
                        AppError::BadRequest(format!("[line {}] book upsert failed", line))
                    }
                    other => other,
                })?;

            if created {
                report.created_books += 1;
            } else {
                report.updated_books += 1;
            }

            let marc = MarcRecord {
                field_020: opt("020"),
                field_020_set: opt("020_set"),
                field_022: opt("022"),
                field_052: opt("052"),
                field_056: opt("056"),
                field_090: opt("090"),
                field_245: opt("245"),
                field_246_parallel: opt("246_parallel"),
                field_246_original: opt("246_original"),
                field_250: opt("250"),
                field_260: opt("260"),
                field_300: opt("300"),
                field_310: opt("310"),
                field_362: opt("362"),
                field_490: opt("490"),
                field_500: opt("500"),
                field_502: opt("502"),
                field_504: opt("504"),
                field_541: opt("541"),
                field_546: opt("546"),
                field_586: opt("586"),
                field_590: opt("590"),
                field_600: opt("600"),
                field_610: opt("610"),
                field_647: opt("647"),
                field_650: opt("650"),
                field_653: opt("653"),
                field_655: opt("655"),
                field_700: opt("700"),
                field_710: opt("710"),
                field_720: opt("720"),
                field_730: opt("730"),
                field_856: opt("856"),
                ..Default::default()
            };

            if self
                .repository
                .books
                .upsert_marc(&mut tx, book_id, &marc)
                .await?
            {
                report.created_marc += 1;
            } else {
                report.updated_marc += 1;
            }

            // Audience targets (521), multi-valued
            for target in split_multi(cell("521")) {
                let (target_name_id, name_created) = self
                    .repository
                    .books
                    .upsert_target_name(&mut tx, &target)
                    .await?;
                if name_created {
                    report.created_target_names += 1;
                }
                if self
                    .repository
                    .books
                    .upsert_target(&mut tx, book_id, target_name_id, &target)
                    .await?
                {
                    report.created_targets += 1;
                }
            }

            // Curation notes (500), multi-valued
            for note in split_multi(cell("500_curation")) {
                if self
                    .repository
                    .books
                    .upsert_curation(&mut tx, book_id, &note)
                    .await?
                {
                    report.created_curations += 1;
                }
            }

            report.rows += 1;
        }

        if dry_run {
            tx.rollback().await?;
            tracing::warn!("dry run: no changes applied");
        } else {
            tx.commit().await?;
        }

        tracing::info!(
            rows = report.rows,
            created_books = report.created_books,
            updated_books = report.updated_books,
            "import finished"
        );
        Ok(report)
    }
}
