//! Books repository: catalog queries, likes and MARC/import upserts

use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookPage, BookQuery, BookSummary, UpsertBook},
        marc::MarcRecord,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book by registration code
    pub async fn get_by_code(&self, code: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE book_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No book with code {}", code)))
    }

    /// Book detail with MARC JSON and social counters
    pub async fn get_details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.get_by_id(id).await?;

        let marc: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT data FROM marc_records WHERE book_id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let row = sqlx::query(
            r#"
            SELECT (SELECT COUNT(*) FROM book_likes WHERE book_id = $1) as like_count,
                   (SELECT COUNT(*) FROM reviews WHERE book_id = $1) as review_count
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BookDetails {
            book,
            marc,
            like_count: row.get("like_count"),
            review_count: row.get("review_count"),
        })
    }

    /// Search the catalog with pagination.
    ///
    /// The term matches the registration code and ISBN exactly, titles and
    /// authors as substrings and publishers as a prefix.
    pub async fn search(&self, query: &BookQuery) -> AppResult<BookPage> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let term = query.q.as_deref().unwrap_or("").trim();
        let pattern = format!("%{}%", term);
        let prefix = format!("{}%", term);

        let where_clause = r#"
            ($1 = '' OR book_code = $1 OR isbn = $1
             OR title ILIKE $2 OR author ILIKE $2 OR publisher ILIKE $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM books WHERE {}",
            where_clause
        ))
        .bind(term)
        .bind(&pattern)
        .bind(&prefix)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, BookSummary>(&format!(
            r#"
            SELECT id, book_code, title, author, publisher, status, cover_url
            FROM books WHERE {}
            ORDER BY title NULLS LAST, id
            LIMIT $4 OFFSET $5
            "#,
            where_clause
        ))
        .bind(term)
        .bind(&pattern)
        .bind(&prefix)
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.pool)
        .await?;

        Ok(BookPage {
            items,
            total,
            page,
            per_page,
        })
    }

    /// Create a catalog entry
    pub async fn create(&self, book: &UpsertBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (book_code, title, author, publisher, isbn, issn,
                               callnumber, location, edition, description, cover_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'AVAILABLE')
            RETURNING *
            "#,
        )
        .bind(&book.book_code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.isbn)
        .bind(&book.issn)
        .bind(&book.callnumber)
        .bind(&book.location)
        .bind(&book.edition)
        .bind(&book.description)
        .bind(&book.cover_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Update a catalog entry (status is not touched here)
    pub async fn update(&self, id: i32, book: &UpsertBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET book_code = $1, title = $2, author = $3, publisher = $4,
                             isbn = $5, issn = $6, callnumber = $7, location = $8,
                             edition = $9, description = $10, cover_url = $11
            WHERE id = $12
            RETURNING *
            "#,
        )
        .bind(&book.book_code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.isbn)
        .bind(&book.issn)
        .bind(&book.callnumber)
        .bind(&book.location)
        .bind(&book.edition)
        .bind(&book.description)
        .bind(&book.cover_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a catalog entry
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Toggle a user's like on a book. Returns true when the like was
    /// added, false when it was removed.
    pub async fn toggle_like(&self, user_id: i32, book_id: i32) -> AppResult<bool> {
        // Ensure the book exists so a missing id maps to 404
        self.get_by_id(book_id).await?;

        let removed = sqlx::query(
            "DELETE FROM book_likes WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO book_likes (user_id, book_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Books liked by a user
    pub async fn liked_by_user(&self, user_id: i32) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.book_code, b.title, b.author, b.publisher, b.status, b.cover_url
            FROM books b
            JOIN book_likes l ON l.book_id = b.id
            WHERE l.user_id = $1
            ORDER BY b.title NULLS LAST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    // ---- Import-path upserts (all run inside the caller's transaction) ----

    /// Upsert a book by registration code. Returns (id, created).
    pub async fn upsert_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book: &UpsertBook,
    ) -> AppResult<(i32, bool)> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (book_code, title, author, publisher, isbn, issn,
                               callnumber, location, edition, description, cover_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'AVAILABLE')
            ON CONFLICT (book_code) DO UPDATE SET
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                publisher = EXCLUDED.publisher,
                isbn = EXCLUDED.isbn,
                issn = EXCLUDED.issn,
                callnumber = EXCLUDED.callnumber,
                location = EXCLUDED.location,
                cover_url = EXCLUDED.cover_url
            RETURNING id, (xmax = 0) as created
            "#,
        )
        .bind(&book.book_code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.isbn)
        .bind(&book.issn)
        .bind(&book.callnumber)
        .bind(&book.location)
        .bind(&book.edition)
        .bind(&book.description)
        .bind(&book.cover_url)
        .fetch_one(&mut **tx)
        .await?;

        Ok((row.get("id"), row.get("created")))
    }

    /// Upsert the MARC record for a book, rebuilding the derived JSON.
    /// Returns true when a new record was created.
    pub async fn upsert_marc(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        record: &MarcRecord,
    ) -> AppResult<bool> {
        let data = record.build_json();

        let row = sqlx::query(
            r#"
            INSERT INTO marc_records (
                book_id, data,
                field_020, field_020_set, field_022, field_052, field_056, field_090,
                field_245, field_246_parallel, field_246_original, field_250,
                field_260, field_300, field_310, field_362, field_490,
                field_500, field_502, field_504, field_541, field_546, field_586, field_590,
                field_600, field_610, field_647, field_650, field_653, field_655,
                field_700, field_710, field_720, field_730, field_856
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                    $31, $32, $33, $34, $35)
            ON CONFLICT (book_id) DO UPDATE SET
                data = EXCLUDED.data,
                field_020 = EXCLUDED.field_020,
                field_020_set = EXCLUDED.field_020_set,
                field_022 = EXCLUDED.field_022,
                field_052 = EXCLUDED.field_052,
                field_056 = EXCLUDED.field_056,
                field_090 = EXCLUDED.field_090,
                field_245 = EXCLUDED.field_245,
                field_246_parallel = EXCLUDED.field_246_parallel,
                field_246_original = EXCLUDED.field_246_original,
                field_250 = EXCLUDED.field_250,
                field_260 = EXCLUDED.field_260,
                field_300 = EXCLUDED.field_300,
                field_310 = EXCLUDED.field_310,
                field_362 = EXCLUDED.field_362,
                field_490 = EXCLUDED.field_490,
                field_500 = EXCLUDED.field_500,
                field_502 = EXCLUDED.field_502,
                field_504 = EXCLUDED.field_504,
                field_541 = EXCLUDED.field_541,
                field_546 = EXCLUDED.field_546,
                field_586 = EXCLUDED.field_586,
                field_590 = EXCLUDED.field_590,
                field_600 = EXCLUDED.field_600,
                field_610 = EXCLUDED.field_610,
                field_647 = EXCLUDED.field_647,
                field_650 = EXCLUDED.field_650,
                field_653 = EXCLUDED.field_653,
                field_655 = EXCLUDED.field_655,
                field_700 = EXCLUDED.field_700,
                field_710 = EXCLUDED.field_710,
                field_720 = EXCLUDED.field_720,
                field_730 = EXCLUDED.field_730,
                field_856 = EXCLUDED.field_856
            RETURNING (xmax = 0) as created
            "#,
        )
        .bind(book_id)
        .bind(&data)
        .bind(&record.field_020)
        .bind(&record.field_020_set)
        .bind(&record.field_022)
        .bind(&record.field_052)
        .bind(&record.field_056)
        .bind(&record.field_090)
        .bind(&record.field_245)
        .bind(&record.field_246_parallel)
        .bind(&record.field_246_original)
        .bind(&record.field_250)
        .bind(&record.field_260)
        .bind(&record.field_300)
        .bind(&record.field_310)
        .bind(&record.field_362)
        .bind(&record.field_490)
        .bind(&record.field_500)
        .bind(&record.field_502)
        .bind(&record.field_504)
        .bind(&record.field_541)
        .bind(&record.field_546)
        .bind(&record.field_586)
        .bind(&record.field_590)
        .bind(&record.field_600)
        .bind(&record.field_610)
        .bind(&record.field_647)
        .bind(&record.field_650)
        .bind(&record.field_653)
        .bind(&record.field_655)
        .bind(&record.field_700)
        .bind(&record.field_710)
        .bind(&record.field_720)
        .bind(&record.field_730)
        .bind(&record.field_856)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.get("created"))
    }

    /// Get-or-create an audience target name. Returns (id, created).
    pub async fn upsert_target_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> AppResult<(i32, bool)> {
        if let Some(id) =
            sqlx::query_scalar::<_, i32>("SELECT id FROM target_names WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?
        {
            return Ok((id, false));
        }

        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO target_names (name) VALUES ($1) RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        Ok((id, true))
    }

    /// Attach an audience target to a book; no-op when already attached.
    /// The 521 text column is kept in sync with the target name.
    pub async fn upsert_target(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        target_name_id: i32,
        name: &str,
    ) -> AppResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO targets (book_id, target_name_id, field_521)
            VALUES ($1, $2, $3)
            ON CONFLICT (book_id, target_name_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(target_name_id)
        .bind(name)
        .execute(&mut **tx)
        .await?
        .rows_affected();
        Ok(inserted > 0)
    }

    /// Attach a curation note to a book; no-op for an identical note.
    pub async fn upsert_curation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        note: &str,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM curations WHERE book_id = $1 AND field_500_curation = $2)",
        )
        .bind(book_id)
        .bind(note)
        .fetch_one(&mut **tx)
        .await?;

        if exists {
            return Ok(false);
        }

        sqlx::query("INSERT INTO curations (book_id, field_500_curation) VALUES ($1, $2)")
            .bind(book_id)
            .bind(note)
            .execute(&mut **tx)
            .await?;
        Ok(true)
    }
}
