use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;

use crate::domain::entities::{Book, NewBook};
use crate::domain::repositories::{BookQuery, BookRepository, BookRepositoryError, BookSortField};
use crate::infrastructure::database::models::{BookModel, NewBookModel};
use crate::infrastructure::database::schema::{authors, books, document_authors};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresBookRepository {
    pool: DbPool,
}

impl PostgresBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, query: F) -> Result<T, BookRepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, diesel::result::Error> + Send + 'static,
    {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| BookRepositoryError::DatabaseError(e.to_string()))?;

        tokio::task::spawn_blocking(move || query(&mut *conn))
            .await
            .map_err(|e| BookRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
            .map_err(|e| BookRepositoryError::DatabaseError(e.to_string()))
    }
}

/// Applies the listing filters. Built once for the page and once for the count.
fn filtered_books(query: &BookQuery) -> books::BoxedQuery<'static, Pg> {
    let mut statement = books::table.into_boxed();

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        statement = statement.filter(
            books::title
                .ilike(pattern.clone())
                .or(books::author.ilike(pattern)),
        );
    }
    if let Some(category) = &query.category {
        statement = statement.filter(books::category.eq(category.clone()));
    }
    if let Some(document_type) = query.document_type {
        statement = statement.filter(books::document_type.eq(document_type.as_str()));
    }
    if let Some(author) = &query.author {
        let linked = document_authors::table
            .inner_join(authors::table)
            .filter(authors::name.ilike(format!("%{}%", author)))
            .select(document_authors::book_id);
        statement = statement.filter(books::id.eq_any(linked));
    }

    statement
}

#[async_trait]
impl BookRepository for PostgresBookRepository {
    async fn upsert(&self, book: &NewBook) -> Result<Book, BookRepositoryError> {
        let model = NewBookModel::from(book);

        let stored = self
            .run(move |conn| {
                diesel::insert_into(books::table)
                    .values(&model)
                    .on_conflict(books::filename)
                    .do_update()
                    .set(&model)
                    .returning(BookModel::as_returning())
                    .get_result(conn)
            })
            .await?;

        Ok(stored.into())
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<Book>, BookRepositoryError> {
        let filename = filename.to_string();

        let result = self
            .run(move |conn| {
                books::table
                    .filter(books::filename.eq(filename))
                    .select(BookModel::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;

        Ok(result.map(Book::from))
    }

    async fn find_by_filenames(&self, filenames: &[String]) -> Result<Vec<Book>, BookRepositoryError> {
        if filenames.is_empty() {
            return Ok(Vec::new());
        }
        let filenames = filenames.to_vec();

        let models = self
            .run(move |conn| {
                books::table
                    .filter(books::filename.eq_any(filenames))
                    .select(BookModel::as_select())
                    .load(conn)
            })
            .await?;

        Ok(models.into_iter().map(Book::from).collect())
    }

    async fn list(&self, query: &BookQuery) -> Result<Vec<Book>, BookRepositoryError> {
        let query = query.clone();

        let models = self
            .run(move |conn| {
                let statement = filtered_books(&query);
                let statement = match (query.sort_by, query.descending) {
                    (BookSortField::Title, false) => statement.order(books::title.asc()),
                    (BookSortField::Title, true) => statement.order(books::title.desc()),
                    (BookSortField::Year, false) => statement.order(books::year.asc()),
                    (BookSortField::Year, true) => statement.order(books::year.desc()),
                    (BookSortField::ProcessedAt, false) => statement.order(books::processed_at.asc()),
                    (BookSortField::ProcessedAt, true) => statement.order(books::processed_at.desc()),
                    (BookSortField::TotalPages, false) => statement.order(books::total_pages.asc()),
                    (BookSortField::TotalPages, true) => statement.order(books::total_pages.desc()),
                };

                statement
                    .then_order_by(books::id.asc())
                    .offset(query.offset)
                    .limit(query.limit)
                    .load::<BookModel>(conn)
            })
            .await?;

        Ok(models.into_iter().map(Book::from).collect())
    }

    async fn count(&self, query: &BookQuery) -> Result<i64, BookRepositoryError> {
        let query = query.clone();
        self.run(move |conn| filtered_books(&query).count().get_result(conn))
            .await
    }

    async fn delete_by_filename(&self, filename: &str) -> Result<bool, BookRepositoryError> {
        let filename = filename.to_string();

        let deleted = self
            .run(move |conn| {
                diesel::delete(books::table.filter(books::filename.eq(filename))).execute(conn)
            })
            .await?;

        Ok(deleted > 0)
    }
}
