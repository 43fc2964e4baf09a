use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::domain::entities::{Author, AuthorWithCount, BookAuthor};
use crate::domain::repositories::{AuthorRepository, AuthorRepositoryError};
use crate::infrastructure::database::models::{
    AuthorModel, NewAuthorModel, NewDocumentAuthorModel,
};
use crate::infrastructure::database::schema::{authors, document_authors};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresAuthorRepository {
    pool: DbPool,
}

impl PostgresAuthorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, query: F) -> Result<T, AuthorRepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, diesel::result::Error> + Send + 'static,
    {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| AuthorRepositoryError::DatabaseError(e.to_string()))?;

        tokio::task::spawn_blocking(move || query(&mut *conn))
            .await
            .map_err(|e| AuthorRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
            .map_err(|e| AuthorRepositoryError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn get_or_create(&self, name: &str) -> Result<Author, AuthorRepositoryError> {
        let name = name.to_string();

        let model = self
            .run(move |conn| {
                diesel::insert_into(authors::table)
                    .values(&NewAuthorModel { name: &name })
                    .on_conflict(authors::name)
                    .do_nothing()
                    .execute(conn)?;

                authors::table
                    .filter(authors::name.eq(name.as_str()))
                    .select(AuthorModel::as_select())
                    .first(conn)
            })
            .await?;

        Ok(model.into())
    }

    async fn find_by_id(&self, author_id: i32) -> Result<Option<Author>, AuthorRepositoryError> {
        let result = self
            .run(move |conn| {
                authors::table
                    .find(author_id)
                    .select(AuthorModel::as_select())
                    .first(conn)
                    .optional()
            })
            .await?;

        Ok(result.map(Author::from))
    }

    async fn search(
        &self,
        name_fragment: &str,
        limit: i64,
    ) -> Result<Vec<AuthorWithCount>, AuthorRepositoryError> {
        let pattern = format!("%{}%", name_fragment);

        let (models, counts) = self
            .run(move |conn| {
                let models = authors::table
                    .filter(authors::name.ilike(pattern))
                    .order(authors::name.asc())
                    .limit(limit)
                    .select(AuthorModel::as_select())
                    .load(conn)?;

                let ids: Vec<i32> = models.iter().map(|m: &AuthorModel| m.id).collect();
                let counts: HashMap<i32, i64> = document_authors::table
                    .filter(document_authors::author_id.eq_any(&ids))
                    .group_by(document_authors::author_id)
                    .select((document_authors::author_id, count_star()))
                    .load::<(i32, i64)>(conn)?
                    .into_iter()
                    .collect();

                Ok((models, counts))
            })
            .await?;

        Ok(models
            .into_iter()
            .map(|model| AuthorWithCount {
                document_count: counts.get(&model.id).copied().unwrap_or(0),
                author: model.into(),
            })
            .collect())
    }

    async fn update_site_url(
        &self,
        author_id: i32,
        site_url: Option<&str>,
    ) -> Result<Option<Author>, AuthorRepositoryError> {
        let site_url = site_url.map(str::to_string);

        let result = self
            .run(move |conn| {
                diesel::update(authors::table.find(author_id))
                    .set(authors::site_url.eq(site_url))
                    .returning(AuthorModel::as_returning())
                    .get_result(conn)
                    .optional()
            })
            .await?;

        Ok(result.map(Author::from))
    }

    async fn authors_for_books(
        &self,
        book_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<BookAuthor>>, AuthorRepositoryError> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let book_ids = book_ids.to_vec();

        let rows = self
            .run(move |conn| {
                document_authors::table
                    .inner_join(authors::table)
                    .filter(document_authors::book_id.eq_any(book_ids))
                    .order((
                        document_authors::book_id.asc(),
                        document_authors::author_order.asc(),
                    ))
                    .select((
                        document_authors::book_id,
                        document_authors::author_order,
                        AuthorModel::as_select(),
                    ))
                    .load::<(i32, i32, AuthorModel)>(conn)
            })
            .await?;

        let mut grouped: HashMap<i32, Vec<BookAuthor>> = HashMap::new();
        for (book_id, author_order, model) in rows {
            grouped.entry(book_id).or_default().push(BookAuthor {
                author_id: model.id,
                name: model.name,
                site_url: model.site_url,
                author_order,
            });
        }
        Ok(grouped)
    }

    async fn replace_book_authors(
        &self,
        book_id: i32,
        author_ids: &[i32],
    ) -> Result<(), AuthorRepositoryError> {
        let links: Vec<NewDocumentAuthorModel> = author_ids
            .iter()
            .enumerate()
            .map(|(order, author_id)| NewDocumentAuthorModel {
                book_id,
                author_id: *author_id,
                author_order: order as i32,
            })
            .collect();

        self.run(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    document_authors::table.filter(document_authors::book_id.eq(book_id)),
                )
                .execute(conn)?;
                diesel::insert_into(document_authors::table)
                    .values(&links)
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }
}
