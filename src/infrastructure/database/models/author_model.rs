use diesel::prelude::*;

use crate::domain::entities::Author;
use crate::infrastructure::database::schema::{authors, document_authors};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuthorModel {
    pub id: i32,
    pub name: String,
    pub site_url: Option<String>,
}

impl From<AuthorModel> for Author {
    fn from(model: AuthorModel) -> Self {
        Author {
            id: model.id,
            name: model.name,
            site_url: model.site_url,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = authors)]
pub struct NewAuthorModel<'a> {
    pub name: &'a str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_authors)]
pub struct NewDocumentAuthorModel {
    pub book_id: i32,
    pub author_id: i32,
    pub author_order: i32,
}
