// Books, authors and their links come from the embedded migrations. The
// `documents` table is created by the selected vector index backend, so it is
// declared three times: without the embedding column, and once per
// embedding column type.

diesel::table! {
    use diesel::sql_types::*;

    documents (id) {
        id -> Int8,
        filename -> Text,
        content -> Text,
        page_number -> Nullable<Int4>,
        chunk_index -> Int4,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;
    use pgvector::sql_types::*;

    #[sql_name = "documents"]
    vector_documents (id) {
        id -> Int8,
        filename -> Text,
        content -> Text,
        page_number -> Nullable<Int4>,
        chunk_index -> Int4,
        embedding -> Nullable<Vector>,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    #[sql_name = "documents"]
    json_documents (id) {
        id -> Int8,
        filename -> Text,
        content -> Text,
        page_number -> Nullable<Int4>,
        chunk_index -> Int4,
        embedding -> Nullable<Jsonb>,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    books (id) {
        id -> Int4,
        filename -> Text,
        title -> Text,
        author -> Nullable<Text>,
        category -> Nullable<Text>,
        document_type -> Text,
        mc_press_url -> Nullable<Text>,
        article_url -> Nullable<Text>,
        total_pages -> Nullable<Int4>,
        tags -> Array<Text>,
        year -> Nullable<Int4>,
        processed_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    authors (id) {
        id -> Int4,
        name -> Text,
        site_url -> Nullable<Text>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    document_authors (book_id, author_id) {
        book_id -> Int4,
        author_id -> Int4,
        author_order -> Int4,
    }
}

diesel::joinable!(document_authors -> authors (author_id));
diesel::joinable!(document_authors -> books (book_id));

diesel::allow_tables_to_appear_in_same_query!(authors, books, document_authors,);
