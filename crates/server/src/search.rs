use std::sync::{Arc, Mutex};

use sqlx::{Pool, Postgres};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use uuid::Uuid;

use shared_types::{AppError, Document, Judgment};

use crate::repo;
use crate::text::{normalize_arabic, remove_punctuation};

/// Upper bound on ids pulled from the index before scope filtering.
pub const MAX_INDEX_HITS: usize = 500;

/// Which entity a hit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Judgment,
    Document,
}

impl SearchKind {
    fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Judgment => "judgment",
            SearchKind::Document => "document",
        }
    }
}

/// Schema field handles for the Tantivy index.
struct SearchFields {
    id: Field,
    kind: Field,
    title: Field,
    body: Field,
}

/// In-memory Tantivy index over judgments and documents.
///
/// Text is normalized with `normalize_arabic` before it reaches the
/// tokenizer, and queries go through the same normalization, so hamza and
/// ta marbuta variants match each other.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    fields: SearchFields,
}

fn index_error(e: tantivy::TantivyError) -> AppError {
    tracing::error!(error = %e, "search index error");
    AppError::internal("خطأ في فهرس البحث")
}

fn prepare(text: &str) -> String {
    remove_punctuation(&normalize_arabic(text))
}

impl SearchIndex {
    /// Create an empty in-RAM index.
    pub fn new() -> Result<Self, AppError> {
        let mut schema_builder = Schema::builder();
        let id = schema_builder.add_text_field("id", STRING | STORED);
        let kind = schema_builder.add_text_field("kind", STRING | STORED);
        let title = schema_builder.add_text_field("title", TEXT);
        let body = schema_builder.add_text_field("body", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(index_error)?;
        let writer = index
            .writer_with_num_threads(1, 50_000_000)
            .map_err(index_error)?;

        Ok(SearchIndex {
            index,
            reader,
            writer: Mutex::new(writer),
            fields: SearchFields { id, kind, title, body },
        })
    }

    fn upsert(&self, kind: SearchKind, id: Uuid, title: &str, body: &str) -> Result<(), AppError> {
        let f = &self.fields;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::internal("خطأ في فهرس البحث"))?;
        writer.delete_term(Term::from_field_text(f.id, &id.to_string()));
        writer
            .add_document(doc!(
                f.id => id.to_string(),
                f.kind => kind.as_str(),
                f.title => prepare(title),
                f.body => prepare(body),
            ))
            .map_err(index_error)?;
        writer.commit().map_err(index_error)?;
        self.reader.reload().map_err(index_error)
    }

    /// Drop an entry, e.g. after a soft delete.
    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::internal("خطأ في فهرس البحث"))?;
        writer.delete_term(Term::from_field_text(self.fields.id, &id.to_string()));
        writer.commit().map_err(index_error)?;
        self.reader.reload().map_err(index_error)
    }

    /// Index (or re-index) a judgment by number, summary, keywords and content.
    pub fn index_judgment(&self, judgment: &Judgment) -> Result<(), AppError> {
        let title = format!("{} {}", judgment.judgment_number, judgment.summary);
        let mut body = judgment.classification.keywords.join(" ");
        if let Some(subject) = &judgment.classification.subject {
            body.push(' ');
            body.push_str(subject);
        }
        for section in judgment.content.sections() {
            body.push(' ');
            body.push_str(section);
        }
        self.upsert(SearchKind::Judgment, judgment.id, &title, &body)
    }

    /// Index a document by title, description, tags and extracted text.
    pub fn index_document(&self, document: &Document) -> Result<(), AppError> {
        let body = format!(
            "{} {} {} {}",
            document.description.as_deref().unwrap_or(""),
            document.tags.join(" "),
            document.content.keywords.join(" "),
            document.content.text.as_deref().unwrap_or(""),
        );
        self.upsert(SearchKind::Document, document.id, &document.title, &body)
    }

    /// Ids of the best matches of `kind` for `query_str`, best first.
    /// Unparseable or empty queries yield no hits.
    pub fn search(&self, kind: SearchKind, query_str: &str, limit: usize) -> Vec<Uuid> {
        let prepared = prepare(query_str);
        if prepared.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let searcher = self.reader.searcher();
        let query_parser =
            QueryParser::for_index(&self.index, vec![self.fields.title, self.fields.body]);
        let (text_query, _errors) = query_parser.parse_query_lenient(&prepared);
        let kind_query = TermQuery::new(
            Term::from_field_text(self.fields.kind, kind.as_str()),
            IndexRecordOption::Basic,
        );
        let query = BooleanQuery::new(vec![
            (Occur::Must, text_query),
            (Occur::Must, Box::new(kind_query) as Box<dyn Query>),
        ]);

        let top_docs = match searcher.search(&query, &TopDocs::with_limit(limit)) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "search query failed");
                return Vec::new();
            }
        };

        top_docs
            .into_iter()
            .filter_map(|(_score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                doc.get_first(self.fields.id)
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .collect()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run index work on the blocking pool. Commits and reloads are
/// synchronous and must stay off the async workers.
async fn run_blocking<T, F>(search: &Arc<SearchIndex>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&SearchIndex) -> Result<T, AppError> + Send + 'static,
{
    let search = Arc::clone(search);
    tokio::task::spawn_blocking(move || f(&search))
        .await
        .map_err(|e| AppError::internal(format!("search task panicked: {e}")))?
}

/// Best matches of `kind` for `query_str`, looked up on the blocking pool.
pub async fn find(search: &Arc<SearchIndex>, kind: SearchKind, query_str: &str, limit: usize) -> Vec<Uuid> {
    let query_str = query_str.to_owned();
    match run_blocking(search, move |index| Ok(index.search(kind, &query_str, limit))).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e.message, "index lookup failed");
            Vec::new()
        }
    }
}

/// Mirror a judgment write into the index when indexing is enabled.
/// Failures are logged only.
pub async fn sync_judgment(search: &Arc<SearchIndex>, judgment: &Judgment) {
    if !crate::config::feature_flags().search_index {
        return;
    }
    let judgment_id = judgment.id;
    let judgment = judgment.clone();
    if let Err(e) = run_blocking(search, move |index| index.index_judgment(&judgment)).await {
        tracing::warn!(%judgment_id, error = %e.message, "judgment not indexed");
    }
}

/// Mirror a document write into the index when indexing is enabled.
pub async fn sync_document(search: &Arc<SearchIndex>, document: &Document) {
    if !crate::config::feature_flags().search_index {
        return;
    }
    let document_id = document.id;
    let document = document.clone();
    if let Err(e) = run_blocking(search, move |index| index.index_document(&document)).await {
        tracing::warn!(%document_id, error = %e.message, "document not indexed");
    }
}

pub async fn sync_removal(search: &Arc<SearchIndex>, id: Uuid) {
    if !crate::config::feature_flags().search_index {
        return;
    }
    if let Err(e) = run_blocking(search, move |index| index.remove(id)).await {
        tracing::warn!(%id, error = %e.message, "index entry not removed");
    }
}

/// Load every judgment and active document into the index.
/// Called once at startup after migrations complete.
pub async fn build_index(pool: &Pool<Postgres>, search: &Arc<SearchIndex>) -> Result<u64, AppError> {
    let judgments = repo::judgment::list_all(pool).await?;
    let documents = repo::document::list_active(pool).await?;
    let (judgment_count, document_count) = (judgments.len(), documents.len());

    let total = run_blocking(search, move |index| {
        for judgment in &judgments {
            index.index_judgment(judgment)?;
        }
        for document in &documents {
            index.index_document(document)?;
        }
        Ok(index.len())
    })
    .await?;

    tracing::info!(
        judgments = judgment_count,
        documents = document_count,
        "search index built"
    );
    Ok(total)
}
