
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::PassageRecord;
use crate::embeddings::chunking::Passage;
use crate::{Result, SahayError};

const TABLE_NAME: &str = "passages";

/// Vector index over passage embeddings, persisted as a LanceDB table.
///
/// The index is rebuilt wholesale by `build` and treated as read-only once
/// opened for serving; it is never patched incrementally.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: Option<usize>,
}

/// One nearest-neighbor hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub passage: Passage,
    /// L2 distance to the query vector; smaller is nearer.
    pub distance: f32,
}

impl VectorStore {
    /// Open a connection for (re)building the index. Any previously
    /// persisted table at this location is dropped.
    #[inline]
    pub async fn create(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir).map_err(|e| {
            SahayError::Index(format!("Failed to create index directory: {}", e))
        })?;

        let connection = connect(index_dir).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to list tables: {}", e)))?;
        if table_names.iter().any(|name| name == TABLE_NAME) {
            info!("Dropping existing passage table for rebuild");
            connection
                .drop_table(TABLE_NAME)
                .await
                .map_err(|e| SahayError::Index(format!("Failed to drop table: {}", e)))?;
        }

        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension: None,
        })
    }

    /// Open a previously persisted index for querying.
    ///
    /// Fails with [`SahayError::IndexNotFound`] when nothing has been
    /// ingested at this location.
    #[inline]
    pub async fn open(index_dir: &Path) -> Result<Self> {
        if !index_dir.exists() {
            return Err(SahayError::IndexNotFound(index_dir.display().to_string()));
        }

        let connection = connect(index_dir).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to list tables: {}", e)))?;
        if !table_names.iter().any(|name| name == TABLE_NAME) {
            return Err(SahayError::IndexNotFound(index_dir.display().to_string()));
        }

        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension: None,
        };
        let dimension = store.detect_vector_dimension().await?;
        store.vector_dimension = Some(dimension);
        debug!("Opened vector index with dimension {}", dimension);

        Ok(store)
    }

    /// Persist the full set of passage records as a fresh table.
    ///
    /// The records are written as a single batch, so a failed ingest never
    /// leaves a half-written index behind.
    #[inline]
    pub async fn build(&mut self, records: &[PassageRecord]) -> Result<()> {
        let Some(first) = records.first() else {
            return Err(SahayError::Index(
                "Refusing to build an empty index: no passages were produced".to_string(),
            ));
        };

        let vector_dim = first.vector.len();
        if let Some(record) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(SahayError::Index(format!(
                "Inconsistent vector dimensions: {} vs {} (record {})",
                vector_dim,
                record.vector.len(),
                record.id
            )));
        }
        self.vector_dimension = Some(vector_dim);

        debug!(
            "Writing {} passage records with dimension {}",
            records.len(),
            vector_dim
        );

        let schema = create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, Arc::clone(&schema))
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to create table: {}", e)))?;

        let record_batch = create_record_batch(records, &schema, vector_dim)?;

        let table = self.open_table().await?;
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to insert passages: {}", e)))?;

        info!("Persisted {} passages to the vector index", records.len());
        Ok(())
    }

    /// Nearest-neighbor search, nearest-first.
    ///
    /// `k` must be positive; when the index holds fewer than `k` entries,
    /// all of them are returned.
    #[inline]
    pub async fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(SahayError::Index(
                "Search limit k must be a positive integer".to_string(),
            ));
        }
        if let Some(dim) = self.vector_dimension {
            if query_vector.len() != dim {
                return Err(SahayError::Index(format!(
                    "Query vector dimensionality mismatch: expected {}, got {}",
                    dim,
                    query_vector.len()
                )));
            }
        }

        debug!("Searching for nearest passages with limit {}", k);

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| SahayError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(k)
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to execute search: {}", e)))?;

        self.collect_search_results(results).await
    }

    /// Number of passages currently stored.
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| SahayError::Index(format!("Failed to count rows: {}", e)))?;
        Ok(count as u64)
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to open table: {}", e)))
    }

    async fn detect_vector_dimension(&self) -> Result<usize> {
        let table = self.open_table().await?;
        let schema = table
            .schema()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(SahayError::Index(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    async fn collect_search_results(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>> {
        let mut search_results = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| SahayError::Index(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(parse_search_batch(&batch)?);
        }

        debug!("Collected {} search results", search_results.len());
        Ok(search_results)
    }
}

async fn connect(index_dir: &Path) -> Result<Connection> {
    let uri = format!("file://{}", index_dir.display());
    lancedb::connect(&uri)
        .execute()
        .await
        .map_err(|e| SahayError::Index(format!("Failed to connect to vector index: {}", e)))
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("source", DataType::Utf8, false),
        Field::new("page_number", DataType::UInt32, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("overlap", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    records: &[PassageRecord],
    schema: &Arc<Schema>,
    vector_dim: usize,
) -> Result<RecordBatch> {
    let len = records.len();

    let mut ids = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut page_numbers = Vec::with_capacity(len);
    let mut chunk_indices = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut overlaps = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);
    let mut flat_values = Vec::with_capacity(len * vector_dim);

    for record in records {
        ids.push(record.id.as_str());
        sources.push(record.passage.source.as_str());
        page_numbers.push(record.passage.page_number);
        chunk_indices.push(record.passage.chunk_index);
        contents.push(record.passage.text.as_str());
        overlaps.push(record.passage.overlap);
        created_ats.push(record.created_at.as_str());
        flat_values.extend_from_slice(&record.vector);
    }

    let values_array = Float32Array::from(flat_values);
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
            .map_err(|e| SahayError::Index(format!("Failed to create vector array: {}", e)))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(sources)),
        Arc::new(UInt32Array::from(page_numbers)),
        Arc::new(UInt32Array::from(chunk_indices)),
        Arc::new(StringArray::from(contents)),
        Arc::new(UInt32Array::from(overlaps)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|e| SahayError::Index(format!("Failed to create record batch: {}", e)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let sources = string_column(batch, "source")?;
    let page_numbers = u32_column(batch, "page_number")?;
    let chunk_indices = u32_column(batch, "chunk_index")?;
    let contents = string_column(batch, "content")?;
    let overlaps = u32_column(batch, "overlap")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut search_results = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let passage = Passage {
            source: sources.value(row).to_string(),
            page_number: page_numbers.value(row),
            chunk_index: chunk_indices.value(row),
            text: contents.value(row).to_string(),
            overlap: overlaps.value(row),
        };

        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        search_results.push(SearchResult { passage, distance });
    }

    Ok(search_results)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SahayError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| SahayError::Index(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SahayError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| SahayError::Index(format!("Invalid {} column type", name)))
}
