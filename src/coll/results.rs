use bson::Bson;
use crate::bulk::WriteRequest;
use std::collections::BTreeMap;

/// An upsert performed by a bulk write, identified by the index of its request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteUpsert {
    pub index: usize,
    pub id: Bson,
}

/// Results for a bulk write operation.
///
/// When `acknowledged` is false the server sent no counts, and only `request_count` and
/// `processed_requests` carry information.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkWriteResult {
    pub acknowledged: bool,
    pub request_count: usize,
    pub processed_requests: Vec<WriteRequest>,
    pub inserted_count: i64,
    pub matched_count: i64,
    /// `None` when some batch went to a server that cannot report modifications.
    pub modified_count: Option<i64>,
    pub deleted_count: i64,
    pub upserts: Vec<BulkWriteUpsert>,
}

/// Results for an insertOne operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Option<Bson>,
}

/// Results for an insertMany operation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    pub acknowledged: bool,
    pub inserted_ids: BTreeMap<usize, Bson>,
}

/// Results for a deletion operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: i64,
}

/// Results for an update operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: i64,
    pub modified_count: Option<i64>,
    pub upserted_id: Option<Bson>,
}

impl BulkWriteResult {
    /// Returns an acknowledged result with every count at zero.
    pub fn new(request_count: usize, processed_requests: Vec<WriteRequest>) -> BulkWriteResult {
        BulkWriteResult {
            acknowledged: true,
            request_count: request_count,
            processed_requests: processed_requests,
            inserted_count: 0,
            matched_count: 0,
            modified_count: Some(0),
            deleted_count: 0,
            upserts: Vec::new(),
        }
    }

    /// Returns the result of a write sent with an unacknowledged write concern.
    pub fn unacknowledged(request_count: usize, processed_requests: Vec<WriteRequest>) -> BulkWriteResult {
        BulkWriteResult {
            acknowledged: false,
            modified_count: None,
            ..BulkWriteResult::new(request_count, processed_requests)
        }
    }

    pub fn is_modified_count_available(&self) -> bool {
        self.modified_count.is_some()
    }

    pub fn upserted_count(&self) -> usize {
        self.upserts.len()
    }

    /// The id of the document upserted by the request at `index`, if any.
    pub fn upserted_id(&self, index: usize) -> Option<&Bson> {
        self.upserts.iter().find(|upsert| upsert.index == index).map(|upsert| &upsert.id)
    }
}

impl DeleteResult {
    /// Extracts a single deletion's outcome from a bulk write result.
    pub fn with_bulk_result(result: &BulkWriteResult) -> DeleteResult {
        DeleteResult {
            acknowledged: result.acknowledged,
            deleted_count: result.deleted_count,
        }
    }
}

impl UpdateResult {
    /// Extracts a single update's outcome from a bulk write result.
    pub fn with_bulk_result(result: &BulkWriteResult) -> UpdateResult {
        UpdateResult {
            acknowledged: result.acknowledged,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id(0).cloned(),
        }
    }
}
