//! Interface for collection-level write operations.
mod bulk;
pub mod error;
pub mod options;
pub mod results;

pub use self::bulk::{BulkWriteOperation, BulkWriteRequestBuilder};

use bson::{self, Bson};
use crate::bulk::{BulkMixedWriteOperation, WriteRequest};
use crate::bulk::request::{validate_replace, validate_update};
use crate::common::WriteConcern;
use crate::connection::Connection;
use crate::error::{Error, Result};

use self::error::WriteException;
use self::options::*;
use self::results::*;

use std::collections::BTreeMap;

/// Interfaces with a MongoDB collection.
///
/// Every write takes the connection to run on, which is borrowed for the whole operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    db_name: String,
    name: String,
    /// The namespace of this collection, formatted as db_name.coll_name.
    pub namespace: String,
    write_concern: WriteConcern,
}

impl Collection {
    /// Creates a collection representation, defaulting to the server's write concern.
    pub fn new(db_name: &str, name: &str, write_concern: Option<WriteConcern>) -> Collection {
        Collection {
            db_name: db_name.to_owned(),
            name: name.to_owned(),
            namespace: format!("{}.{}", db_name, name),
            write_concern: write_concern.unwrap_or_else(WriteConcern::new),
        }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write_concern(&self) -> &WriteConcern {
        &self.write_concern
    }

    /// Starts a fluent bulk write whose requests run in order, stopping at the first failure.
    pub fn initialize_ordered_bulk_op(&self) -> BulkWriteOperation {
        BulkWriteOperation::new(self.clone(), true)
    }

    /// Starts a fluent bulk write whose requests may run in any order, all of them attempted.
    pub fn initialize_unordered_bulk_op(&self) -> BulkWriteOperation {
        BulkWriteOperation::new(self.clone(), false)
    }

    /// Sends a mixed sequence of write models to the server.
    ///
    /// Fails with `BulkWriteError` if any request failed; the error carries the partial result.
    pub fn bulk_write(
        &self,
        conn: &mut dyn Connection,
        models: Vec<WriteModel>,
        options: BulkWriteOptions,
    ) -> Result<BulkWriteResult> {
        let mut requests = Vec::with_capacity(models.len());
        for (index, model) in models.into_iter().enumerate() {
            requests.push(model.into_request(index)?);
        }

        self.execute_requests(conn, requests, options)
    }

    /// Inserts the provided document. If the document is missing an identifier,
    /// the driver should generate one.
    pub fn insert_one(
        &self,
        conn: &mut dyn Connection,
        doc: bson::Document,
        write_concern: Option<WriteConcern>,
    ) -> Result<InsertOneResult> {
        let mut request = WriteRequest::insert(0, doc);
        let id = request.ensure_id()?;

        let options = BulkWriteOptions { write_concern: write_concern, ..Default::default() };
        let result = self.execute_requests(conn, vec![request], options)
            .map_err(WriteException::downgrade)?;

        Ok(InsertOneResult {
            acknowledged: result.acknowledged,
            inserted_id: id,
        })
    }

    /// Inserts the provided documents. If any documents are missing an identifier,
    /// the driver should generate them.
    pub fn insert_many(
        &self,
        conn: &mut dyn Connection,
        docs: Vec<bson::Document>,
        options: Option<InsertManyOptions>,
    ) -> Result<InsertManyResult> {
        let mut requests = Vec::with_capacity(docs.len());
        let mut inserted_ids = BTreeMap::new();

        for (index, doc) in docs.into_iter().enumerate() {
            let mut request = WriteRequest::insert(index, doc);
            if let Some(id) = request.ensure_id()? {
                inserted_ids.insert(index, id);
            }
            requests.push(request);
        }

        let options = options.map(BulkWriteOptions::from).unwrap_or_default();
        let result = self.execute_requests(conn, requests, options)?;

        Ok(InsertManyResult {
            acknowledged: result.acknowledged,
            inserted_ids: inserted_ids,
        })
    }

    /// Updates a single document.
    pub fn update_one(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        update: bson::Document,
        options: Option<UpdateOptions>,
    ) -> Result<UpdateResult> {
        validate_update(&update)?;
        self.update(conn, filter, update, false, options)
    }

    /// Updates multiple documents.
    pub fn update_many(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        update: bson::Document,
        options: Option<UpdateOptions>,
    ) -> Result<UpdateResult> {
        validate_update(&update)?;
        self.update(conn, filter, update, true, options)
    }

    /// Replaces a single document.
    pub fn replace_one(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        replacement: bson::Document,
        options: Option<ReplaceOptions>,
    ) -> Result<UpdateResult> {
        validate_replace(&replacement)?;
        self.update(conn, filter, replacement, false, options)
    }

    /// Deletes a single document.
    pub fn delete_one(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        write_concern: Option<WriteConcern>,
    ) -> Result<DeleteResult> {
        self.delete(conn, filter, 1, write_concern)
    }

    /// Deletes multiple documents.
    pub fn delete_many(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        write_concern: Option<WriteConcern>,
    ) -> Result<DeleteResult> {
        self.delete(conn, filter, 0, write_concern)
    }

    fn update(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        update: bson::Document,
        multi: bool,
        options: Option<UpdateOptions>,
    ) -> Result<UpdateResult> {
        let options = options.unwrap_or_default();
        let multi = if multi { Some(true) } else { None };
        let request = WriteRequest::update(0, filter, update, multi, options.upsert);

        let bulk_options = BulkWriteOptions {
            write_concern: options.write_concern,
            bypass_document_validation: options.bypass_document_validation,
            ..Default::default()
        };

        let result = self.execute_requests(conn, vec![request], bulk_options)
            .map_err(WriteException::downgrade)?;

        Ok(UpdateResult::with_bulk_result(&result))
    }

    fn delete(
        &self,
        conn: &mut dyn Connection,
        filter: bson::Document,
        limit: i32,
        write_concern: Option<WriteConcern>,
    ) -> Result<DeleteResult> {
        let request = WriteRequest::delete(0, filter, limit);
        let options = BulkWriteOptions { write_concern: write_concern, ..Default::default() };

        let result = self.execute_requests(conn, vec![request], options)
            .map_err(WriteException::downgrade)?;

        Ok(DeleteResult::with_bulk_result(&result))
    }

    /// Runs already-numbered requests through the bulk pipeline with the collection's write
    /// concern as the default.
    fn execute_requests(
        &self,
        conn: &mut dyn Connection,
        requests: Vec<WriteRequest>,
        mut options: BulkWriteOptions,
    ) -> Result<BulkWriteResult> {
        if requests.is_empty() {
            return Err(Error::ArgumentError(String::from("No write requests were provided.")));
        }

        options.write_concern = Some(options.write_concern_or(&self.write_concern));

        tracing::debug!(
            namespace = %self.namespace,
            requests = requests.len(),
            ordered = options.ordered,
            "executing bulk write"
        );

        BulkMixedWriteOperation::new(&self.db_name, &self.name, requests, options).execute(conn)
    }
}

/// Extracts the identifiers of inserted documents from a bulk write result.
pub fn inserted_ids(result: &BulkWriteResult) -> BTreeMap<usize, Bson> {
    result.processed_requests.iter()
        .filter_map(|request| match *request {
            WriteRequest::Insert { original_index, ref document } => {
                document.get("_id").map(|id| (original_index, id.clone()))
            }
            _ => None,
        })
        .collect()
}
