//! Fluent construction of bulk writes.
use bson::{self, Bson};
use crate::bulk::request::{validate_replace, validate_update};
use crate::bulk::{BulkMixedWriteOperation, WriteRequest};
use crate::coll::options::BulkWriteOptions;
use crate::coll::results::BulkWriteResult;
use crate::coll::Collection;
use crate::common::WriteConcern;
use crate::connection::Connection;
use crate::error::{Error, Result};
use serde::Serialize;

/// Collects write requests one call at a time and executes them as a single bulk write.
///
/// An operation can be executed once. Adding requests after execution, or executing without
/// any requests, is an error.
#[derive(Debug)]
pub struct BulkWriteOperation {
    collection: Collection,
    ordered: bool,
    bypass_document_validation: Option<bool>,
    requests: Vec<WriteRequest>,
    executed: bool,
}

/// Builds an update, replacement or removal for the documents matching a query.
#[derive(Debug)]
pub struct BulkWriteRequestBuilder<'a> {
    parent: &'a mut BulkWriteOperation,
    query: bson::Document,
    upsert: bool,
}

impl BulkWriteOperation {
    pub(crate) fn new(collection: Collection, ordered: bool) -> BulkWriteOperation {
        BulkWriteOperation {
            collection: collection,
            ordered: ordered,
            bypass_document_validation: None,
            requests: Vec::new(),
            executed: false,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// The requests added so far.
    pub fn requests(&self) -> &[WriteRequest] {
        &self.requests
    }

    pub fn bypass_document_validation(&mut self, bypass: bool) -> &mut BulkWriteOperation {
        self.bypass_document_validation = Some(bypass);
        self
    }

    /// Adds a document to insert.
    pub fn insert(&mut self, document: bson::Document) -> Result<()> {
        self.ensure_not_executed()?;

        let request = WriteRequest::insert(self.requests.len(), document);
        request.validate()?;
        self.requests.push(request);
        Ok(())
    }

    /// Adds any serializable value to insert. It must serialize to a document.
    pub fn insert_as<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match bson::to_bson(value)? {
            Bson::Document(document) => self.insert(document),
            other => Err(Error::ArgumentError(format!(
                "Inserted values must serialize to a document, not {:?}.",
                other
            ))),
        }
    }

    /// Starts a request that applies to the documents matching `query`.
    pub fn find(&mut self, query: bson::Document) -> Result<BulkWriteRequestBuilder> {
        self.ensure_not_executed()?;

        Ok(BulkWriteRequestBuilder {
            parent: self,
            query: query,
            upsert: false,
        })
    }

    /// Executes the requests with the collection's write concern.
    pub fn execute(&mut self, conn: &mut dyn Connection) -> Result<BulkWriteResult> {
        let write_concern = self.collection.write_concern().clone();
        self.execute_with_write_concern(conn, write_concern)
    }

    pub fn execute_with_write_concern(
        &mut self,
        conn: &mut dyn Connection,
        write_concern: WriteConcern,
    ) -> Result<BulkWriteResult> {
        self.ensure_not_executed()?;

        if self.requests.is_empty() {
            return Err(Error::OperationError(String::from(
                "A bulk write operation must contain at least one request.",
            )));
        }

        self.executed = true;

        let options = BulkWriteOptions {
            ordered: self.ordered,
            write_concern: Some(write_concern),
            bypass_document_validation: self.bypass_document_validation,
            ..Default::default()
        };

        let requests = std::mem::replace(&mut self.requests, Vec::new());
        BulkMixedWriteOperation::new(self.collection.db_name(), self.collection.name(), requests, options)
            .execute(conn)
    }

    fn ensure_not_executed(&self) -> Result<()> {
        if self.executed {
            return Err(Error::OperationError(String::from(
                "A bulk write operation can only be executed once.",
            )));
        }
        Ok(())
    }

    fn add(&mut self, request: WriteRequest) -> Result<()> {
        request.validate()?;
        self.requests.push(request);
        Ok(())
    }
}

impl<'a> BulkWriteRequestBuilder<'a> {
    /// Makes the following update or replacement insert a document when nothing matches.
    pub fn upsert(mut self) -> BulkWriteRequestBuilder<'a> {
        self.upsert = true;
        self
    }

    /// Applies the update operators to every matching document.
    pub fn update(self, update: bson::Document) -> Result<()> {
        validate_update(&update)?;
        self.add_update(update, Some(true))
    }

    /// Applies the update operators to the first matching document.
    pub fn update_one(self, update: bson::Document) -> Result<()> {
        validate_update(&update)?;
        self.add_update(update, Some(false))
    }

    /// Replaces the first matching document.
    pub fn replace_one(self, replacement: bson::Document) -> Result<()> {
        validate_replace(&replacement)?;
        self.add_update(replacement, Some(false))
    }

    /// Removes every matching document.
    pub fn remove(self) -> Result<()> {
        self.add_delete(0)
    }

    /// Removes the first matching document.
    pub fn remove_one(self) -> Result<()> {
        self.add_delete(1)
    }

    fn add_update(self, update: bson::Document, multi: Option<bool>) -> Result<()> {
        let index = self.parent.requests.len();
        let upsert = if self.upsert { Some(true) } else { None };
        self.parent.add(WriteRequest::update(index, self.query, update, multi, upsert))
    }

    fn add_delete(self, limit: i32) -> Result<()> {
        let index = self.parent.requests.len();
        self.parent.add(WriteRequest::delete(index, self.query, limit))
    }
}
