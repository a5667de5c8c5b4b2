//! Options for collection-level write operations.
use crate::bulk::request::{validate_replace, validate_update, WriteRequest};
use crate::common::WriteConcern;
use crate::error::Result;
use serde_derive::{Deserialize, Serialize};

/// Marker interface for writes that can be batched together.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteModel {
    InsertOne { document: bson::Document },
    DeleteOne { filter: bson::Document },
    DeleteMany { filter: bson::Document },
    ReplaceOne {
        filter: bson::Document,
        replacement: bson::Document,
        upsert: Option<bool>,
    },
    UpdateOne {
        filter: bson::Document,
        update: bson::Document,
        upsert: Option<bool>,
    },
    UpdateMany {
        filter: bson::Document,
        update: bson::Document,
        upsert: Option<bool>,
    },
}

impl WriteModel {
    /// Validates the model and converts it into the request at `original_index`.
    pub fn into_request(self, original_index: usize) -> Result<WriteRequest> {
        let request = match self {
            WriteModel::InsertOne { document } => WriteRequest::insert(original_index, document),
            WriteModel::DeleteOne { filter } => WriteRequest::delete(original_index, filter, 1),
            WriteModel::DeleteMany { filter } => WriteRequest::delete(original_index, filter, 0),
            WriteModel::ReplaceOne { filter, replacement, upsert } => {
                validate_replace(&replacement)?;
                WriteRequest::update(original_index, filter, replacement, None, upsert)
            }
            WriteModel::UpdateOne { filter, update, upsert } => {
                validate_update(&update)?;
                WriteRequest::update(original_index, filter, update, None, upsert)
            }
            WriteModel::UpdateMany { filter, update, upsert } => {
                validate_update(&update)?;
                WriteRequest::update(original_index, filter, update, Some(true), upsert)
            }
        };

        request.validate()?;
        Ok(request)
    }
}

/// Options for bulk write operations.
///
/// Batch limits only ever tighten the limits advertised by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BulkWriteOptions {
    pub ordered: bool,
    pub write_concern: Option<WriteConcern>,
    pub max_batch_count: Option<usize>,
    pub max_batch_length: Option<usize>,
    pub bypass_document_validation: Option<bool>,
}

impl Default for BulkWriteOptions {
    fn default() -> Self {
        BulkWriteOptions {
            ordered: true,
            write_concern: None,
            max_batch_count: None,
            max_batch_length: None,
            bypass_document_validation: None,
        }
    }
}

impl BulkWriteOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn unordered() -> Self {
        BulkWriteOptions {
            ordered: false,
            ..Default::default()
        }
    }

    /// The write concern to use, falling back to `default` when none was given.
    pub fn write_concern_or(&self, default: &WriteConcern) -> WriteConcern {
        self.write_concern.clone().unwrap_or_else(|| default.clone())
    }
}

/// Options for insertMany operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsertManyOptions {
    pub ordered: Option<bool>,
    pub write_concern: Option<WriteConcern>,
    pub bypass_document_validation: Option<bool>,
}

impl InsertManyOptions {
    pub fn new() -> Self {
        Default::default()
    }
}

impl From<InsertManyOptions> for BulkWriteOptions {
    fn from(options: InsertManyOptions) -> Self {
        BulkWriteOptions {
            ordered: options.ordered.unwrap_or(true),
            write_concern: options.write_concern,
            bypass_document_validation: options.bypass_document_validation,
            ..Default::default()
        }
    }
}

/// Options for update operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateOptions {
    pub upsert: Option<bool>,
    pub write_concern: Option<WriteConcern>,
    pub bypass_document_validation: Option<bool>,
}

impl UpdateOptions {
    pub fn new() -> UpdateOptions {
        Default::default()
    }
}

pub type ReplaceOptions = UpdateOptions;
