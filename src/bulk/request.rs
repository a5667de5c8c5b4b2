//! Write requests flowing through the bulk pipeline.
use bson::{self, oid, Bson};
use crate::command_type::CommandType;
use crate::error::{Error, Result};

/// The kind of a write request. Every batch sent to the server is homogeneous in type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Insert,
    Update,
    Delete,
}

impl RequestType {
    /// The write command verb.
    pub fn command_name(self) -> &'static str {
        match self {
            RequestType::Insert => "insert",
            RequestType::Update => "update",
            RequestType::Delete => "delete",
        }
    }

    /// The array field of the write command that carries the statements.
    pub fn items_field(self) -> &'static str {
        match self {
            RequestType::Insert => "documents",
            RequestType::Update => "updates",
            RequestType::Delete => "deletes",
        }
    }

    pub fn command_type(self) -> CommandType {
        match self {
            RequestType::Insert => CommandType::Insert,
            RequestType::Update => CommandType::Update,
            RequestType::Delete => CommandType::Delete,
        }
    }
}

/// A single insert, update or delete, tagged with its position in the caller's sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Insert {
        original_index: usize,
        document: bson::Document,
    },
    Update {
        original_index: usize,
        query: bson::Document,
        update: bson::Document,
        /// Unset leaves the field off the wire, deferring to the server default.
        multi: Option<bool>,
        upsert: Option<bool>,
    },
    Delete {
        original_index: usize,
        query: bson::Document,
        /// `0` removes every match, `1` at most one.
        limit: i32,
    },
}

impl WriteRequest {
    pub fn insert(original_index: usize, document: bson::Document) -> WriteRequest {
        WriteRequest::Insert {
            original_index: original_index,
            document: document,
        }
    }

    pub fn update(
        original_index: usize,
        query: bson::Document,
        update: bson::Document,
        multi: Option<bool>,
        upsert: Option<bool>,
    ) -> WriteRequest {
        WriteRequest::Update {
            original_index: original_index,
            query: query,
            update: update,
            multi: multi,
            upsert: upsert,
        }
    }

    pub fn delete(original_index: usize, query: bson::Document, limit: i32) -> WriteRequest {
        WriteRequest::Delete {
            original_index: original_index,
            query: query,
            limit: limit,
        }
    }

    pub fn original_index(&self) -> usize {
        match *self {
            WriteRequest::Insert { original_index, .. } |
            WriteRequest::Update { original_index, .. } |
            WriteRequest::Delete { original_index, .. } => original_index,
        }
    }

    pub fn request_type(&self) -> RequestType {
        match *self {
            WriteRequest::Insert { .. } => RequestType::Insert,
            WriteRequest::Update { .. } => RequestType::Update,
            WriteRequest::Delete { .. } => RequestType::Delete,
        }
    }

    /// Whether this is an update that may insert when nothing matches.
    pub fn is_upsert(&self) -> bool {
        match *self {
            WriteRequest::Update { upsert, .. } => upsert == Some(true),
            _ => false,
        }
    }

    /// Makes sure an insert carries an `_id`, generating an ObjectId as the first field when it
    /// does not. Returns the document's id, or `None` for updates and deletes.
    pub fn ensure_id(&mut self) -> Result<Option<Bson>> {
        let document = match *self {
            WriteRequest::Insert { ref mut document, .. } => document,
            _ => return Ok(None),
        };

        if let Some(id) = document.get("_id") {
            return Ok(Some(id.clone()));
        }

        let id = Bson::ObjectId(oid::ObjectId::new()?);
        let mut with_id = bson::Document::new();
        with_id.insert("_id", id.clone());
        for (key, value) in document.iter() {
            with_id.insert(key.clone(), value.clone());
        }
        *document = with_id;

        Ok(Some(id))
    }

    /// Checks the request's documents for keys the server would reject or misinterpret.
    pub fn validate(&self) -> Result<()> {
        match *self {
            WriteRequest::Insert { ref document, .. } => validate_insert(document),
            WriteRequest::Update { ref update, .. } => {
                if is_update_document(update) {
                    validate_update(update)
                } else {
                    validate_replace(update)
                }
            }
            WriteRequest::Delete { limit, .. } => {
                if limit == 0 || limit == 1 {
                    Ok(())
                } else {
                    Err(Error::ArgumentError(format!("Delete limit must be 0 or 1, not {}.", limit)))
                }
            }
        }
    }

    /// Builds the statement that represents this request inside a write command.
    pub fn to_statement(&self) -> bson::Document {
        match *self {
            WriteRequest::Insert { ref document, .. } => document.clone(),
            WriteRequest::Update { ref query, ref update, multi, upsert, .. } => {
                let mut statement = bson::Document::new();
                statement.insert("q", query.clone());
                statement.insert("u", update.clone());
                if let Some(multi) = multi {
                    statement.insert("multi", multi);
                }
                if let Some(upsert) = upsert {
                    statement.insert("upsert", upsert);
                }
                statement
            }
            WriteRequest::Delete { ref query, limit, .. } => {
                let mut statement = bson::Document::new();
                statement.insert("q", query.clone());
                statement.insert("limit", limit);
                statement
            }
        }
    }
}

/// An update document is one whose first key is an update operator.
pub fn is_update_document(update: &bson::Document) -> bool {
    update.keys().next().map_or(false, |key| key.starts_with('$'))
}

/// Update documents must be non-empty and consist only of update operators.
pub fn validate_update(update: &bson::Document) -> Result<()> {
    if update.is_empty() {
        return Err(Error::ArgumentError(String::from("Update document must not be empty.")));
    }

    for key in update.keys() {
        if !key.starts_with('$') {
            return Err(Error::ArgumentError(format!(
                "Update only works with $ operators, found '{}'.",
                key
            )));
        }
    }
    Ok(())
}

/// Replacement documents may not contain update operators.
pub fn validate_replace(replacement: &bson::Document) -> Result<()> {
    for key in replacement.keys() {
        if key.starts_with('$') {
            return Err(Error::ArgumentError(format!(
                "Replacement document must not contain update operators, found '{}'.",
                key
            )));
        }
    }
    Ok(())
}

fn validate_insert(document: &bson::Document) -> Result<()> {
    for key in document.keys() {
        if key.starts_with('$') || key.contains('.') {
            return Err(Error::ArgumentError(format!(
                "Element name '{}' is not valid in an inserted document.",
                key
            )));
        }
    }
    Ok(())
}
