//! A generic JSON parse tree with typed accessors.
//!
//! The tree is a closed tagged union rather than a class hierarchy;
//! every accessor that can fail returns a [`TreeError`] instead of
//! casting. "Pop" accessors remove-and-return members so a mapper can
//! tell which parts of a document it consumed and which are leftover
//! pass-through data.

use crate::xword::error::TreeError;

/// One JSON value. Numbers keep their source text; object member order
/// is preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum Json {
    Null,
    Bool(bool),
    Number(String),
    String(String),
    Object(Vec<(String, Json)>),
    Array(Vec<Json>),
}

impl Json {
    /// Parses the first JSON value in `bytes`, tolerating trailing
    /// garbage after it.
    pub fn parse(bytes: &[u8]) -> Result<Json, TreeError> {
        let mut stream = serde_json::Deserializer::from_slice(bytes)
            .into_iter::<serde_json::Value>();
        match stream.next() {
            Some(Ok(value)) => Ok(Json::from_value(value)),
            Some(Err(e)) => Err(TreeError::Parse(e.to_string())),
            None => Err(TreeError::Parse("empty document".to_string())),
        }
    }

    fn from_value(value: serde_json::Value) -> Json {
        match value {
            serde_json::Value::Null => Json::Null,
            serde_json::Value::Bool(b) => Json::Bool(b),
            serde_json::Value::Number(n) => Json::Number(n.to_string()),
            serde_json::Value::String(s) => Json::String(s),
            serde_json::Value::Array(items) => {
                Json::Array(items.into_iter().map(Json::from_value).collect())
            }
            serde_json::Value::Object(members) => Json::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Json::from_value(v)))
                    .collect(),
            ),
        }
    }

    /// The value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Json::Null => "null",
            Json::Bool(_) => "bool",
            Json::Number(_) => "number",
            Json::String(_) => "string",
            Json::Object(_) => "object",
            Json::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Json::Null)
    }

    pub fn as_bool(&self) -> Result<bool, TreeError> {
        match self {
            Json::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, TreeError> {
        match self {
            Json::String(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    /// The number's source text.
    pub fn as_number(&self) -> Result<&str, TreeError> {
        match self {
            Json::Number(n) => Ok(n),
            other => Err(mismatch("number", other)),
        }
    }

    pub fn as_usize(&self) -> Result<usize, TreeError> {
        self.as_number()?
            .parse()
            .map_err(|_| mismatch("integer", self))
    }

    pub fn as_array(&self) -> Result<&[Json], TreeError> {
        match self {
            Json::Array(items) => Ok(items),
            other => Err(mismatch("array", other)),
        }
    }

    pub fn as_object(&self) -> Result<&[(String, Json)], TreeError> {
        match self {
            Json::Object(members) => Ok(members),
            other => Err(mismatch("object", other)),
        }
    }

    /// Looks up an object member without consuming it.
    pub fn get(&self, key: &str) -> Option<&Json> {
        match self {
            Json::Object(members) => members.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Removes and returns an object member; `None` when absent or when
    /// the value is not an object. Whatever is left after all pops is
    /// the document's opaque pass-through remainder.
    pub fn pop(&mut self, key: &str) -> Option<Json> {
        match self {
            Json::Object(members) => members
                .iter()
                .position(|(k, _)| k == key)
                .map(|i| members.remove(i).1),
            _ => None,
        }
    }

    /// Removes and returns a member that must exist.
    pub fn pop_required(&mut self, key: &str) -> Result<Json, TreeError> {
        self.pop(key)
            .ok_or_else(|| TreeError::MissingKey(key.to_string()))
    }

    /// Removes and returns a string member; `None` when absent.
    pub fn pop_string(&mut self, key: &str) -> Result<Option<String>, TreeError> {
        match self.pop(key) {
            Some(Json::String(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch("string", &other)),
            None => Ok(None),
        }
    }

    /// Consumes the remaining object members.
    pub fn into_members(self) -> Result<Vec<(String, Json)>, TreeError> {
        match self {
            Json::Object(members) => Ok(members),
            other => Err(mismatch("object", &other)),
        }
    }
}

fn mismatch(expected: &'static str, found: &Json) -> TreeError {
    TreeError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}
