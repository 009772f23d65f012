//! Layer structure of the board, as seen by the rules parser.
//!
//! The rules file refers to layers by name; the board stores them by index.
//! This structure only provides the name/index lookup - the geometric layer
//! data lives with the host board and is never touched here.

use serde::Serialize;

/// Ordered sequence of named layers with stable indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStructure {
    names: Vec<String>,
}

impl LayerStructure {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Index of the layer with the given name, if it exists.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Name of the layer at the given index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
