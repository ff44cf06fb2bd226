//! Bound parameters collected during one translation.

use crate::value::Value;

/// A placeholder name and the value bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    /// Placeholder exactly as it appears in the SQL text, e.g. `@p0`
    pub name: String,
    pub value: Value,
}

/// Hands out unique placeholders for one translation session.
///
/// Parameters are recorded in creation order, so rendering leaves left
/// to right keeps the list aligned with placeholder order in the text.
#[derive(Debug)]
pub struct ParameterCreator {
    marker: char,
    parameters: Vec<BoundParameter>,
}

impl ParameterCreator {
    pub fn new(marker: char) -> Self {
        Self {
            marker,
            parameters: Vec::new(),
        }
    }

    /// Bind `value` and return its placeholder
    pub fn create(&mut self, value: Value) -> String {
        let name = format!("{}p{}", self.marker, self.parameters.len());
        self.parameters.push(BoundParameter {
            name: name.clone(),
            value,
        });
        name
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn into_parameters(self) -> Vec<BoundParameter> {
        self.parameters
    }
}
