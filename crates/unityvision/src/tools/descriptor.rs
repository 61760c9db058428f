//! Tool descriptors — schema and execution metadata for callable operations.
//!
//! Serialized form is the registration export schema sent to clients:
//!
//! ```json
//! {
//!   "name": "asset_import",
//!   "description": "Import an asset into the open project.",
//!   "structured_output": true,
//!   "requires_polling": true,
//!   "poll_action": "asset_import_status",
//!   "parameters": [
//!     { "name": "path", "description": "Asset path", "type": "string",
//!       "required": true }
//!   ]
//! }
//! ```
//!
//! The `asynchronous` flag selects the execution contract inside the
//! dispatcher and is not part of the exported schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter value kinds accepted by tool schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ToolParameter {
    /// A required parameter with no default.
    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: ParameterKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
            default_value: None,
        }
    }

    /// An optional parameter, with or without a default value.
    pub fn optional(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: ParameterKind,
        default_value: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            default_value,
        }
    }
}

/// Schema and execution metadata for one callable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique key within a catalog.
    pub name: String,
    pub description: String,
    /// Whether the result is machine-structured rather than free text.
    pub structured_output: bool,
    /// Whether completion must be observed via a second named operation
    /// rather than the immediate response.
    pub requires_polling: bool,
    /// The operation to poll when `requires_polling` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_action: Option<String>,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ToolParameter>,
    /// Execution contract: completion-slot based when true. Not exported.
    #[serde(skip)]
    pub asynchronous: bool,
}

impl ToolDescriptor {
    /// Start building a descriptor. Defaults: structured output, synchronous,
    /// no polling, no parameters.
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ToolDescriptorBuilder {
        ToolDescriptorBuilder {
            descriptor: Self {
                name: name.into(),
                description: description.into(),
                structured_output: true,
                requires_polling: false,
                poll_action: None,
                parameters: Vec::new(),
                asynchronous: false,
            },
        }
    }
}

/// Chained builder for [`ToolDescriptor`].
pub struct ToolDescriptorBuilder {
    descriptor: ToolDescriptor,
}

impl ToolDescriptorBuilder {
    /// Append a parameter.
    pub fn parameter(mut self, parameter: ToolParameter) -> Self {
        self.descriptor.parameters.push(parameter);
        self
    }

    /// Mark the result as free text rather than structured.
    pub fn unstructured(mut self) -> Self {
        self.descriptor.structured_output = false;
        self
    }

    /// Select the asynchronous (completion slot) execution contract.
    pub fn asynchronous(mut self) -> Self {
        self.descriptor.asynchronous = true;
        self
    }

    /// Signal that completion is observed by invoking `poll_action`.
    pub fn polling(mut self, poll_action: impl Into<String>) -> Self {
        self.descriptor.requires_polling = true;
        self.descriptor.poll_action = Some(poll_action.into());
        self
    }

    pub fn build(self) -> ToolDescriptor {
        self.descriptor
    }
}
