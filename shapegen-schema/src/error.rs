//! Error types for entity document parsing and validation.

use thiserror::Error;

/// Error type for entity document parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Invalid document structure.
    #[error("invalid entity document: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Invalid character or entity reference.
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
}

/// Error type for entity validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Entity has no name.
    #[error("entity in namespace '{namespace}' has an empty name")]
    EmptyName {
        /// Namespace of the unnamed entity.
        namespace: String,
    },

    /// Field declared twice.
    #[error("duplicate field '{field}' in entity '{entity}'")]
    DuplicateField {
        /// Entity name.
        entity: String,
        /// Field name.
        field: String,
    },

    /// Invalid enum member.
    #[error("invalid enum case '{case}' in enum '{enum_name}': {reason}")]
    InvalidEnumCase {
        /// Enum name.
        enum_name: String,
        /// Case name.
        case: String,
        /// Why the case was rejected.
        reason: String,
    },

    /// Validation error.
    #[error("validation error: {message}")]
    Validation {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

impl SchemaError {
    /// Creates an invalid enum case error.
    pub fn enum_case(
        enum_name: impl Into<String>,
        case: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEnumCase {
            enum_name: enum_name.into(),
            case: case.into(),
            reason: reason.into(),
        }
    }
}
