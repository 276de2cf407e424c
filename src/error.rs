//! Error types for the record store and the rechit exporter.

use std::fmt;

use crate::store::PropertyType;

/// Contract violations raised by the record store.
///
/// These indicate a programming error in a producer, never bad input data.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A property name was re-declared with a different type.
    TypeConflict {
        collection: String,
        property: String,
        declared: PropertyType,
        requested: PropertyType,
    },
    /// A value of the wrong type was assigned to a property.
    TypeMismatch {
        collection: String,
        property: String,
        declared: PropertyType,
        got: PropertyType,
    },
    /// A property or item handle was used against a collection that did not issue it.
    ForeignHandle { collection: String },
    /// A property name that was never declared.
    UnknownProperty {
        collection: String,
        property: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::TypeConflict {
                collection,
                property,
                declared,
                requested,
            } => write!(
                f,
                "{collection}.{property}: already declared as {declared}, cannot redeclare as {requested}"
            ),
            StoreError::TypeMismatch {
                collection,
                property,
                declared,
                got,
            } => write!(
                f,
                "{collection}.{property}: expected {declared} value, got {got}"
            ),
            StoreError::ForeignHandle { collection } => {
                write!(f, "{collection}: handle does not belong to this collection")
            }
            StoreError::UnknownProperty {
                collection,
                property,
            } => write!(f, "{collection}.{property}: property is not declared"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors raised while configuring or running a rechit exporter.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Required configuration or service is unavailable at construction time.
    MissingDependency { module: String, message: String },
    /// Geometry record or hit collection missing for one event.
    ///
    /// Reported to the error sink and skipped; never returned from `analyze`.
    MissingOrInvalidInput { module: String, what: String },
    /// A resolved cell broke the geometry contract (corner count, missing cell).
    GeometryContractViolation {
        module: String,
        detid: u32,
        message: String,
    },
    /// The record store rejected a write.
    Store(StoreError),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::MissingDependency { module, message } => {
                write!(f, "{module}: missing dependency: {message}")
            }
            ExportError::MissingOrInvalidInput { module, what } => {
                write!(f, "### Error: {module} {what}")
            }
            ExportError::GeometryContractViolation {
                module,
                detid,
                message,
            } => write!(
                f,
                "{module}: geometry contract violated for detid {detid:#010x}: {message}"
            ),
            ExportError::Store(e) => write!(f, "record store: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ExportError {
    fn from(e: StoreError) -> Self {
        ExportError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message_prefix() {
        let err = ExportError::MissingOrInvalidInput {
            module: "EERecHits".to_string(),
            what: "EcalRecHitCollection:L:I:P are not found.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "### Error: EERecHits EcalRecHitCollection:L:I:P are not found."
        );
    }

    #[test]
    fn test_store_error_source() {
        use std::error::Error;
        let err = ExportError::from(StoreError::ForeignHandle {
            collection: "A_V1".to_string(),
        });
        assert!(err.source().is_some());
    }
}
