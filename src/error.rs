use thiserror::Error;

/// Fatal misconfiguration. The triggering state change is aborted and nothing is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("if items contains object elements, {field} must be non null or non whitespace: {id}")]
    ObjectFieldRequired { id: String, field: &'static str },

    #[error("if items contains primitive elements, {field} must be null: {id}")]
    PrimitiveFieldForbidden { id: String, field: &'static str },

    #[error("if items contains primitive elements, shouldStoreItemValue must be null or true: {id}")]
    PrimitiveMustStoreValue { id: String },

    #[error("items must be uniformly primitive or uniformly objects (item {index} differs): {id}")]
    MixedItems { id: String, index: usize },

    #[error("item {index} is a {kind}, which cannot be selected: {id}")]
    UnsupportedItem {
        id: String,
        index: usize,
        kind: &'static str,
    },

    #[error("items must be array: {id}")]
    ItemsNotSequence { id: String },

    #[error("if isMultiple is set to true, value must be array: {id}")]
    ValueMustBeArray { id: String },

    #[error("if isMultiple is set to false, value must be object: {id}")]
    ValueMustBeScalar { id: String },

    #[error("if shouldStoreItemValue is set to true, value must be primitive: {id}")]
    ValueMustBePrimitive { id: String },

    #[error("if shouldStoreItemValue is set to false, value must be object: {id}")]
    ValueMustBeObject { id: String },

    #[error("value is not a valid list or object literal ({message}): {id}")]
    MalformedValue { id: String, message: String },

    #[error("invalid configuration: {message}")]
    MalformedConfig { message: String },
}

/// A rejected operation. State is left untouched.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("selectable is disabled or already opened: {id}")]
    AlreadyOpenOrDisabled { id: String },

    #[error("selectable is disabled or already closed: {id}")]
    AlreadyClosedOrDisabled { id: String },

    #[error("selectable is not open: {id}")]
    NotOpen { id: String },

    #[error("item is disabled: {id}")]
    ItemDisabled { id: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Presentation(anyhow::Error),
}
