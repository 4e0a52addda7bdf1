//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// Member key under which a constructed schema object is attached to its carrier
pub const ATTACHED_SCHEMA_KEY: &str = "@SchemaObject";

/// Seed token constants
pub mod seed {
    /// Number of hex characters kept from the hashed token
    pub const LENGTH: usize = 20;
}

/// Schema node defaults
pub mod node {
    /// Declared type shared by every picker-driven node
    pub const PICKER_NODE_TYPE: &str = "CreateSchemaObject";

    pub const PICKER_NODE_NAME: &str = "Create Schema Object";

    pub const PICKER_NODE_DESCRIPTION: &str =
        "Allows you to create an interchange object by selecting a schema template.";

    /// Output label before a template is bound
    pub const DEFAULT_OUTPUT_LABEL: &str = "Schema Object";
}

/// Node document constants
pub mod document {
    /// Maximum number of sibling nodes considered by the uniqueness scan
    pub const SIBLING_SCAN_CAP: usize = 10_000;

    /// Quiet period before a slot rename triggers re-evaluation (milliseconds)
    pub const NAME_EDIT_DEBOUNCE_MS: u64 = 400;

    /// Document units used when no settings override them
    pub const DEFAULT_UNITS: &str = "m";

    /// Save file format version
    pub const SAVE_FORMAT_VERSION: &str = "1.0";
}

/// Node interface constants
pub mod slot {
    /// Characters tried, in order, when inventing a nickname for a new free-form slot
    pub const NICKNAME_ALPHABET: &str = "ABCD";

    /// Description shown on choice-list helper nodes
    pub const CHOICE_LIST_DESCRIPTION: &str = "Select an option...";
}

/// User-visible messages raised on schema nodes
pub mod messages {
    pub const TEMPLATE_UNRESOLVED: &str =
        "This component has changed or cannot be found, please create a new one";
    pub const NO_TEMPLATE: &str = "No schema has been selected.";
    pub const ATTACH_UNSUPPORTED: &str =
        "Schema tag is not supported for this object type, will return Schema object instead.";
}
