//! Error code constants shared by diagnostics rendering.
//!
//! An `E0xxx` family, one block per error kind (lex, parse, name/type/value,
//! struct, module).

pub const E_LEX: &str = "E0100";
pub const E_PARSE: &str = "E0200";
pub const E_TRANSFORM: &str = "E0210";

pub const E_NAME: &str = "E0300";
pub const E_TYPE: &str = "E0301";
pub const E_VALUE: &str = "E0302";
pub const E_INDEX: &str = "E0303";
pub const E_KEY: &str = "E0304";
pub const E_ATTRIBUTE: &str = "E0305";

pub const E_STRUCT_MISSING_FIELDS: &str = "E0400";
pub const E_STRUCT_UNKNOWN_FIELDS: &str = "E0401";
pub const E_STRUCT_NO_METHOD: &str = "E0402";

pub const E_IMPORT: &str = "E0500";
pub const E_MODULE_NOT_FOUND: &str = "E0501";
pub const E_CIRCULAR_IMPORT: &str = "E0502";

pub const E_ASSERTION: &str = "E0600";
pub const E_RUNTIME: &str = "E0700";
