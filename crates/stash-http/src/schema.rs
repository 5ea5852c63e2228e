//! JSON Schema for persisted cache metadata.

use std::sync::OnceLock;

use jsonschema::Draft;
use serde_json::Value;

use crate::error::{CacheError, CacheResult};

/// Embedded schema for cache_info_v1.
const CACHE_INFO_V1_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/cache_info_v1.schema.json"
));

static CACHE_INFO_V1: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Max violations reported in one message.
const MAX_ERRORS: usize = 5;

/// Compiled metadata schema.
#[derive(Clone)]
pub struct InfoSchema {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for InfoSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoSchema").finish_non_exhaustive()
    }
}

impl InfoSchema {
    /// The built-in cache_info_v1 schema, compiled once per process.
    pub fn cache_info_v1() -> CacheResult<Self> {
        let compiled = CACHE_INFO_V1
            .get_or_init(|| {
                let schema: Value = serde_json::from_str(CACHE_INFO_V1_SCHEMA_JSON)
                    .map_err(|e| format!("failed to parse embedded cache_info_v1 schema: {e}"))?;
                compile(&schema)
            })
            .as_ref()
            .map_err(|e| CacheError::Config { message: e.clone() })?;

        Ok(Self {
            validator: compiled.clone(),
        })
    }

    /// Compile a caller-supplied schema.
    pub fn from_value(schema: &Value) -> CacheResult<Self> {
        let validator = compile(schema).map_err(|message| CacheError::Config { message })?;
        Ok(Self { validator })
    }

    /// Validate an instance; the error lists the first few violations.
    pub fn validate(&self, instance: &Value) -> Result<(), String> {
        if self.validator.is_valid(instance) {
            return Ok(());
        }

        let lines: Vec<String> = self
            .validator
            .iter_errors(instance)
            .take(MAX_ERRORS)
            .map(|e| e.to_string())
            .collect();

        let mut msg = String::from("schema validation failed");
        if !lines.is_empty() {
            msg.push_str(": ");
            msg.push_str(&lines.join("; "));
        }
        Err(msg)
    }
}

fn compile(schema: &Value) -> Result<jsonschema::Validator, String> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|e| format!("failed to compile cache info schema: {e}"))
}
