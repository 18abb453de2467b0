//! Argument validation against a tool's declared JSON schema

use serde_json::Value;
use tracing::error;

use super::ToolError;

/// Compiled form of a tool's parameter schema
pub struct ArgumentValidator {
    compiled: Result<jsonschema::Validator, String>,
}

impl ArgumentValidator {
    /// Compile once at registration; a broken schema is reported on every call
    pub fn compile(schema: &Value) -> Self {
        let compiled = jsonschema::validator_for(schema).map_err(|e| {
            error!("Invalid tool schema: {}", e);
            e.to_string()
        });
        Self { compiled }
    }

    pub fn validate(&self, args: &Value) -> Result<(), ToolError> {
        let validator = self
            .compiled
            .as_ref()
            .map_err(|e| ToolError::fatal(format!("invalid tool schema: {}", e)))?;

        if validator.is_valid(args) {
            return Ok(());
        }
        let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
        Err(ToolError::InvalidArguments(errors.join("; ")))
    }
}
