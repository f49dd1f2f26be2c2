//! Shared utility functions for passk-eval.
//!
//! This module provides common utilities used across multiple modules,
//! including source extraction from generation responses.

pub mod code_extraction;

pub use code_extraction::{
    extract_code, extract_code_from_response, extract_fenced_block, response_text,
};
