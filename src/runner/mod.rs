//! Sandboxed test execution for generated code.
//!
//! This module runs one candidate program against one test script in an
//! isolated, disposable directory and reports the outcome.
//!
//! # Architecture
//!
//! ```text
//! candidate source ─┐
//!                   ├→ TempDir ─→ interpreter test_script.py ─→ SampleResult
//! test script ──────┘   (removed on every exit path)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use std::time::Duration;
//! use passk_eval::runner::{Sandbox, SandboxConfig};
//!
//! let sandbox = Sandbox::new(SandboxConfig::new().with_timeout(Duration::from_secs(5)));
//! let result = sandbox
//!     .execute("def add(a, b):\n    return a + b\n", Path::new("tests/test_add.py"))
//!     .await;
//!
//! println!("passed: {} (exit {})", result.passed, result.exit_code);
//! ```

pub mod result;
pub mod sandbox;

pub use result::SampleResult;
pub use sandbox::{Sandbox, SandboxConfig};
