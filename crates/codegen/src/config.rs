//! Generator configuration
//!
//! Loaded from an `ormgen.toml` file or built in code:
//!
//! ```toml
//! output_dir = "generated"
//! indent = "    "
//!
//! [java]
//! package = "com.example.model"
//!
//! [csharp]
//! namespace = "Sakila.Model"
//! context_name = "DataContext"
//!
//! [policy]
//! skip_views = true
//! skip_keyless = false
//! drop_without_definition = "irreversible"
//! ```

use crate::migrations::DropPolicy;
use ormgen_core::{EngineError, EngineResult, ResultExt, Validatable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up by the CLI
pub const CONFIG_FILE_NAME: &str = "ormgen.toml";

// ============================================================================
// Sections
// ============================================================================

/// Settings of the Java backends (Hibernate, jOOQ)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaConfig {
    /// Package of every generated class
    pub package: String,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            package: "com.example.model".to_string(),
        }
    }
}

impl JavaConfig {
    /// Source directory matching the package, e.g. `src/main/java/com/example`
    pub fn source_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from("src/main/java");
        for segment in self.package.split('.') {
            dir.push(segment);
        }
        dir
    }
}

/// Settings of the C# backends (Entity Framework, Dapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CSharpConfig {
    pub namespace: String,

    /// Name of the generated `DbContext`
    pub context_name: String,
}

impl Default for CSharpConfig {
    fn default() -> Self {
        Self {
            namespace: "App.Model".to_string(),
            context_name: "DataContext".to_string(),
        }
    }
}

/// Shape and reversal policies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Skip views even in backends that can represent them
    pub skip_views: bool,

    /// Skip tables without a primary key even in backends that can represent them
    pub skip_keyless: bool,

    /// How to reverse a dropped key whose definition is unknown; falls back to
    /// the migration backend's default
    pub drop_without_definition: Option<DropPolicy>,
}

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Configuration for the code generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Output directory for generated code
    pub output_dir: PathBuf,

    /// Indentation unit; each backend has its own default
    pub indent: Option<String>,

    pub java: JavaConfig,

    pub csharp: CSharpConfig,

    pub policy: PolicyConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated"),
            indent: None,
            java: JavaConfig::default(),
            csharp: CSharpConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text).with_context(format!("Loading '{}'", path.display()))
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the indentation unit
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    /// Set the Java package
    pub fn with_java_package(mut self, package: impl Into<String>) -> Self {
        self.java.package = package.into();
        self
    }

    /// Set the C# namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.csharp.namespace = namespace.into();
        self
    }

    /// Set the `DbContext` class name
    pub fn with_context_name(mut self, name: impl Into<String>) -> Self {
        self.csharp.context_name = name.into();
        self
    }

    /// Skip views in every backend
    pub fn skip_views(mut self) -> Self {
        self.policy.skip_views = true;
        self
    }

    /// Skip keyless tables in every backend
    pub fn skip_keyless(mut self) -> Self {
        self.policy.skip_keyless = true;
        self
    }

    /// Override the backend's drop policy
    pub fn with_drop_policy(mut self, policy: DropPolicy) -> Self {
        self.policy.drop_without_definition = Some(policy);
        self
    }
}

impl Validatable for GeneratorConfig {
    fn validate(&self) -> EngineResult<()> {
        if let Some(indent) = &self.indent {
            if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
                return Err(EngineError::InvalidConfig(format!(
                    "indent must be spaces or tabs, got {:?}",
                    indent
                )));
            }
        }
        if self.java.package.trim().is_empty() || self.java.package.split('.').any(str::is_empty)
        {
            return Err(EngineError::InvalidConfig(format!(
                "invalid Java package '{}'",
                self.java.package
            )));
        }
        if self.csharp.namespace.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "C# namespace must not be empty".to_string(),
            ));
        }
        if self.csharp.context_name.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "C# context name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
