//! ## Crate layout
//! - `core`: the engine (metadata, values, scopes, expressions, criteria,
//!   converter, configuration and observability).
//! - `error`: the stable public error taxonomy.
//!
//! The `prelude` module carries the vocabulary needed to build and
//! compile criteria.

pub use sqlcrit_core as core;

pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Re-exports
//

pub use crate::core::{
    config::{CompileConfig, PlaceholderStyle, QualifyMode},
    convert::CompiledCriteria,
    criteria::Criteria,
    obs::{metrics_report, metrics_reset_all, with_metrics_sink},
    scope::{CompilationScope, ParameterMap},
};
pub use error::Error;

/// Compile a criteria tree into its public result.
pub fn compile(criteria: &Criteria) -> Result<CompiledCriteria, Error> {
    criteria.compile().map_err(Error::from)
}

/// Parse a TOML configuration and open a scope over `metadata` with it.
pub fn scope_from_toml(
    metadata: impl crate::core::model::MetadataSource + 'static,
    source: &str,
) -> Result<CompilationScope, Error> {
    let config = CompileConfig::from_toml_str(source)?;

    Ok(CompilationScope::with_config(
        std::sync::Arc::new(metadata),
        config,
    ))
}

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        criteria::{Aggregate, Criteria, Direction, JoinKind, Selection},
        expr::{
            BetweenOp, CompareOp, Expression, FuzzyOp, NullOp, RangeOp, SkipReason, Slot,
            SubqueryOp, Wildcard,
        },
        model::{Column, EntityModel, MetadataRegistry, MetadataSource as _},
        scope::CompilationScope,
        value::{IntoValue as _, Value},
    };
    pub use crate::{CompileConfig, Error};
}
