//! Core engine for sqlcrit: entity metadata, bind values, compilation
//! scopes, expressions, criteria and the SQL converter.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod convert;
pub mod criteria;
pub mod error;
pub mod expr;
pub mod model;
pub mod obs;
pub mod scope;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary needed to build and compile
/// criteria. Errors and observability live in their modules.
///

pub mod prelude {
    pub use crate::{
        criteria::{Aggregate, Criteria, JoinKind, Selection},
        expr::{Expression, SkipReason, Slot, SubqueryOp, Wildcard},
        model::{Column, EntityModel, MetadataRegistry, MetadataSource},
        scope::CompilationScope,
        value::{IntoValue, Value},
    };
}
