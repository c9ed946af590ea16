//! The normalized schema model: type tags, field specs, paths, and the
//! closed operator/aggregate/interval vocabularies of the filter IR.

mod aggregate;
mod enum_values;
mod field_kind;
mod field_path;
mod field_spec;
mod interval;
mod operator;

pub use aggregate::AggregateKind;
pub use enum_values::EnumValues;
pub use field_kind::FieldKind;
pub use field_path::FieldPath;
pub use field_spec::{FieldMap, FieldSpec};
pub use interval::Interval;
pub use operator::{HavingOperator, Operator};
