//! Profile wire format.
//!
//! The persisted artifact is the protobuf encoding of [`Profile`]; the
//! same messages carry serde derives so a profile can also travel as
//! JSON for interchange and tests. Every `*_id` field is a 1-based index
//! into the corresponding table; 0 means absent and is only used for a
//! root context's `parent_id`. `Location.line` is a list of
//! {function_id, line} pairs to leave room for inlined frames, though
//! the builder only ever emits one.

use serde::{Deserialize, Serialize};

/// Discriminant for [`MetricType::kind`] / the [`MetricValue`] union.
pub const METRIC_KIND_INT: i64 = 0;
pub const METRIC_KIND_UINT: i64 = 1;
pub const METRIC_KIND_STR: i64 = 2;

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Profile {
    #[prost(message, repeated, tag = "1")]
    pub metric_type: Vec<MetricType>,
    #[prost(message, repeated, tag = "2")]
    pub sample: Vec<Sample>,
    #[prost(message, repeated, tag = "3")]
    pub context: Vec<Context>,
    #[prost(message, repeated, tag = "4")]
    pub location: Vec<Location>,
    #[prost(message, repeated, tag = "5")]
    pub function: Vec<Function>,
    #[prost(message, repeated, tag = "6")]
    pub source_file: Vec<SourceFile>,
    #[prost(string, repeated, tag = "7")]
    pub string_table: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct MetricType {
    /// One of the `METRIC_KIND_*` discriminants.
    #[prost(int64, tag = "1")]
    pub kind: i64,
    /// Index into the string table.
    #[prost(int64, tag = "2")]
    pub unit: i64,
    /// Index into the string table.
    #[prost(int64, tag = "3")]
    pub desc: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Sample {
    /// Leaf context of the captured stack.
    #[prost(uint64, tag = "1")]
    pub context_id: u64,
    /// One value per declared metric type, in order.
    #[prost(message, repeated, tag = "2")]
    pub metric: Vec<MetricValue>,
}

/// Wire union for one metric value; exactly one field is meaningful,
/// selected by the declared metric kind.
#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct MetricValue {
    #[prost(int64, tag = "1")]
    pub int_value: i64,
    #[prost(uint64, tag = "2")]
    pub uint_value: u64,
    /// Index into the string table.
    #[prost(int64, tag = "3")]
    pub str_value: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Context {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub location_id: u64,
    /// 0 for a root context.
    #[prost(uint64, tag = "3")]
    pub parent_id: u64,
    #[prost(uint64, repeated, tag = "4")]
    pub children_id: Vec<u64>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Location {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(message, repeated, tag = "2")]
    pub line: Vec<Line>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Line {
    #[prost(uint64, tag = "1")]
    pub function_id: u64,
    #[prost(int64, tag = "2")]
    pub line: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct Function {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// Index into the string table.
    #[prost(int64, tag = "2")]
    pub name: i64,
    /// Index into the string table.
    #[prost(int64, tag = "3")]
    pub system_name: i64,
    #[prost(uint64, tag = "4")]
    pub source_file_id: u64,
    #[prost(int64, tag = "5")]
    pub start_line: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message, Serialize, Deserialize)]
pub struct SourceFile {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// Index into the string table.
    #[prost(int64, tag = "2")]
    pub filename: i64,
    /// Index into the string table.
    #[prost(int64, tag = "3")]
    pub directory: i64,
    #[prost(int64, tag = "4")]
    pub kind: i64,
}
