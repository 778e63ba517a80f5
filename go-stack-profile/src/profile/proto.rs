//! pprof `profile.proto` message types
//!
//! Field numbers follow github.com/google/pprof/proto/profile.proto. Every
//! field the Go runtime writes is declared so that nothing is lost on a
//! decode/encode pass: prost drops fields it does not know about.
//!
//! All `i64` fields documented as "string" are indices into
//! [`Profile::string_table`].

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Profile {
    /// Meaning of each entry of `Sample::value`
    #[prost(message, repeated, tag = "1")]
    pub sample_type: Vec<ValueType>,
    #[prost(message, repeated, tag = "2")]
    pub sample: Vec<Sample>,
    #[prost(message, repeated, tag = "3")]
    pub mapping: Vec<Mapping>,
    #[prost(message, repeated, tag = "4")]
    pub location: Vec<Location>,
    #[prost(message, repeated, tag = "5")]
    pub function: Vec<Function>,
    /// `string_table[0]` is always ""
    #[prost(string, repeated, tag = "6")]
    pub string_table: Vec<String>,
    /// string
    #[prost(int64, tag = "7")]
    pub drop_frames: i64,
    /// string
    #[prost(int64, tag = "8")]
    pub keep_frames: i64,
    #[prost(int64, tag = "9")]
    pub time_nanos: i64,
    #[prost(int64, tag = "10")]
    pub duration_nanos: i64,
    #[prost(message, optional, tag = "11")]
    pub period_type: Option<ValueType>,
    #[prost(int64, tag = "12")]
    pub period: i64,
    /// strings
    #[prost(int64, repeated, tag = "13")]
    pub comment: Vec<i64>,
    /// string
    #[prost(int64, tag = "14")]
    pub default_sample_type: i64,
    /// string
    #[prost(int64, tag = "15")]
    pub doc_url: i64,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct ValueType {
    /// string, e.g. "goroutine"
    #[prost(int64, tag = "1")]
    pub r#type: i64,
    /// string, e.g. "count"
    #[prost(int64, tag = "2")]
    pub unit: i64,
}

/// One stack with its measured values
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Sample {
    /// Leaf first
    #[prost(uint64, repeated, tag = "1")]
    pub location_id: Vec<u64>,
    /// Aligned with `Profile::sample_type`
    #[prost(int64, repeated, tag = "2")]
    pub value: Vec<i64>,
    #[prost(message, repeated, tag = "3")]
    pub label: Vec<Label>,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Label {
    /// string
    #[prost(int64, tag = "1")]
    pub key: i64,
    /// string
    #[prost(int64, tag = "2")]
    pub str: i64,
    #[prost(int64, tag = "3")]
    pub num: i64,
    /// string
    #[prost(int64, tag = "4")]
    pub num_unit: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Mapping {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub memory_start: u64,
    #[prost(uint64, tag = "3")]
    pub memory_limit: u64,
    #[prost(uint64, tag = "4")]
    pub file_offset: u64,
    /// string
    #[prost(int64, tag = "5")]
    pub filename: i64,
    /// string
    #[prost(int64, tag = "6")]
    pub build_id: i64,
    #[prost(bool, tag = "7")]
    pub has_functions: bool,
    #[prost(bool, tag = "8")]
    pub has_filenames: bool,
    #[prost(bool, tag = "9")]
    pub has_line_numbers: bool,
    #[prost(bool, tag = "10")]
    pub has_inline_frames: bool,
}

/// A program location, possibly covering several inlined functions
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Location {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub mapping_id: u64,
    #[prost(uint64, tag = "3")]
    pub address: u64,
    /// Innermost inlined function first; the last entry is the physical frame
    #[prost(message, repeated, tag = "4")]
    pub line: Vec<Line>,
    #[prost(bool, tag = "5")]
    pub is_folded: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message)]
pub struct Line {
    #[prost(uint64, tag = "1")]
    pub function_id: u64,
    #[prost(int64, tag = "2")]
    pub line: i64,
    #[prost(int64, tag = "3")]
    pub column: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Function {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    /// string
    #[prost(int64, tag = "2")]
    pub name: i64,
    /// string
    #[prost(int64, tag = "3")]
    pub system_name: i64,
    /// string
    #[prost(int64, tag = "4")]
    pub filename: i64,
    #[prost(int64, tag = "5")]
    pub start_line: i64,
}
