//! Profile aggregation.
//!
//! A [`ProfileBuilder`] consumes captured stack traces plus per-event
//! metric values, folds them into a deduplicated call tree with interned
//! string/function/location tables, and serializes the result to the
//! wire format. One builder per report; no state leaks across reports.

pub mod tables;
pub mod wire;

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use prost::Message;

use crate::domain::ReportError;
use crate::profile::tables::{
    ContextTable, FunctionEntry, LocationEntry, SourceFileEntry, StringTable, UniqueTable,
};
use crate::stacktrace::StackTrace;

/// Kind of one metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Int,
    Uint,
    Str,
}

impl MetricKind {
    fn discriminant(self) -> i64 {
        match self {
            MetricKind::Int => wire::METRIC_KIND_INT,
            MetricKind::Uint => wire::METRIC_KIND_UINT,
            MetricKind::Str => wire::METRIC_KIND_STR,
        }
    }
}

/// Declaration of one metric column: kind plus unit/description strings.
#[derive(Debug, Clone)]
pub struct MetricDesc {
    pub kind: MetricKind,
    pub unit: String,
    pub description: String,
}

impl MetricDesc {
    pub fn int(unit: &str, description: &str) -> Self {
        MetricDesc { kind: MetricKind::Int, unit: unit.to_string(), description: description.to_string() }
    }

    pub fn unsigned(unit: &str, description: &str) -> Self {
        MetricDesc { kind: MetricKind::Uint, unit: unit.to_string(), description: description.to_string() }
    }

    pub fn string(unit: &str, description: &str) -> Self {
        MetricDesc { kind: MetricKind::Str, unit: unit.to_string(), description: description.to_string() }
    }
}

/// One scalar metric value, converted into the wire union by the
/// column's declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Int(i64),
    Uint(u64),
    Str(String),
}

impl MetricValue {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn to_wire(&self, declared: MetricKind, strings: &mut StringTable) -> wire::MetricValue {
        let mut value = wire::MetricValue::default();
        match (declared, self) {
            (MetricKind::Int, MetricValue::Int(v)) => value.int_value = *v,
            (MetricKind::Int, MetricValue::Uint(v)) => value.int_value = *v as i64,
            (MetricKind::Uint, MetricValue::Uint(v)) => value.uint_value = *v,
            (MetricKind::Uint, MetricValue::Int(v)) => value.uint_value = *v as u64,
            (MetricKind::Str, MetricValue::Str(s)) => value.str_value = strings.intern(s),
            (declared, provided) => {
                warn!("metric value {provided:?} does not fit declared kind {declared:?}");
            }
        }
        value
    }
}

struct MetricColumn {
    kind: MetricKind,
    unit: i64,
    desc: i64,
}

struct SampleEntry {
    context_id: u64,
    metric: Vec<wire::MetricValue>,
}

/// Builds one profile from captured events.
pub struct ProfileBuilder {
    metric_types: Vec<MetricColumn>,
    strings: StringTable,
    samples: Vec<SampleEntry>,
    contexts: ContextTable,
    locations: UniqueTable<LocationEntry>,
    functions: UniqueTable<FunctionEntry>,
    source_files: UniqueTable<SourceFileEntry>,
}

impl ProfileBuilder {
    /// The metric descriptors are interned into the shared string table
    /// immediately.
    pub fn new(metrics: Vec<MetricDesc>) -> Self {
        let mut strings = StringTable::new();
        let metric_types = metrics
            .into_iter()
            .map(|m| MetricColumn {
                kind: m.kind,
                unit: strings.intern(&m.unit),
                desc: strings.intern(&m.description),
            })
            .collect();
        ProfileBuilder {
            metric_types,
            strings,
            samples: Vec::new(),
            contexts: ContextTable::new(),
            locations: UniqueTable::new(),
            functions: UniqueTable::new(),
            source_files: UniqueTable::new(),
        }
    }

    /// Fold one captured event into the call tree and emit its sample.
    ///
    /// Frames are walked root-to-leaf (the reverse of capture order),
    /// interning SourceFile → Function → Location → Context per frame so
    /// shared call prefixes collapse onto the same context chain. An
    /// event whose trace has no frames left is dropped: a sample without
    /// a context would be undecodable.
    pub fn add_event(&mut self, trace: &StackTrace, values: &[MetricValue]) {
        if trace.is_empty() {
            warn!("dropping event with no frames after filtering");
            return;
        }
        if values.len() != self.metric_types.len() {
            warn!(
                "event carries {} metric values, profile declares {}",
                values.len(),
                self.metric_types.len()
            );
        }

        let mut parent_id = 0u64;
        for frame in trace.frames().iter().rev() {
            let filename = self.strings.intern(&frame.file);
            let directory = self.strings.intern(&frame.directory);
            let source_file_id =
                self.source_files.intern(SourceFileEntry { filename, directory, kind: 0 });

            let name = self.strings.intern(frame.display_name());
            let system_name = self.strings.intern(&frame.system_name);
            let function_id = self.functions.intern(FunctionEntry {
                name,
                system_name,
                source_file_id,
                start_line: frame.line,
            });

            let location_id =
                self.locations.intern(LocationEntry { function_id, line: frame.line });
            parent_id = self.contexts.intern(location_id, parent_id);
        }

        let metric = self
            .metric_types
            .iter()
            .zip(values)
            .map(|(column, value)| value.to_wire(column.kind, &mut self.strings))
            .collect();
        self.samples.push(SampleEntry { context_id: parent_id, metric });
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Assemble the full wire profile. Tables serialize in interning
    /// order, so every referenced id points backward within bounds.
    #[allow(clippy::cast_possible_wrap)]
    pub fn build(&self) -> wire::Profile {
        wire::Profile {
            metric_type: self
                .metric_types
                .iter()
                .map(|column| wire::MetricType {
                    kind: column.kind.discriminant(),
                    unit: column.unit,
                    desc: column.desc,
                })
                .collect(),
            sample: self
                .samples
                .iter()
                .map(|sample| wire::Sample {
                    context_id: sample.context_id,
                    metric: sample.metric.clone(),
                })
                .collect(),
            context: self
                .contexts
                .nodes()
                .iter()
                .enumerate()
                .map(|(index, node)| wire::Context {
                    id: index as u64 + 1,
                    location_id: node.location_id,
                    parent_id: node.parent_id,
                    children_id: node.children.clone(),
                })
                .collect(),
            location: self
                .locations
                .elements()
                .iter()
                .enumerate()
                .map(|(index, entry)| wire::Location {
                    id: index as u64 + 1,
                    line: vec![wire::Line {
                        function_id: entry.function_id,
                        line: i64::from(entry.line),
                    }],
                })
                .collect(),
            function: self
                .functions
                .elements()
                .iter()
                .enumerate()
                .map(|(index, entry)| wire::Function {
                    id: index as u64 + 1,
                    name: entry.name,
                    system_name: entry.system_name,
                    source_file_id: entry.source_file_id,
                    start_line: i64::from(entry.start_line),
                })
                .collect(),
            source_file: self
                .source_files
                .elements()
                .iter()
                .enumerate()
                .map(|(index, entry)| wire::SourceFile {
                    id: index as u64 + 1,
                    filename: entry.filename,
                    directory: entry.directory,
                    kind: entry.kind,
                })
                .collect(),
            string_table: self.strings.strings().to_vec(),
        }
    }

    /// Protobuf encoding of the profile.
    pub fn encode(&self) -> Vec<u8> {
        self.build().encode_to_vec()
    }

    /// JSON rendition of the profile, for interchange and tests.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.build())
    }

    /// Serialize and write the profile in a single atomic step: the
    /// bytes land in a sibling temp file first, then rename into place.
    pub fn write_file(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = self.encode();
        let tmp = tmp_sibling(path);
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path).map_err(|e| {
            ReportError::WriteFailed(format!("renaming {} into place: {e}", tmp.display()))
        })?;
        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
