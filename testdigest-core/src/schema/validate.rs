// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::model::*;
use crate::errors::{ValidationError, ValidationIssue};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Validates a decoded report and converts it into a [`RawReport`].
///
/// Only the fields needed to normalize a report are required; every other field may be absent
/// or `null`, and unknown fields are ignored. When present, fields must have the expected type.
///
/// All issues are collected before returning, so the returned [`ValidationError`] lists every
/// structural problem in the report.
pub fn validate(raw: &Value) -> Result<RawReport, ValidationError> {
    let mut validator = Validator::default();
    let report = validator.report(raw);
    if validator.issues.is_empty() {
        Ok(report)
    } else {
        Err(ValidationError::from_issues(validator.issues))
    }
}

#[derive(Copy, Clone, Debug)]
enum Expected {
    String,
    Integer,
    PositiveInteger,
    Number,
    Array,
    Object,
    ShardDescriptor,
}

impl Expected {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::PositiveInteger => "positive integer",
            Self::Number => "number",
            Self::Array => "array",
            Self::Object => "object",
            Self::ShardDescriptor => "object or array",
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Presence {
    Required,
    Optional,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns the value at `key`, treating `null` the same as absent.
fn present<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|value| !value.is_null())
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}

#[derive(Debug, Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn mismatch(&mut self, path: &str, expected: Expected, found: &Value) {
        let message = format!("{path}: expected {expected}, found {}", json_type(found));
        self.issues
            .push(ValidationIssue::new(path, expected.as_str(), message));
    }

    fn missing(&mut self, path: &str, expected: Expected) {
        let message = format!("{path}: required {expected} is missing");
        self.issues
            .push(ValidationIssue::new(path, expected.as_str(), message));
    }

    fn lookup<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        parent: &str,
        key: &str,
        expected: Expected,
        presence: Presence,
    ) -> Option<&'v Value> {
        let value = present(obj, key);
        if value.is_none() && presence == Presence::Required {
            self.missing(&child_path(parent, key), expected);
        }
        value
    }

    fn as_object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(obj) => Some(obj),
            other => {
                self.mismatch(path, Expected::Object, other);
                None
            }
        }
    }

    fn string(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        presence: Presence,
    ) -> Option<String> {
        match self.lookup(obj, parent, key, Expected::String, presence)? {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch(&child_path(parent, key), Expected::String, other);
                None
            }
        }
    }

    fn required_string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> String {
        self.string(obj, parent, key, Presence::Required)
            .unwrap_or_default()
    }

    fn optional_string(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<String> {
        self.string(obj, parent, key, Presence::Optional)
    }

    fn optional_u32(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<u32> {
        let value = self.lookup(obj, parent, key, Expected::Integer, Presence::Optional)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) => Some(n),
            None => {
                self.mismatch(&child_path(parent, key), Expected::Integer, value);
                None
            }
        }
    }

    fn optional_i64(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<i64> {
        let value = self.lookup(obj, parent, key, Expected::Integer, Presence::Optional)?;
        match value.as_i64() {
            Some(n) => Some(n),
            None => {
                self.mismatch(&child_path(parent, key), Expected::Integer, value);
                None
            }
        }
    }

    fn required_positive(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> u64 {
        let Some(value) = self.lookup(
            obj,
            parent,
            key,
            Expected::PositiveInteger,
            Presence::Required,
        ) else {
            return 0;
        };
        match value.as_u64() {
            Some(n) if n > 0 => n,
            _ => {
                self.mismatch(&child_path(parent, key), Expected::PositiveInteger, value);
                0
            }
        }
    }

    fn optional_number(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
    ) -> Option<f64> {
        let value = self.lookup(obj, parent, key, Expected::Number, Presence::Optional)?;
        match value.as_f64() {
            Some(n) => Some(n),
            None => {
                self.mismatch(&child_path(parent, key), Expected::Number, value);
                None
            }
        }
    }

    fn array<T>(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        presence: Presence,
        mut element: impl FnMut(&mut Self, &Value, &str) -> Option<T>,
    ) -> Vec<T> {
        let Some(value) = self.lookup(obj, parent, key, Expected::Array, presence) else {
            return Vec::new();
        };
        let path = child_path(parent, key);
        match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| element(self, item, &format!("{path}[{index}]")))
                .collect(),
            other => {
                self.mismatch(&path, Expected::Array, other);
                Vec::new()
            }
        }
    }

    fn report(&mut self, value: &Value) -> RawReport {
        let Some(obj) = self.as_object(value, "$") else {
            return RawReport::default();
        };

        let config = match present(obj, "config") {
            Some(config) => self.config(config, "$.config"),
            None => ReportConfig::default(),
        };
        let suites = self.array(obj, "$", "suites", Presence::Required, Self::suite);
        let stats = present(obj, "stats").and_then(|stats| self.stats(stats, "$.stats"));

        RawReport {
            config,
            suites,
            stats,
        }
    }

    fn config(&mut self, value: &Value, path: &str) -> ReportConfig {
        let Some(obj) = self.as_object(value, path) else {
            return ReportConfig::default();
        };

        let projects = self.array(obj, path, "projects", Presence::Optional, |this, v, p| {
            let obj = this.as_object(v, p)?;
            Some(ProjectDecl {
                name: this.optional_string(obj, p, "name"),
                id: this.optional_string(obj, p, "id"),
            })
        });

        let shard_path = child_path(path, "shard");
        let shards = match present(obj, "shard") {
            None => None,
            Some(Value::Object(_)) => {
                Some(self.shard_descriptor(&obj["shard"], &shard_path).into_iter().collect())
            }
            Some(Value::Array(_)) => Some(self.array(
                obj,
                path,
                "shard",
                Presence::Optional,
                Self::shard_descriptor,
            )),
            Some(other) => {
                self.mismatch(&shard_path, Expected::ShardDescriptor, other);
                None
            }
        };

        let metadata = match present(obj, "metadata") {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(other) => {
                self.mismatch(&child_path(path, "metadata"), Expected::Object, other);
                None
            }
        };

        ReportConfig {
            projects,
            shards,
            metadata,
            version: self.optional_string(obj, path, "version"),
        }
    }

    fn shard_descriptor(&mut self, value: &Value, path: &str) -> Option<ShardDescriptor> {
        let obj = self.as_object(value, path)?;
        let current = self.required_positive(obj, path, "current");
        let total = self.required_positive(obj, path, "total");
        if current == 0 || total == 0 {
            return None;
        }
        if current > total {
            // Shard consistency is checked when runs are aggregated.
            debug!("{path}: shard {current} exceeds the shard total {total}");
        }
        Some(ShardDescriptor { current, total })
    }

    fn stats(&mut self, value: &Value, path: &str) -> Option<ReportStats> {
        let obj = self.as_object(value, path)?;
        Some(ReportStats {
            start_time: self.optional_string(obj, path, "startTime"),
            duration_ms: self.optional_number(obj, path, "duration"),
        })
    }

    /// Reads `file`, `line` and `column` directly from `obj`.
    fn inline_location(&mut self, obj: &Map<String, Value>, path: &str) -> RawLocation {
        RawLocation {
            file: self.optional_string(obj, path, "file"),
            line: self.optional_u32(obj, path, "line"),
            column: self.optional_u32(obj, path, "column"),
        }
    }

    /// Reads a location object stored under `obj[key]`.
    fn nested_location(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<RawLocation> {
        let value = present(obj, key)?;
        let path = child_path(path, key);
        let obj = self.as_object(value, &path)?;
        Some(self.inline_location(obj, &path))
    }

    fn suite(&mut self, value: &Value, path: &str) -> Option<Suite> {
        let obj = self.as_object(value, path)?;

        let title = self.required_string(obj, path, "title");
        let location = self.inline_location(obj, path);
        let suites = self.array(obj, path, "suites", Presence::Optional, Self::suite);
        let specs = self.array(obj, path, "specs", Presence::Optional, Self::spec);
        let test_cases = self.array(obj, path, "tests", Presence::Optional, Self::test_case);

        let leaves = specs
            .into_iter()
            .map(LeafNode::Spec)
            .chain(test_cases.into_iter().map(LeafNode::TestCase))
            .collect();

        Some(Suite {
            title,
            location,
            suites,
            leaves,
        })
    }

    fn spec(&mut self, value: &Value, path: &str) -> Option<Spec> {
        let obj = self.as_object(value, path)?;
        Some(Spec {
            title: self.required_string(obj, path, "title"),
            id: self.optional_string(obj, path, "id"),
            location: self.inline_location(obj, path),
            tags: self.array(obj, path, "tags", Presence::Optional, |this, v, p| match v {
                Value::String(tag) => Some(tag.clone()),
                other => {
                    this.mismatch(p, Expected::String, other);
                    None
                }
            }),
            tests: self.array(obj, path, "tests", Presence::Required, |this, v, p| {
                let obj = this.as_object(v, p)?;
                let title = this.optional_string(obj, p, "title");
                Some(AttemptHolder {
                    title,
                    ..this.holder_body(obj, p)
                })
            }),
        })
    }

    fn test_case(&mut self, value: &Value, path: &str) -> Option<TestCase> {
        let obj = self.as_object(value, path)?;
        Some(TestCase {
            title: self.required_string(obj, path, "title"),
            location: self.inline_location(obj, path),
            holder: self.holder_body(obj, path),
        })
    }

    /// Reads every attempt-holder field except the title.
    fn holder_body(&mut self, obj: &Map<String, Value>, path: &str) -> AttemptHolder {
        AttemptHolder {
            title: None,
            project_name: self.optional_string(obj, path, "projectName"),
            project_id: self.optional_string(obj, path, "projectId"),
            status: self
                .optional_string(obj, path, "status")
                .map(|token| Outcome::from_token(&token)),
            expected_status: self.optional_string(obj, path, "expectedStatus"),
            retries: self.optional_u32(obj, path, "retries"),
            location: self
                .nested_location(obj, path, "location")
                .unwrap_or_default(),
            annotations: self.array(obj, path, "annotations", Presence::Optional, |this, v, p| {
                let obj = this.as_object(v, p)?;
                Some(RawAnnotation {
                    kind: this.required_string(obj, p, "type"),
                    description: this.optional_string(obj, p, "description"),
                })
            }),
            results: self.array(obj, path, "results", Presence::Optional, Self::attempt),
        }
    }

    fn attempt(&mut self, value: &Value, path: &str) -> Option<Attempt> {
        let obj = self.as_object(value, path)?;
        Some(Attempt {
            status: self
                .optional_string(obj, path, "status")
                .map(|token| AttemptStatus::from_token(&token)),
            duration_ms: self.optional_number(obj, path, "duration"),
            retry: self.optional_u32(obj, path, "retry"),
            start_time: self.optional_string(obj, path, "startTime"),
            worker_index: self.optional_i64(obj, path, "workerIndex"),
            error: present(obj, "error")
                .and_then(|error| self.error(error, &child_path(path, "error"))),
            errors: self.array(obj, path, "errors", Presence::Optional, Self::error),
            attachments: self.array(obj, path, "attachments", Presence::Optional, Self::attachment),
        })
    }

    fn error(&mut self, value: &Value, path: &str) -> Option<RawError> {
        let obj = self.as_object(value, path)?;
        Some(RawError {
            message: self.optional_string(obj, path, "message"),
            stack: self.optional_string(obj, path, "stack"),
            snippet: self.optional_string(obj, path, "snippet"),
            location: self.nested_location(obj, path, "location"),
        })
    }

    fn attachment(&mut self, value: &Value, path: &str) -> Option<RawAttachment> {
        let obj = self.as_object(value, path)?;
        Some(RawAttachment {
            name: self.required_string(obj, path, "name"),
            content_type: self.required_string(obj, path, "contentType"),
            path: self.optional_string(obj, path, "path"),
            body: self.optional_string(obj, path, "body"),
        })
    }
}
