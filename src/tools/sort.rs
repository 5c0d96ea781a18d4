//! `sort_json`: stable multi-key sort of a JSON array of objects.

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ToolError;

const TOOL: &str = "sort_json";

#[derive(Debug, Clone, Deserialize)]
pub struct SortJsonArgs {
    pub input_path: String,
    pub output_path: String,
    pub keys: Vec<String>,
}

pub fn sort_json(args: &SortJsonArgs) -> Result<String, ToolError> {
    if args.keys.is_empty() {
        return Err(ToolError::argument(TOOL, "at least one sort key is required"));
    }

    let raw = std::fs::read_to_string(&args.input_path)
        .with_context(|| format!("reading {}", args.input_path))
        .map_err(|e| ToolError::execution(TOOL, e))?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input_path))
        .map_err(|e| ToolError::execution(TOOL, e))?;
    let Value::Array(mut records) = parsed else {
        return Err(ToolError::execution(
            TOOL,
            anyhow!("{} does not contain a JSON array", args.input_path),
        ));
    };

    // `sort_by` is stable, so ties keep their input order.
    records.sort_by(|a, b| compare_records(a, b, &args.keys));

    write_pretty(Path::new(&args.output_path), &records).map_err(|e| ToolError::execution(TOOL, e))?;

    Ok(format!(
        "Sorted {} records by [{}] into {}",
        records.len(),
        args.keys.join(", "),
        args.output_path
    ))
}

/// Write `value` as JSON indented by four spaces, creating parent directories.
pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    std::fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}

fn compare_records(a: &Value, b: &Value, keys: &[String]) -> Ordering {
    keys.iter()
        .map(|key| compare_fields(field(a, key), field(b, key)))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Missing and null fields both sort after every present value.
fn field<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|v| !v.is_null())
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => compare_values(x, y),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Exact numeric order across integers and floats.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    match (as_integer(x), as_integer(y)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(a), None) => compare_integer_float(a, y.as_f64().unwrap_or_default()),
        (None, Some(b)) => compare_integer_float(b, x.as_f64().unwrap_or_default()).reverse(),
        (None, None) => {
            let (a, b) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            // JSON has no NaN; -0.0 and 0.0 compare equal.
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn compare_integer_float(i: i128, f: f64) -> Ordering {
    // Well outside the i64/u64 range, so the cast below cannot saturate.
    const BOUND: f64 = 1e20;
    let floor = f.floor();
    if floor >= BOUND {
        return Ordering::Less;
    }
    if floor <= -BOUND {
        return Ordering::Greater;
    }
    match i.cmp(&(floor as i128)) {
        Ordering::Equal if f > floor => Ordering::Less,
        ord => ord,
    }
}
