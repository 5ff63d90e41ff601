//! Writes tiny ONNX graphs for the runtime-backed tests.
//!
//! Only the handful of protobuf fields these graphs need are encoded:
//! float inputs of shape `[batch, width]`, float matrix initializers and
//! nodes with integer attributes.

use std::fs;
use std::path::{Path, PathBuf};

const IR_VERSION: i64 = 8;
const OPSET_VERSION: i64 = 13;

const ELEM_FLOAT: i64 = 1;
const ELEM_INT64: i64 = 7;
const ATTR_INT: i64 = 2;

fn varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn int_field(buf: &mut Vec<u8>, field: u64, value: i64) {
    varint(buf, field << 3);
    varint(buf, value as u64);
}

fn bytes_field(buf: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    varint(buf, (field << 3) | 2);
    varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn str_field(buf: &mut Vec<u8>, field: u64, value: &str) {
    bytes_field(buf, field, value.as_bytes());
}

fn node(op_type: &str, inputs: &[&str], outputs: &[&str], attrs: &[(&str, i64)]) -> Vec<u8> {
    let mut buf = Vec::new();
    for input in inputs {
        str_field(&mut buf, 1, input);
    }
    for output in outputs {
        str_field(&mut buf, 2, output);
    }
    str_field(&mut buf, 3, &format!("{}_{}", op_type, outputs[0]));
    str_field(&mut buf, 4, op_type);
    for (name, value) in attrs {
        let mut attr = Vec::new();
        str_field(&mut attr, 1, name);
        int_field(&mut attr, 3, *value);
        int_field(&mut attr, 20, ATTR_INT);
        bytes_field(&mut buf, 5, &attr);
    }
    buf
}

fn matrix(name: &str, rows: usize, cols: usize, value: impl Fn(usize, usize) -> f32) -> Vec<u8> {
    let mut buf = Vec::new();
    int_field(&mut buf, 1, rows as i64);
    int_field(&mut buf, 1, cols as i64);
    int_field(&mut buf, 2, ELEM_FLOAT);
    str_field(&mut buf, 8, name);
    let mut raw = Vec::with_capacity(rows * cols * 4);
    for r in 0..rows {
        for c in 0..cols {
            raw.extend_from_slice(&value(r, c).to_le_bytes());
        }
    }
    bytes_field(&mut buf, 9, &raw);
    buf
}

/// `width` of `None` leaves the shape to the runtime's inference.
fn value_info(name: &str, elem_type: i64, width: Option<usize>) -> Vec<u8> {
    let mut tensor = Vec::new();
    int_field(&mut tensor, 1, elem_type);
    if let Some(width) = width {
        let mut batch = Vec::new();
        str_field(&mut batch, 2, "batch");
        let mut cols = Vec::new();
        int_field(&mut cols, 1, width as i64);
        let mut shape = Vec::new();
        bytes_field(&mut shape, 1, &batch);
        bytes_field(&mut shape, 1, &cols);
        bytes_field(&mut tensor, 2, &shape);
    }
    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor);

    let mut buf = Vec::new();
    str_field(&mut buf, 1, name);
    bytes_field(&mut buf, 2, &type_proto);
    buf
}

fn model(
    nodes: &[Vec<u8>],
    initializers: &[Vec<u8>],
    inputs: &[Vec<u8>],
    outputs: &[Vec<u8>],
) -> Vec<u8> {
    let mut graph = Vec::new();
    for n in nodes {
        bytes_field(&mut graph, 1, n);
    }
    str_field(&mut graph, 2, "aspire_fixture");
    for init in initializers {
        bytes_field(&mut graph, 5, init);
    }
    for input in inputs {
        bytes_field(&mut graph, 11, input);
    }
    for output in outputs {
        bytes_field(&mut graph, 12, output);
    }

    let mut opset = Vec::new();
    str_field(&mut opset, 1, "");
    int_field(&mut opset, 2, OPSET_VERSION);

    let mut buf = Vec::new();
    int_field(&mut buf, 1, IR_VERSION);
    str_field(&mut buf, 2, "aspire-tests");
    bytes_field(&mut buf, 7, &graph);
    bytes_field(&mut buf, 8, &opset);
    buf
}

fn weight(r: usize, c: usize) -> f32 {
    ((r + 2 * c) % 5) as f32 * 0.001 - 0.002
}

/// `Y = X`, for a batch of `width` columns.
pub fn identity_scaler(width: usize) -> Vec<u8> {
    model(
        &[node("Identity", &["X"], &["Y"], &[])],
        &[],
        &[value_info("X", ELEM_FLOAT, Some(width))],
        &[value_info("Y", ELEM_FLOAT, None)],
    )
}

/// `Y = X · W` with `W` of shape `inputs × outputs`.
pub fn projection_scaler(inputs: usize, outputs: usize) -> Vec<u8> {
    model(
        &[node("MatMul", &["X", "W"], &["Y"], &[])],
        &[matrix("W", inputs, outputs, weight)],
        &[value_info("X", ELEM_FLOAT, Some(inputs))],
        &[value_info("Y", ELEM_FLOAT, None)],
    )
}

/// Linear classifier laid out like a converted scikit-learn model: a
/// `label` output first, then `probabilities = softmax(X · W)`.
pub fn softmax_classifier(features: usize, classes: usize) -> Vec<u8> {
    model(
        &[
            node("MatMul", &["X", "W"], &["logits"], &[]),
            node("Softmax", &["logits"], &["probabilities"], &[("axis", 1)]),
            node(
                "ArgMax",
                &["probabilities"],
                &["label"],
                &[("axis", 1), ("keepdims", 0)],
            ),
        ],
        &[matrix("W", features, classes, weight)],
        &[value_info("X", ELEM_FLOAT, Some(features))],
        &[
            value_info("label", ELEM_INT64, None),
            value_info("probabilities", ELEM_FLOAT, None),
        ],
    )
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}
