//! NetCDF-3 classic encoder.
//!
//! Writes the stacked dataset as a single self-describing binary file
//! (format variant 1, the `CDF\x01` magic). Only the subset of the format
//! the artifact needs is implemented: fixed-size dimensions, global and
//! per-variable text attributes, and int/float/double variables. Everything
//! in the format is big-endian.

use crate::error::StoreResult;
use crate::stack::{StackedDataset, ARRAY_NAME};

const NC_BYTE_MAGIC: &[u8; 4] = b"CDF\x01";

const NC_DIMENSION: u32 = 0x0A;
const NC_VARIABLE: u32 = 0x0B;
const NC_ATTRIBUTE: u32 = 0x0C;
const ABSENT: [u32; 2] = [0, 0];

const NC_CHAR: u32 = 2;
const NC_INT: u32 = 4;
const NC_FLOAT: u32 = 5;
const NC_DOUBLE: u32 = 6;

struct VarSpec {
    name: &'static str,
    dim_ids: Vec<u32>,
    nc_type: u32,
    attributes: Vec<(&'static str, String)>,
    data: Vec<u8>,
}

/// Encode the dataset as NetCDF-3 classic bytes.
pub fn encode(dataset: &StackedDataset) -> StoreResult<Vec<u8>> {
    let (nv, nt, ns, ny, nx) = dataset.values.dim();

    let dims: [(&str, usize); 5] = [
        ("variable", nv),
        ("init_time", nt),
        ("step", ns),
        ("y", ny),
        ("x", nx),
    ];

    let variables = vec![
        VarSpec {
            name: "init_time",
            dim_ids: vec![1],
            nc_type: NC_DOUBLE,
            attributes: vec![("units", "seconds since 1970-01-01T00:00:00Z".to_string())],
            data: doubles(dataset.init_times.iter().map(|t| t.timestamp() as f64)),
        },
        VarSpec {
            name: "step",
            dim_ids: vec![2],
            nc_type: NC_INT,
            attributes: vec![("units", "hours".to_string())],
            data: ints(dataset.steps.iter().map(|&s| s as i32)),
        },
        VarSpec {
            name: "y",
            dim_ids: vec![3],
            nc_type: NC_DOUBLE,
            attributes: vec![],
            data: doubles(dataset.y.iter().copied()),
        },
        VarSpec {
            name: "x",
            dim_ids: vec![4],
            nc_type: NC_DOUBLE,
            attributes: vec![],
            data: doubles(dataset.x.iter().copied()),
        },
        VarSpec {
            name: ARRAY_NAME,
            dim_ids: vec![0, 1, 2, 3, 4],
            nc_type: NC_FLOAT,
            attributes: vec![],
            data: floats(dataset.values.iter().copied()),
        },
    ];

    let global_attributes = vec![("variable_names", dataset.variables.join(","))];

    // The header length is independent of the data offsets (they are fixed
    // width), so lay it out once with zero offsets to measure it, then again
    // with the real offsets.
    let header_len = header(&dims, &global_attributes, &variables, &vec![0; variables.len()]).len();

    let mut offsets = Vec::with_capacity(variables.len());
    let mut cursor = header_len as u32;
    for var in &variables {
        offsets.push(cursor);
        cursor += padded_len(var.data.len()) as u32;
    }

    let mut out = header(&dims, &global_attributes, &variables, &offsets);
    for var in &variables {
        out.extend_from_slice(&var.data);
        out.resize(out.len() + padding(var.data.len()), 0);
    }

    Ok(out)
}

fn header(
    dims: &[(&str, usize)],
    global_attributes: &[(&str, String)],
    variables: &[VarSpec],
    offsets: &[u32],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(NC_BYTE_MAGIC);
    out.extend_from_slice(&0u32.to_be_bytes()); // numrecs (no record dimension)

    // dim_list
    out.extend_from_slice(&NC_DIMENSION.to_be_bytes());
    out.extend_from_slice(&(dims.len() as u32).to_be_bytes());
    for (name, size) in dims {
        put_name(&mut out, name);
        out.extend_from_slice(&(*size as u32).to_be_bytes());
    }

    put_attributes(&mut out, global_attributes);

    // var_list
    out.extend_from_slice(&NC_VARIABLE.to_be_bytes());
    out.extend_from_slice(&(variables.len() as u32).to_be_bytes());
    for (var, offset) in variables.iter().zip(offsets) {
        put_name(&mut out, var.name);
        out.extend_from_slice(&(var.dim_ids.len() as u32).to_be_bytes());
        for dim_id in &var.dim_ids {
            out.extend_from_slice(&dim_id.to_be_bytes());
        }
        let attrs: Vec<(&str, String)> = var
            .attributes
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        put_attributes(&mut out, &attrs);
        out.extend_from_slice(&var.nc_type.to_be_bytes());
        out.extend_from_slice(&(padded_len(var.data.len()) as u32).to_be_bytes());
        out.extend_from_slice(&offset.to_be_bytes());
    }

    out
}

fn put_attributes(out: &mut Vec<u8>, attributes: &[(&str, String)]) {
    if attributes.is_empty() {
        for word in ABSENT {
            out.extend_from_slice(&word.to_be_bytes());
        }
        return;
    }
    out.extend_from_slice(&NC_ATTRIBUTE.to_be_bytes());
    out.extend_from_slice(&(attributes.len() as u32).to_be_bytes());
    for (name, value) in attributes {
        put_name(out, name);
        out.extend_from_slice(&NC_CHAR.to_be_bytes());
        out.extend_from_slice(&(value.len() as u32).to_be_bytes());
        out.extend_from_slice(value.as_bytes());
        out.resize(out.len() + padding(value.len()), 0);
    }
}

fn put_name(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(&(name.len() as u32).to_be_bytes());
    out.extend_from_slice(name.as_bytes());
    out.resize(out.len() + padding(name.len()), 0);
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn padded_len(len: usize) -> usize {
    len + padding(len)
}

fn doubles(values: impl Iterator<Item = f64>) -> Vec<u8> {
    values.flat_map(|v| v.to_be_bytes()).collect()
}

fn floats(values: impl Iterator<Item = f32>) -> Vec<u8> {
    values.flat_map(|v| v.to_be_bytes()).collect()
}

fn ints(values: impl Iterator<Item = i32>) -> Vec<u8> {
    values.flat_map(|v| v.to_be_bytes()).collect()
}
