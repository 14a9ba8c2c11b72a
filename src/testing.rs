//! writers for small Idefix files, shared by the unit tests, the integration
//! tests and the benches

use crate::parse::dmp::{HEADER_SIZE, NAME_SIZE};

/// writes Idefix style dumps record by record
#[derive(Debug, Clone)]
pub struct DumpWriter {
    bytes: Vec<u8>,
}

impl DumpWriter {
    /// start a dump with `header`, cut to the header size
    pub fn new(header: &str) -> Self {
        let mut bytes = vec![0; HEADER_SIZE];
        let len = header.len().min(HEADER_SIZE);
        bytes[..len].copy_from_slice(&header.as_bytes()[..len]);
        Self { bytes }
    }

    fn record(&mut self, name: &str, code: i32, dims: &[i32]) {
        let mut name_bytes = [0u8; NAME_SIZE];
        let len = name.len().min(NAME_SIZE);
        name_bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.bytes.extend(name_bytes);
        self.bytes.extend(code.to_le_bytes());
        self.bytes.extend((dims.len() as i32).to_le_bytes());
        for dim in dims {
            self.bytes.extend(dim.to_le_bytes());
        }
    }

    pub fn doubles(mut self, name: &str, dims: &[i32], values: &[f64]) -> Self {
        self.record(name, 0, dims);
        values.iter().for_each(|v| self.bytes.extend(v.to_le_bytes()));
        self
    }

    pub fn singles(mut self, name: &str, dims: &[i32], values: &[f32]) -> Self {
        self.record(name, 1, dims);
        values.iter().for_each(|v| self.bytes.extend(v.to_le_bytes()));
        self
    }

    pub fn ints(mut self, name: &str, dims: &[i32], values: &[i32]) -> Self {
        self.record(name, 2, dims);
        values.iter().for_each(|v| self.bytes.extend(v.to_le_bytes()));
        self
    }

    /// a record header without any payload
    pub fn raw_record(mut self, name: &str, code: i32, dims: &[i32]) -> Self {
        self.record(name, code, dims);
        self
    }

    /// uniform grid records of one direction: centres and cell edges
    pub fn axis(self, dir: usize, left: f64, right: f64, n: usize) -> Self {
        let dx = (right - left) / n as f64;
        let edges_left: Vec<f64> = (0..n).map(|i| left + i as f64 * dx).collect();
        let edges_right: Vec<f64> = (0..n).map(|i| left + (i + 1) as f64 * dx).collect();
        let centres: Vec<f64> = (0..n).map(|i| left + (i as f64 + 0.5) * dx).collect();
        let dims = [n as i32];

        self.doubles(&format!("x{dir}"), &dims, &centres)
            .doubles(&format!("xl{dir}"), &dims, &edges_left)
            .doubles(&format!("xr{dir}"), &dims, &edges_right)
    }

    /// close the record list and return the file contents
    pub fn finish(mut self) -> Vec<u8> {
        self.record("eof", 2, &[1]);
        self.bytes.extend(0i32.to_le_bytes());
        self.bytes
    }
}

/// writes legacy binary vtk files the way Idefix does
#[derive(Debug, Clone)]
pub struct VtkWriter {
    bytes: Vec<u8>,
}

impl VtkWriter {
    pub fn new(header: &str, dataset: &str) -> Self {
        let text = format!("# vtk DataFile Version 2.0\n{header}\nBINARY\nDATASET {dataset}\n");
        Self {
            bytes: text.into_bytes(),
        }
    }

    pub fn line(mut self, line: &str) -> Self {
        self.bytes.extend(line.as_bytes());
        self.bytes.push(b'\n');
        self
    }

    pub fn floats(mut self, values: &[f32]) -> Self {
        values.iter().for_each(|v| self.bytes.extend(v.to_be_bytes()));
        self.bytes.push(b'\n');
        self
    }

    pub fn doubles(mut self, values: &[f64]) -> Self {
        values.iter().for_each(|v| self.bytes.extend(v.to_be_bytes()));
        self.bytes.push(b'\n');
        self
    }

    pub fn ints(mut self, values: &[i32]) -> Self {
        values.iter().for_each(|v| self.bytes.extend(v.to_be_bytes()));
        self.bytes.push(b'\n');
        self
    }

    /// a single component float cell array
    pub fn scalars(self, name: &str, values: &[f32]) -> Self {
        self.line(&format!("SCALARS {name} float"))
            .line("LOOKUP_TABLE default")
            .floats(values)
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
