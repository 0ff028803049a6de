//! Permissive Wavefront OBJ reading.
//!
//! Only `v` and `f` directives contribute to the mesh. Every other line,
//! and every token that does not parse, is skipped instead of rejected.

use std::fmt::Write as _;

/// How a single input line is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjLine {
    Vertex([f32; 3]),
    /// 1-based indices as written, with malformed tokens already removed.
    Face(Vec<usize>),
    Ignored,
}

impl ObjLine {
    pub fn classify(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<&str> = parts.take(3).collect();
                if coords.len() < 3 {
                    return ObjLine::Ignored;
                }
                match (coords[0].parse(), coords[1].parse(), coords[2].parse()) {
                    (Ok(x), Ok(y), Ok(z)) => ObjLine::Vertex([x, y, z]),
                    _ => ObjLine::Ignored,
                }
            }
            Some("f") => ObjLine::Face(parts.filter_map(face_index).collect()),
            _ => ObjLine::Ignored,
        }
    }
}

/// The position part of `i`, `i/t`, `i//n` or `i/t/n`.
fn face_index(token: &str) -> Option<usize> {
    let index = token.split('/').next()?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    /// 0-based indices into `vertices`, each face with at least 3 entries.
    pub faces: Vec<Vec<usize>>,
}

impl Mesh {
    pub fn parse(text: &str) -> Self {
        let mut mesh = Mesh::default();
        // Bare `\r` also ends a line.
        for line in text.split(['\n', '\r']) {
            match ObjLine::classify(line) {
                ObjLine::Vertex(v) => mesh.vertices.push(v),
                ObjLine::Face(indices) => {
                    // Only vertices declared above this line are addressable.
                    let count = mesh.vertices.len();
                    let face: Vec<usize> = indices
                        .into_iter()
                        .filter_map(|i| i.checked_sub(1))
                        .filter(|&i| i < count)
                        .collect();
                    if face.len() >= 3 {
                        mesh.faces.push(face);
                    }
                }
                ObjLine::Ignored => {}
            }
        }
        mesh
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Canonical `v x y z` / `f i j k` text with 1-based indices.
    pub fn to_obj_text(&self) -> String {
        let mut out = String::new();
        for [x, y, z] in &self.vertices {
            let _ = writeln!(out, "v {x} {y} {z}");
        }
        for face in &self.faces {
            out.push('f');
            for i in face {
                let _ = write!(out, " {}", i + 1);
            }
            out.push('\n');
        }
        out
    }

    /// Edges of every face as a closed loop, in stored order. Edges touching
    /// an index with no vertex are skipped.
    pub fn edges(&self) -> impl Iterator<Item = ([f32; 3], [f32; 3])> + '_ {
        self.faces.iter().flat_map(move |face| {
            let n = face.len();
            (0..n).filter_map(move |k| {
                let a = self.vertices.get(face[k])?;
                let b = self.vertices.get(face[(k + 1) % n])?;
                Some((*a, *b))
            })
        })
    }
}
