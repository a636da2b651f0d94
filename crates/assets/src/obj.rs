use std::path::Path;

use crate::{AssetError, Mesh};

/// Result of parsing a Wavefront `.obj` file.
///
/// Only positions and face vertex indices are kept. Normals, texture
/// coordinates, groups and materials are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedObj {
    /// Flat positions, three floats per vertex.
    pub vertices: Vec<f32>,
    /// Triangle list, 0-based, in reverse file order.
    pub indices: Vec<u32>,
}

impl ParsedObj {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Convert into a renderable indexed mesh.
    ///
    /// Fails if an index points past the vertex list or does not fit `u16`.
    pub fn into_mesh(self, name: impl Into<String>) -> Result<Mesh, AssetError> {
        let vertex_count = self.vertex_count();
        let indices = self
            .indices
            .iter()
            .map(|&i| {
                let index = i as usize;
                if index >= vertex_count {
                    return Err(AssetError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
                u16::try_from(i).map_err(|_| AssetError::IndexOverflow { index })
            })
            .collect::<Result<Vec<u16>, _>>()?;
        Ok(Mesh::indexed(name, self.vertices, indices))
    }
}

/// Parse `.obj` text.
///
/// `v` lines contribute their first three coordinates (an optional `w` is
/// dropped). Each `f` vertex contributes the position part of its
/// `v/vt/vn` triple, converted from 1-based to 0-based. The final index list
/// is reversed, which flips the winding relative to the file.
pub fn parse_obj(text: &str) -> Result<ParsedObj, AssetError> {
    let mut parsed = ParsedObj::default();

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords = parts
                    .map(|token| {
                        token.parse::<f32>().map_err(|_| AssetError::InvalidNumber {
                            line: line_no,
                            token: token.to_string(),
                        })
                    })
                    .collect::<Result<Vec<f32>, _>>()?;
                if coords.len() < 3 {
                    return Err(AssetError::ShortVertex {
                        line: line_no,
                        found: coords.len(),
                    });
                }
                parsed.vertices.extend_from_slice(&coords[..3]);
            }
            Some("f") => {
                for face in parts {
                    let position = face.split('/').next().unwrap_or_default();
                    let index = position
                        .parse::<u32>()
                        .ok()
                        .and_then(|i| i.checked_sub(1))
                        .ok_or_else(|| AssetError::InvalidIndex {
                            line: line_no,
                            token: face.to_string(),
                        })?;
                    parsed.indices.push(index);
                }
            }
            _ => {}
        }
    }

    parsed.indices.reverse();
    tracing::debug!(
        vertices = parsed.vertex_count(),
        indices = parsed.indices.len(),
        "parsed obj"
    );
    Ok(parsed)
}

/// Read and parse an `.obj` file from disk.
pub fn load_obj(path: impl AsRef<Path>) -> Result<ParsedObj, AssetError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_obj(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIANGLE: &str = "\
# a single triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parses_vertices_flat() {
        let parsed = parse_obj(TRIANGLE).unwrap();
        assert_eq!(parsed.vertex_count(), 3);
        assert_eq!(parsed.vertices[3..6], [1.0, 0.0, 0.0]);
        // the w coordinate is dropped
        assert_eq!(parsed.vertices.len(), 9);
    }

    #[test]
    fn indices_are_zero_based_and_reversed() {
        let parsed = parse_obj(TRIANGLE).unwrap();
        assert_eq!(parsed.indices, vec![2, 1, 0]);
    }

    #[test]
    fn faces_without_slashes() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3\nf 2 4 3\n").unwrap();
        assert_eq!(parsed.indices, vec![2, 3, 1, 2, 1, 0]);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = parse_obj("v 0 zero 0\n").unwrap_err();
        assert!(matches!(err, AssetError::InvalidNumber { line: 1, .. }));
    }

    #[test]
    fn rejects_zero_index() {
        let err = parse_obj("v 0 0 0\nf 0 1 1\n").unwrap_err();
        assert!(matches!(err, AssetError::InvalidIndex { line: 2, .. }));
    }

    #[test]
    fn rejects_short_vertex() {
        let err = parse_obj("v 1 2\n").unwrap_err();
        assert!(matches!(err, AssetError::ShortVertex { found: 2, .. }));
    }

    #[test]
    fn into_mesh_checks_range() {
        let parsed = ParsedObj {
            vertices: vec![0.0; 6],
            indices: vec![0, 1, 2],
        };
        let err = parsed.into_mesh("bad").unwrap_err();
        assert!(matches!(
            err,
            AssetError::IndexOutOfRange {
                index: 2,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn into_mesh_keeps_order() {
        let mesh = parse_obj(TRIANGLE).unwrap().into_mesh("tri").unwrap();
        assert_eq!(mesh.indices, Some(vec![2, 1, 0]));
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRIANGLE.as_bytes()).unwrap();
        let parsed = load_obj(file.path()).unwrap();
        assert_eq!(parsed.indices.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_obj(dir.path().join("nope.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
