//! Loader for the indexed face-vertex model format.
//!
//! The format is line oriented: `g <name>` opens a named group, `v x y z`
//! and `vt u v` append to the current group (texture coordinates are given
//! in texel units and are normalized against the skin texture size, with the
//! v axis flipped to a top-left origin), and `f v/t v/t v/t v/t` records a
//! quad face whose 1-based indices address the *current group's* vertex and
//! texture coordinate lists. Groups whose name contains `Attachment` carry
//! overlay texture coordinates for the base group named by the prefix.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

use glam::{Vec2, Vec3};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("reading model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed `{directive}` directive")]
    MalformedDirective { line: usize, directive: &'static str },
    #[error("line {line}: face index must be 1-based")]
    ZeroFaceIndex { line: usize },
    #[error("group `{group}`: face references {kind} {index}, but the group only has {count}")]
    IndexOutOfRange {
        group: String,
        kind: &'static str,
        index: usize,
        count: usize,
    },
    #[error("overlay group `{group}` has no base group `{base}`")]
    MissingBaseGroup { group: String, base: String },
}

/// One corner of a quad face; indices are 1-based into the owning group.
#[derive(Debug, Copy, Clone)]
pub struct FaceVertex {
    pub vertex: usize,
    pub texture_coord: usize,
}

#[derive(Debug, Copy, Clone)]
pub struct Face {
    pub vertices: [FaceVertex; 4],
}

#[derive(Debug, Default)]
pub struct ObjGroup {
    pub vertices: Vec<Vec3>,
    pub texture_coords: Vec<Vec2>,
    pub faces: Vec<Face>,
}

pub fn load_model(
    path: &Path,
    texture_width: f32,
    texture_height: f32,
) -> Result<BTreeMap<String, ObjGroup>, ModelError> {
    let source = fs::read_to_string(path)?;
    parse_model(&source, texture_width, texture_height)
}

pub fn parse_model(
    source: &str,
    texture_width: f32,
    texture_height: f32,
) -> Result<BTreeMap<String, ObjGroup>, ModelError> {
    let mut groups: BTreeMap<String, ObjGroup> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let mut tokens = raw_line.split_whitespace();

        let Some(directive) = tokens.next() else {
            continue;
        };

        if directive == "g" {
            let name = tokens
                .next()
                .ok_or(ModelError::MalformedDirective {
                    line,
                    directive: "g",
                })?
                .to_string();
            groups.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some(group) = current.as_ref().and_then(|name| groups.get_mut(name)) else {
            debug!("line {line}: `{directive}` before any group, skipping");
            continue;
        };

        match directive {
            "v" => {
                let [x, y, z] = parse_floats(&mut tokens, line, "v")?;
                group.vertices.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats(&mut tokens, line, "vt")?;
                // Texel units to normalized coordinates, v flipped to a
                // top-left origin.
                group
                    .texture_coords
                    .push(Vec2::new(u / texture_width, 1.0 - v / texture_height));
            }
            "f" => {
                let mut vertices = [FaceVertex {
                    vertex: 0,
                    texture_coord: 0,
                }; 4];
                for slot in &mut vertices {
                    let token = tokens.next().ok_or(ModelError::MalformedDirective {
                        line,
                        directive: "f",
                    })?;
                    *slot = parse_face_vertex(token, line)?;
                }
                group.faces.push(Face { vertices });
            }
            _ => {
                debug!("line {line}: unknown directive `{directive}`, skipping");
            }
        }
    }

    Ok(groups)
}

fn parse_floats<const N: usize>(
    tokens: &mut SplitWhitespace,
    line: usize,
    directive: &'static str,
) -> Result<[f32; N], ModelError> {
    let mut values = [0f32; N];
    for value in &mut values {
        *value = tokens
            .next()
            .and_then(|token| token.parse().ok())
            .ok_or(ModelError::MalformedDirective { line, directive })?;
    }

    Ok(values)
}

fn parse_face_vertex(token: &str, line: usize) -> Result<FaceVertex, ModelError> {
    let mut parts = token.split('/');

    let vertex = parts
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or(ModelError::MalformedDirective {
            line,
            directive: "f",
        })?;
    let texture_coord = parts
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or(ModelError::MalformedDirective {
            line,
            directive: "f",
        })?;

    if vertex == 0 || texture_coord == 0 {
        return Err(ModelError::ZeroFaceIndex { line });
    }

    Ok(FaceVertex {
        vertex,
        texture_coord,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "\
g Head
v -4.0 0.0 -4.0
v 4.0 0.0 -4.0
v 4.0 8.0 -4.0
v -4.0 8.0 -4.0
vt 8.0 16.0
vt 16.0 16.0
vt 16.0 8.0
vt 8.0 8.0
f 1/1 2/2 3/3 4/4
g HeadAttachment
vt 40.0 16.0
vt 48.0 16.0
vt 48.0 8.0
vt 40.0 8.0
";

    #[test]
    fn groups_vertices_and_faces_are_parsed() {
        let groups = parse_model(MODEL, 64.0, 64.0).unwrap();

        assert_eq!(groups.len(), 2);
        let head = &groups["Head"];
        assert_eq!(head.vertices.len(), 4);
        assert_eq!(head.faces.len(), 1);
        assert_eq!(head.vertices[1], Vec3::new(4.0, 0.0, -4.0));
        assert_eq!(head.faces[0].vertices[2].vertex, 3);
        assert_eq!(head.faces[0].vertices[2].texture_coord, 3);

        let attachment = &groups["HeadAttachment"];
        assert_eq!(attachment.texture_coords.len(), 4);
        assert!(attachment.faces.is_empty());
    }

    #[test]
    fn texture_coords_are_normalized_and_v_flipped() {
        let groups = parse_model(MODEL, 64.0, 64.0).unwrap();

        let head = &groups["Head"];
        assert_eq!(head.texture_coords[0], Vec2::new(8.0 / 64.0, 1.0 - 16.0 / 64.0));
        assert_eq!(head.texture_coords[3], Vec2::new(8.0 / 64.0, 1.0 - 8.0 / 64.0));
    }

    #[test]
    fn face_vertices_accept_normal_indices() {
        let groups = parse_model(
            "g Body\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nf 1/1/1 2/1/2 3/1/3 4/1/4\n",
            64.0,
            64.0,
        )
        .unwrap();

        assert_eq!(groups["Body"].faces.len(), 1);
    }

    #[test]
    fn data_before_any_group_is_skipped() {
        let groups = parse_model("v 1 2 3\ng Head\nv 0 0 0\n", 64.0, 64.0).unwrap();

        assert_eq!(groups["Head"].vertices.len(), 1);
    }

    #[test]
    fn malformed_directives_carry_line_numbers() {
        let err = parse_model("g Head\nv 1.0 oops 3.0\n", 64.0, 64.0).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MalformedDirective {
                line: 2,
                directive: "v"
            }
        ));

        let err = parse_model("g Head\nf 1/1 2/2 3/3\n", 64.0, 64.0).unwrap_err();
        assert!(matches!(
            err,
            ModelError::MalformedDirective {
                line: 2,
                directive: "f"
            }
        ));
    }

    #[test]
    fn zero_face_indices_are_rejected() {
        let err = parse_model("g Head\nf 0/1 1/1 1/1 1/1\n", 64.0, 64.0).unwrap_err();
        assert!(matches!(err, ModelError::ZeroFaceIndex { line: 2 }));
    }
}
