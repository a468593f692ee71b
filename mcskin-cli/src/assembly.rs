//! Turns parsed model groups and the render configuration into the scene's
//! base and overlay meshes.

use std::collections::BTreeMap;

use glam::{Mat4, Vec2, Vec3};
use mcskin_rendering::primitives::{Mesh, MeshPrimitive, Quad, Vertex};

use crate::config::RenderConfig;
use crate::model::{Face, ModelError, ObjGroup};

const ATTACHMENT_MARKER: &str = "Attachment";

pub struct SceneMeshes {
    pub model: Mesh,
    pub overlay: Mesh,
}

impl std::fmt::Debug for SceneMeshes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneMeshes").finish_non_exhaustive()
    }
}

/// Base groups are translated to their configured origin. `Attachment`
/// groups reuse the base group's geometry, scaled about the origin by the
/// configured attachment scale, but sample their own texture coordinates.
pub fn build_meshes(
    groups: &BTreeMap<String, ObjGroup>,
    config: &RenderConfig,
) -> Result<SceneMeshes, ModelError> {
    let mut model_quads: Vec<Box<dyn MeshPrimitive>> = Vec::new();
    let mut overlay_quads: Vec<Box<dyn MeshPrimitive>> = Vec::new();

    for (name, group) in groups {
        if name.contains(ATTACHMENT_MARKER) {
            continue;
        }

        let origin = config.origins.get(name).copied().unwrap_or(Vec3::ZERO);
        let transform = Mat4::from_translation(origin);

        for face in &group.faces {
            model_quads.push(Box::new(face_quad(name, group, group, face, &transform)?));
        }
    }

    for (name, group) in groups {
        let Some(marker) = name.find(ATTACHMENT_MARKER) else {
            continue;
        };

        let base_name = &name[..marker];
        let base = groups
            .get(base_name)
            .ok_or_else(|| ModelError::MissingBaseGroup {
                group: name.clone(),
                base: base_name.to_string(),
            })?;

        let origin = config.origins.get(base_name).copied().unwrap_or(Vec3::ZERO);
        let scale = config
            .attachment_scales
            .get(base_name)
            .copied()
            .unwrap_or(1.0);
        let transform = Mat4::from_translation(origin) * Mat4::from_scale(Vec3::splat(scale));

        for face in &base.faces {
            overlay_quads.push(Box::new(face_quad(name, base, group, face, &transform)?));
        }
    }

    Ok(SceneMeshes {
        model: Mesh::new(model_quads),
        overlay: Mesh::new(overlay_quads),
    })
}

/// Resolves one quad face, taking positions from `position_group` and
/// texture coordinates from `uv_group` (those differ for overlay faces).
fn face_quad(
    group_name: &str,
    position_group: &ObjGroup,
    uv_group: &ObjGroup,
    face: &Face,
    transform: &Mat4,
) -> Result<Quad, ModelError> {
    let mut corners = [Vertex::new(Vec3::ZERO, Vec2::ZERO); 4];

    for (slot, face_vertex) in face.vertices.iter().enumerate() {
        let position = *position_group
            .vertices
            .get(face_vertex.vertex - 1)
            .ok_or_else(|| ModelError::IndexOutOfRange {
                group: group_name.to_string(),
                kind: "vertex",
                index: face_vertex.vertex,
                count: position_group.vertices.len(),
            })?;

        let uv = *uv_group
            .texture_coords
            .get(face_vertex.texture_coord - 1)
            .ok_or_else(|| ModelError::IndexOutOfRange {
                group: group_name.to_string(),
                kind: "texture coordinate",
                index: face_vertex.texture_coord,
                count: uv_group.texture_coords.len(),
            })?;

        corners[slot] = Vertex::new(transform.transform_point3(position), uv);
    }

    // Faces list their corners around the perimeter; the quad primitive wants
    // (top-left, top-right, bottom-left, bottom-right).
    Ok(Quad::new_from_vertices(
        corners[0], corners[1], corners[3], corners[2],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_model;

    const MODEL: &str = "\
g Head
v -4.0 0.0 0.0
v 4.0 0.0 0.0
v 4.0 8.0 0.0
v -4.0 8.0 0.0
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

    fn config_with_head_at(origin: Vec3, scale: f32) -> RenderConfig {
        let mut config = RenderConfig::default();
        config.origins.insert("Head".to_string(), origin);
        config.attachment_scales.insert("Head".to_string(), scale);
        config
    }

    #[test]
    fn base_faces_are_translated_to_their_origin() {
        let groups = parse_model(MODEL, 64.0, 64.0).unwrap();
        let meshes =
            build_meshes(&groups, &config_with_head_at(Vec3::new(0.0, 24.0, 0.0), 1.0)).unwrap();

        let vertices = meshes.model.vertices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].position, Vec3::new(-4.0, 24.0, 0.0));
        assert_eq!(vertices[1].position, Vec3::new(4.0, 24.0, 0.0));
    }

    #[test]
    fn overlay_faces_reuse_base_geometry_scaled_about_the_origin() {
        let groups = parse_model(MODEL, 64.0, 64.0).unwrap();
        let meshes =
            build_meshes(&groups, &config_with_head_at(Vec3::new(0.0, 24.0, 0.0), 1.5)).unwrap();

        let vertices = meshes.overlay.vertices();
        assert_eq!(vertices.len(), 4);
        // Base vertex (-4, 0, 0) scaled by 1.5, then translated by the origin.
        assert_eq!(vertices[0].position, Vec3::new(-6.0, 24.0, 0.0));
        // ...but sampling the overlay group's texture coordinates.
        assert_eq!(vertices[0].uv, Vec2::new(40.0 / 64.0, 1.0 - 16.0 / 64.0));
    }

    #[test]
    fn groups_without_configured_placement_stay_at_the_model_origin() {
        let groups = parse_model(MODEL, 64.0, 64.0).unwrap();
        let meshes = build_meshes(&groups, &RenderConfig::default()).unwrap();

        assert_eq!(meshes.model.vertices()[0].position, Vec3::new(-4.0, 0.0, 0.0));
    }

    #[test]
    fn attachment_groups_need_a_base_group() {
        let groups = parse_model("g LostAttachment\nvt 0 0\n", 64.0, 64.0).unwrap();
        let err = build_meshes(&groups, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::MissingBaseGroup { .. }));
    }

    #[test]
    fn out_of_range_face_indices_are_reported() {
        let groups = parse_model(
            "g Head\nv 0 0 0\nvt 0 0\nf 1/1 2/1 1/1 1/1\n",
            64.0,
            64.0,
        )
        .unwrap();
        let err = build_meshes(&groups, &RenderConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ModelError::IndexOutOfRange { kind: "vertex", index: 2, .. }
        ));
    }
}
