//! Opaque hand mesh relay.
//!
//! The renderer owns hand-mesh baking.  Whatever it produces is forwarded to
//! the session's output channel untouched; this crate never looks inside.

use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Baked hand mesh as produced by the rendering collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct HandMesh {
    pub vertices:  Vec<Vector3<f32>>,
    pub normals:   Vec<Vector3<f32>>,
    pub triangles: Vec<u32>,
    pub uvs:       Vec<Vector2<f32>>,
    pub position:  Vector3<f32>,
    pub rotation:  UnitQuaternion<f32>,
}

impl HandMesh {
    /// Mesh at the origin with identity rotation.
    pub fn new(
        vertices: Vec<Vector3<f32>>,
        normals: Vec<Vector3<f32>>,
        triangles: Vec<u32>,
        uvs: Vec<Vector2<f32>>,
    ) -> Self {
        HandMesh {
            vertices,
            normals,
            triangles,
            uvs,
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// A bake with no vertices carries nothing worth relaying.
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }
}
