//! Scene graph → flat interleaved vertex buffer.
//!
//! Output is one record per face corner, in pre-order node traversal, mesh
//! order within a node, face order within a mesh and index order within a
//! face. Record `n` is corner `n % 3` of triangle `n / 3`, so the buffer can
//! be drawn without an index buffer.

use glam::{Vec2, Vec3};

use crate::model::bounding_box::BoundingBox;
use crate::model::scene_graph::{MeshData, SceneGraph, SceneNode};

/// Normal written for meshes that carry none.
pub const FALLBACK_NORMAL: Vec3 = Vec3::Y;

/// Attributes present somewhere in the scene, as reported by [`analyze_scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexFormat {
    pub has_normals: bool,
    pub has_tex_coords: bool,
    /// Floats per vertex for exactly the detected attributes.
    pub stride: usize,
}

/// Record layout the flattener writes. Position and normal are always
/// present; texture coordinates only when the scene has them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub tex_coords: bool,
}

impl VertexLayout {
    pub const POSITION_NORMAL: VertexLayout = VertexLayout { tex_coords: false };
    pub const POSITION_NORMAL_UV: VertexLayout = VertexLayout { tex_coords: true };

    pub const POSITION_OFFSET: usize = 0;
    pub const NORMAL_OFFSET: usize = 3;
    pub const TEX_COORD_OFFSET: usize = 6;

    pub fn from_format(format: &VertexFormat) -> Self {
        Self { tex_coords: format.has_tex_coords }
    }

    pub fn stride(&self) -> usize {
        if self.tex_coords { 8 } else { 6 }
    }
}

/// Result of [`flatten`]: the upload payload plus its bounds.
#[derive(Debug, Clone)]
pub struct FlattenedScene {
    pub vertices: Vec<f32>,
    pub layout: VertexLayout,
    pub format: VertexFormat,
    pub bounds: BoundingBox,
}

impl FlattenedScene {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.layout.stride()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Floats of record `index`, or `None` past the end.
    pub fn record(&self, index: usize) -> Option<&[f32]> {
        let stride = self.layout.stride();
        self.vertices.get(index * stride..(index + 1) * stride)
    }
}

/// Scan every mesh once and report which attributes exist.
pub fn analyze_scene(scene: &SceneGraph) -> VertexFormat {
    let has_normals = scene.meshes.iter().any(MeshData::has_normals);
    let has_tex_coords = scene.meshes.iter().any(MeshData::has_tex_coords);

    let mut stride = 3;
    if has_normals {
        stride += 3;
    }
    if has_tex_coords {
        stride += 2;
    }

    tracing::info!(
        normals = if has_normals { 3 } else { 0 },
        tex_coords = if has_tex_coords { 2 } else { 0 },
        stride,
        "scene format: pos=3"
    );

    VertexFormat { has_normals, has_tex_coords, stride }
}

/// Flatten `scene` using the layout derived from [`analyze_scene`].
pub fn flatten(scene: &SceneGraph) -> FlattenedScene {
    let format = analyze_scene(scene);
    let layout = VertexLayout::from_format(&format);
    let mut flat = flatten_with_layout(scene, layout);
    flat.format = format;
    flat
}

/// Flatten `scene` into records of the given layout.
pub fn flatten_with_layout(scene: &SceneGraph, layout: VertexLayout) -> FlattenedScene {
    let mut vertices = Vec::with_capacity(scene.face_count() * 3 * layout.stride());
    extract_node(&scene.root, scene, layout, &mut vertices);

    let bounds = BoundingBox::from_records(&vertices, layout.stride());
    let flat = FlattenedScene {
        vertices,
        layout,
        format: VertexFormat {
            has_normals: true,
            has_tex_coords: layout.tex_coords,
            stride: layout.stride(),
        },
        bounds,
    };

    tracing::info!(
        vertices = flat.vertex_count(),
        triangles = flat.triangle_count(),
        stride = layout.stride(),
        "flattened scene"
    );
    flat
}

fn extract_node(node: &SceneNode, scene: &SceneGraph, layout: VertexLayout, out: &mut Vec<f32>) {
    for (i, &mesh_index) in node.meshes.iter().enumerate() {
        let Some(mesh) = scene.meshes.get(mesh_index) else {
            tracing::warn!(node = %node.name, mesh_index, "node references a missing mesh");
            continue;
        };
        tracing::debug!(
            node = %node.name,
            mesh = i,
            faces = mesh.faces.len(),
            vertices = mesh.positions.len(),
            "processing mesh"
        );
        extract_mesh(mesh, layout, out);
    }

    for child in &node.children {
        extract_node(child, scene, layout, out);
    }
}

fn extract_mesh(mesh: &MeshData, layout: VertexLayout, out: &mut Vec<f32>) {
    let normals = mesh.normals.as_deref().filter(|n| !n.is_empty());
    let tex_coords = mesh.tex_coords.as_deref().filter(|t| !t.is_empty());
    let mut skipped = 0usize;

    for face in &mesh.faces {
        // a partial or non-triangle face would shift every later corner
        let valid = face.indices.len() == 3
            && face.indices.iter().all(|&i| (i as usize) < mesh.positions.len());
        if !valid {
            skipped += 1;
            continue;
        }
        for &index in &face.indices {
            let i = index as usize;
            out.extend_from_slice(&mesh.positions[i].to_array());

            let normal = normals.and_then(|n| n.get(i)).copied().unwrap_or(FALLBACK_NORMAL);
            out.extend_from_slice(&normal.to_array());

            if layout.tex_coords {
                let uv = tex_coords.and_then(|t| t.get(i)).copied().unwrap_or(Vec2::ZERO);
                out.extend_from_slice(&uv.to_array());
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(mesh = %mesh.name, skipped, "skipped faces with bad indices");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scene_graph::Face;

    fn two_triangles(normals: bool) -> MeshData {
        MeshData {
            name: "pair".into(),
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(5.0, 5.0, 5.0),
                Vec3::new(6.0, 5.0, 5.0),
                Vec3::new(5.0, 6.0, 5.0),
            ],
            normals: normals.then(|| vec![Vec3::Z; 6]),
            tex_coords: None,
            faces: vec![Face::triangle(2, 0, 1), Face::triangle(3, 5, 4)],
        }
    }

    fn single_mesh_scene(mesh: MeshData) -> SceneGraph {
        SceneGraph {
            meshes: vec![mesh],
            root: SceneNode::new("root").with_meshes(vec![0]),
        }
    }

    #[test]
    fn test_records_follow_face_order() {
        let mesh = two_triangles(false);
        let scene = single_mesh_scene(mesh.clone());
        let flat = flatten(&scene);

        assert_eq!(flat.layout, VertexLayout::POSITION_NORMAL);
        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(flat.vertices.len(), 36);
        assert_eq!(flat.triangle_count(), 2);

        let order = [2usize, 0, 1, 3, 5, 4];
        for (n, &src) in order.iter().enumerate() {
            let rec = flat.record(n).unwrap();
            assert_eq!(&rec[0..3], &mesh.positions[src].to_array(), "record {n}");
            assert_eq!(&rec[3..6], &[0.0, 1.0, 0.0], "record {n}");
        }
        assert!(flat.record(6).is_none());
    }

    #[test]
    fn test_uses_mesh_normals_when_present() {
        let flat = flatten(&single_mesh_scene(two_triangles(true)));
        assert!(flat.format.has_normals);
        for n in 0..flat.vertex_count() {
            assert_eq!(&flat.record(n).unwrap()[3..6], &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_pre_order_traversal() {
        let mk = |x: f32| MeshData {
            name: format!("m{x}"),
            positions: vec![Vec3::new(x, 0.0, 0.0), Vec3::new(x, 1.0, 0.0), Vec3::new(x, 0.0, 1.0)],
            normals: None,
            tex_coords: None,
            faces: vec![Face::triangle(0, 1, 2)],
        };
        // root(m0) -> [a(m1) -> [c(m3)], b(m2)]
        let scene = SceneGraph {
            meshes: vec![mk(0.0), mk(1.0), mk(2.0), mk(3.0)],
            root: SceneNode::new("root")
                .with_meshes(vec![0])
                .with_child(
                    SceneNode::new("a")
                        .with_meshes(vec![1])
                        .with_child(SceneNode::new("c").with_meshes(vec![3])),
                )
                .with_child(SceneNode::new("b").with_meshes(vec![2])),
        };
        let flat = flatten(&scene);
        let first_x: Vec<f32> = (0..4).map(|t| flat.record(t * 3).unwrap()[0]).collect();
        assert_eq!(first_x, vec![0.0, 1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_analyze_scene_reports_detected_stride() {
        let mut with_uv = two_triangles(false);
        with_uv.tex_coords = Some(vec![Vec2::new(0.25, 0.75); 6]);
        let scene = SceneGraph {
            meshes: vec![with_uv, two_triangles(false)],
            root: SceneNode::new("root").with_meshes(vec![0, 1]),
        };

        let format = analyze_scene(&scene);
        assert!(!format.has_normals);
        assert!(format.has_tex_coords);
        assert_eq!(format.stride, 5);

        let flat = flatten(&scene);
        assert_eq!(flat.layout, VertexLayout::POSITION_NORMAL_UV);
        assert_eq!(flat.layout.stride(), 8);
        assert_eq!(flat.format, format);
        assert_eq!(flat.vertex_count(), 12);
        // first mesh carries UVs, second falls back to zero
        assert_eq!(&flat.record(0).unwrap()[6..8], &[0.25, 0.75]);
        assert_eq!(&flat.record(6).unwrap()[6..8], &[0.0, 0.0]);
        assert_eq!(&flat.record(6).unwrap()[3..6], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bounds_cover_positions_only() {
        let flat = flatten(&single_mesh_scene(two_triangles(true)));
        assert_eq!(flat.bounds.min, Vec3::ZERO);
        assert_eq!(flat.bounds.max, Vec3::new(6.0, 6.0, 5.0));
    }

    #[test]
    fn test_empty_scene() {
        let scene = SceneGraph::default();
        let flat = flatten(&scene);
        assert!(flat.is_empty());
        assert_eq!(flat.vertex_count(), 0);
        assert_eq!(flat.bounds, BoundingBox::EMPTY);
        assert_eq!(analyze_scene(&scene).stride, 3);
    }

    #[test]
    fn test_bad_references_are_skipped() {
        let mut mesh = two_triangles(false);
        mesh.faces.insert(0, Face::triangle(0, 1, 42));
        mesh.faces.push(Face { indices: vec![0, 1] });
        let scene = SceneGraph {
            meshes: vec![mesh],
            root: SceneNode::new("root").with_meshes(vec![0, 7]),
        };
        let flat = flatten(&scene);
        assert_eq!(flat.vertex_count(), 6);
        assert_eq!(&flat.record(0).unwrap()[0..3], &[0.0, 1.0, 0.0]);
    }
}
