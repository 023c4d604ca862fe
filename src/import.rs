//! OBJ import: parses a Wavefront file and builds a [`SceneGraph`].
//!
//! Each OBJ object becomes a child node of the root and each of its geometry
//! groups (one per `usemtl`) becomes a mesh. Faces come out of the parser
//! already triangulated; points and lines are dropped.

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use wavefront_obj::obj::{self, Object, Primitive, VTNIndex};

use crate::error::{Result, ViewerError};
use crate::model::{Face, MeshData, SceneGraph, SceneNode, FALLBACK_NORMAL};

/// Post-processing applied while building meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Compute smooth normals for meshes that do not have one per corner.
    pub generate_normals: bool,
    /// Store `1 - v` instead of `v` (top-left texture origin).
    pub flip_uvs: bool,
    /// Share one vertex between corners with identical attribute indices.
    pub join_identical_vertices: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { generate_normals: true, flip_uvs: true, join_identical_vertices: true }
    }
}

pub fn load_scene(path: &Path, options: &ImportOptions) -> Result<SceneGraph> {
    let source = std::fs::read_to_string(path)
        .map_err(|source| ViewerError::Io { path: path.to_path_buf(), source })?;
    tracing::info!(path = %path.display(), bytes = source.len(), "loading model");
    parse_scene(&source, options)
}

pub fn parse_scene(source: &str, options: &ImportOptions) -> Result<SceneGraph> {
    let set = obj::parse(source.to_owned())
        .map_err(|e| ViewerError::ObjParse { line: e.line_number, message: e.message })?;

    let mut scene = SceneGraph { meshes: Vec::new(), root: SceneNode::new("root") };
    let mut dropped = 0usize;

    for (i, object) in set.objects.iter().enumerate() {
        let object_name = if object.name.is_empty() { format!("object{i}") } else { object.name.clone() };
        let mut node = SceneNode::new(object_name.clone());

        for geometry in &object.geometry {
            let mut triangles = Vec::with_capacity(geometry.shapes.len());
            for shape in &geometry.shapes {
                match shape.primitive {
                    // the parser fans from the last corner; rotate back to file order
                    Primitive::Triangle(c, a, b) => triangles.push([a, b, c]),
                    Primitive::Point(_) | Primitive::Line(_, _) => dropped += 1,
                }
            }
            if triangles.is_empty() {
                continue;
            }

            let material = geometry.material_name.as_deref().unwrap_or("default");
            let name = format!("{object_name}/{material}");
            let mesh = build_mesh(name, object, &triangles, options)?;
            node.meshes.push(scene.meshes.len());
            scene.meshes.push(mesh);
        }

        scene.root.children.push(node);
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped point and line primitives");
    }
    tracing::info!(
        meshes = scene.meshes.len(),
        nodes = scene.root.node_count(),
        vertices = scene.vertex_count(),
        faces = scene.face_count(),
        "imported scene"
    );
    Ok(scene)
}

fn build_mesh(name: String, object: &Object, triangles: &[[VTNIndex; 3]], options: &ImportOptions) -> Result<MeshData> {
    let corners = || triangles.iter().flatten();
    let keep_uvs = corners().all(|c| c.1.is_some());
    let keep_normals = corners().all(|c| c.2.is_some());

    let invalid = |reason: String| ViewerError::InvalidMesh { mesh: name.clone(), reason };

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut tex_coords = Vec::new();
    let mut faces = Vec::with_capacity(triangles.len());
    let mut joined: HashMap<(usize, Option<usize>, Option<usize>), u32> = HashMap::new();

    for triangle in triangles {
        let mut face = [0u32; 3];
        for (slot, &(v, t, n)) in face.iter_mut().zip(triangle.iter()) {
            let key = (v, t.filter(|_| keep_uvs), n.filter(|_| keep_normals));
            if options.join_identical_vertices {
                if let Some(&index) = joined.get(&key) {
                    *slot = index;
                    continue;
                }
            }

            let p = object
                .vertices
                .get(v)
                .ok_or_else(|| invalid(format!("position index {v} out of range")))?;
            positions.push(Vec3::new(p.x as f32, p.y as f32, p.z as f32));

            if let Some(n) = key.2 {
                let vn = object
                    .normals
                    .get(n)
                    .ok_or_else(|| invalid(format!("normal index {n} out of range")))?;
                normals.push(Vec3::new(vn.x as f32, vn.y as f32, vn.z as f32));
            }
            if let Some(t) = key.1 {
                let vt = object
                    .tex_vertices
                    .get(t)
                    .ok_or_else(|| invalid(format!("texture index {t} out of range")))?;
                let v = if options.flip_uvs { 1.0 - vt.v } else { vt.v };
                tex_coords.push(Vec2::new(vt.u as f32, v as f32));
            }

            let index = (positions.len() - 1) as u32;
            if options.join_identical_vertices {
                joined.insert(key, index);
            }
            *slot = index;
        }
        faces.push(Face::triangle(face[0], face[1], face[2]));
    }

    let normals = if keep_normals {
        Some(normals)
    } else if options.generate_normals {
        tracing::debug!(mesh = %name, "generating smooth normals");
        Some(smooth_normals(&positions, &faces))
    } else {
        None
    };

    Ok(MeshData {
        name,
        positions,
        normals,
        tex_coords: keep_uvs.then_some(tex_coords),
        faces,
    })
}

/// Area-weighted vertex normals. Vertices touched only by degenerate faces
/// get [`FALLBACK_NORMAL`].
pub fn smooth_normals(positions: &[Vec3], faces: &[Face]) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for face in faces {
        let [a, b, c] = match face.indices[..] {
            [a, b, c] => [a as usize, b as usize, c as usize],
            _ => continue,
        };
        let (Some(&pa), Some(&pb), Some(&pc)) = (positions.get(a), positions.get(b), positions.get(c)) else {
            continue;
        };
        // cross product length is twice the area, which is the weight we want
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| if n.length_squared() > 0.0 { n.normalize() } else { FALLBACK_NORMAL })
        .collect()
}
