use glam::{Vec2, Vec3};

/// A single polygon as indices into its mesh's vertex arrays.
/// Triangles after import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self { indices: vec![a, b, c] }
    }
}

/// Per-vertex attribute arrays plus faces. `normals` and `tex_coords`, when
/// present, have the same length as `positions`.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: Option<Vec<Vec2>>,
    pub faces: Vec<Face>,
}

impl MeshData {
    pub fn has_normals(&self) -> bool {
        self.normals.as_ref().is_some_and(|n| !n.is_empty())
    }

    pub fn has_tex_coords(&self) -> bool {
        self.tex_coords.as_ref().is_some_and(|t| !t.is_empty())
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.iter().filter(|f| f.indices.len() == 3).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    /// Indices into [`SceneGraph::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), meshes: Vec::new(), children: Vec::new() }
    }

    pub fn with_meshes(mut self, meshes: Vec<usize>) -> Self {
        self.meshes = meshes;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

/// Imported scene: a mesh table and a node tree referencing it.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub meshes: Vec<MeshData>,
    pub root: SceneNode,
}

impl SceneGraph {
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }
}
