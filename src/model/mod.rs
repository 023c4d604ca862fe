// MODEL: camera and scene data
pub mod bounding_box;
pub mod camera;
pub mod flatten;
pub mod scene_graph;

pub use bounding_box::BoundingBox;
pub use camera::{Camera, MoveDirection, Projection};
pub use flatten::{analyze_scene, flatten, FlattenedScene, VertexFormat, VertexLayout, FALLBACK_NORMAL};
pub use scene_graph::{Face, MeshData, SceneGraph, SceneNode};
