// CONTROLLER: input, camera control and frame timing
pub mod camera_controller;
pub mod frame_loop;
pub mod input;

pub use camera_controller::{frame_scene, CameraController, ScenePlacement};
pub use frame_loop::{CameraUniform, FrameTimer, ShadingUniform};
pub use input::{Action, InputEvent, InputProcessor, InputState, KeyBindings, MouseButton};
