pub mod frame_sink;
pub mod overlay_renderer;
