pub mod frame_observer;
pub mod track_store;
pub mod tracked_face;
pub mod tracker_config;
