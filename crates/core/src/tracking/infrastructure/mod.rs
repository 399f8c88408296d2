pub mod shared_track_store;
