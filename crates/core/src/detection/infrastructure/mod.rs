pub mod replay_detector;
