pub mod image_sequence_capture;
