pub mod image_sequence_writer;
