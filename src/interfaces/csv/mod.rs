pub mod command_reader;
pub mod trip_writer;
