pub mod mona_backend;
pub mod mona_printer;
