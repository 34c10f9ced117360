//! Database initialization and schema management

pub mod init;

pub use init::init_database;
