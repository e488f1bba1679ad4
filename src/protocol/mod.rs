pub mod command;
pub mod connection;
pub mod convert;
pub mod packet;
pub mod primitive;
pub mod response;
pub mod row;
pub mod r#trait;
pub mod value;

pub use row::BinaryRowPayload;
