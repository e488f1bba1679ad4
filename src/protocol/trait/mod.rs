pub mod column;
pub mod param;
pub mod params;
pub mod row;
pub mod text;

#[cfg(test)]
mod param_test;

pub use column::FromColumn;
pub use param::Param;
pub use params::{Params, bind_params};
pub use row::FromRow;
pub use text::Text;
