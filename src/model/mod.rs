pub mod changes;
pub mod config;
pub mod outline;
pub mod rich_text;
pub mod row;
pub mod selection;
pub mod tree;

pub use changes::*;
pub use config::*;
pub use outline::*;
pub use rich_text::*;
pub use row::*;
pub use tree::*;
