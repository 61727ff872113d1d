//! An outline document core: rows ordered by fractional keys, a projection
//! of the visible rows for list views, and OPML and markdown interchange.

pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod util;
pub mod visit;
