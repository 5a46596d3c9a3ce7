mod import;
mod list;
mod rollback;
mod update;
mod util;

pub use import::import;
pub use list::list;
pub use rollback::rollback;
pub use update::update;
