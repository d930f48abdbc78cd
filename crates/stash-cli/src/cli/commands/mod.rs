mod download;
mod get;
mod list;
mod remove;
mod upload;

pub use download::run_download;
pub use get::run_get;
pub use list::run_list;
pub use remove::run_remove;
pub use upload::run_upload;
