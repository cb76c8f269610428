mod build;
mod check;
mod context;
mod develop;
mod fmt;
mod info;
mod lock;
mod show;

pub use build::cmd_build;
pub use check::cmd_check;
pub use develop::cmd_develop;
pub use fmt::cmd_fmt;
pub use info::cmd_info;
pub use lock::cmd_lock;
pub use show::cmd_show;
