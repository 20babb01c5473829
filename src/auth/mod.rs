mod activity;
mod log_in;
mod log_out;
mod middleware;
mod redirect;

pub use activity::post_activity;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
