mod dispatch;
mod table;

pub use dispatch::dispatch;
pub use table::{Route, RouteTable};
