mod admin_user;
mod customer;
mod email_settings;
mod license;
mod product;

pub use admin_user::*;
pub use customer::*;
pub use email_settings::*;
pub use license::*;
pub use product::*;
