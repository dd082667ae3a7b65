mod principal;
mod session;
mod token;
mod user;

pub use principal::*;
pub use session::*;
pub use token::*;
pub use user::*;
