pub mod login;
pub mod logout;
pub mod register;
pub mod user_token;

pub use login::{LoginContext, LoginRoute};
pub use logout::{LogoutContext, LogoutRoute};
pub use register::{RegisterContext, RegisterRoute};
pub use user_token::{UserTokenContext, UserTokenRoute};
