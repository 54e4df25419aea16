//! User Operations
//!
//! Registration and profile changes run inside a unit of work. Login, token
//! verification and profile reads use the default connection.

pub mod get_profile;
pub mod login;
pub mod register;
pub mod update_profile;
pub mod validation;
pub mod verify_token;

pub use get_profile::GetProfileUseCase;
pub use login::{LoginCommand, LoginResult, LoginUseCase};
pub use register::{RegisterUserCommand, RegisterUserUseCase, RegisteredUser};
pub use update_profile::{UpdateProfileCommand, UpdateProfileUseCase};
pub use verify_token::VerifyTokenUseCase;
