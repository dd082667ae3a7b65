// store

mod refresh_session_store;

pub use refresh_session_store::*;

// repo

mod principal_repo;

pub use principal_repo::*;

// collaborators

mod clock;
mod token_issuer;

pub use clock::*;
pub use token_issuer::*;
