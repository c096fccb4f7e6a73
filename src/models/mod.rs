// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Candidate, Decision, Direction, Gender, Location, Profile, SwipeRecord};
pub use requests::{SignInRequest, SignUpRequest};
pub use responses::{AuthUser, ErrorResponse, Session};
