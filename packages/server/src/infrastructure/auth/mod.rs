//! Identity collaborators: bearer token verification and the participant
//! check used by the realtime handshake.

pub mod jwt;
pub mod participant_check;

pub use jwt::{Claims, JwtTokenVerifier};
pub use participant_check::StoreParticipantCheck;
