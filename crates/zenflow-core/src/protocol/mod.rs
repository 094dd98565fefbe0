//! Protocol module containing the command/response models and the JSON codec.

pub mod codec;
pub mod command;
pub mod response;

pub use codec::{decode_command, decode_response, encode_command, encode_response, DecodeError};
pub use command::{Category, Command};
pub use response::{Response, ResponseKind, Status};
