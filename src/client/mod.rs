// Client module
pub mod rollcall_client;

pub use rollcall_client::{
    CheckInEndpoint, CheckInOutcome, CheckInRequest, RollcallClient, MSG_FAILURE, MSG_SUCCESS,
    MSG_UNREACHABLE,
};
