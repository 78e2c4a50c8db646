//! Process exit statuses

use crate::pipeline::FailureKind;

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 2;
pub const INVALID_SYNTAX: i32 = 3;
pub const COMMAND_FAILED: i32 = 4;
pub const BAD_DOCKER_IMAGE: i32 = 5;
pub const TIMED_OUT: i32 = 6;

pub fn for_kind(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::InvalidSyntax => INVALID_SYNTAX,
        FailureKind::BusinessRule | FailureKind::CreationFailed => COMMAND_FAILED,
        FailureKind::BadImage => BAD_DOCKER_IMAGE,
        FailureKind::TimedOut => TIMED_OUT,
        FailureKind::Internal => INTERNAL_ERROR,
    }
}
