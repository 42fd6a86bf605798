pub mod recover;

use tracing::debug;

use crate::console;
use crate::error::RescueError;
use crate::recovery::Abort;

/// Every abort condition exits with status 1.
pub const EXIT_ABORT: i32 = 1;

pub fn exit_for_error(err: &RescueError) -> ! {
    console::failure(err);
    std::process::exit(EXIT_ABORT);
}

pub fn exit_for_abort(abort: &Abort) -> ! {
    debug!(stage = %abort.stage, "exit");
    exit_for_error(&abort.error)
}
