use crate::domain::{Error, traits::DeadLetterQueue};

/// Dead-lettered operations land on stderr via tracing; the run carries on.
#[derive(Default, Debug)]
pub struct StdErrDlq {}

impl DeadLetterQueue for StdErrDlq {
    fn report(&self, error: &Error) {
        tracing::error!(%error, "operation dead-lettered");
    }
}
