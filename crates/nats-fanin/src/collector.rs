//! Reply accumulation and the final success/timeout decision.

use crate::error::RequestError;
use crate::reply::Replies;

/// Outcome of pushing one reply into a [`ReplyBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Push {
    /// Stored; still short of the target
    Pending,
    /// Stored; this reply reached the target
    Complete,
    /// Target already reached; reply dropped
    Ignored,
}

/// Arrival-ordered replies for one in-flight request.
///
/// Never holds more than `expected` replies.
#[derive(Debug)]
pub(crate) struct ReplyBuffer<M> {
    replies: Vec<M>,
    expected: usize,
}

impl<M> ReplyBuffer<M> {
    pub fn new(expected: usize) -> Self {
        Self {
            replies: Vec::with_capacity(expected.min(64)),
            expected,
        }
    }

    /// Append a reply unless the target has been reached.
    pub fn push(&mut self, reply: M) -> Push {
        if self.is_complete() {
            return Push::Ignored;
        }
        self.replies.push(reply);
        if self.is_complete() {
            Push::Complete
        } else {
            Push::Pending
        }
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_complete(&self) -> bool {
        self.replies.len() >= self.expected
    }

    /// Turn the collected replies into the caller's result.
    ///
    /// An empty buffer is always `Timeout`. A short buffer is `Timeout`
    /// when `error_if_partial` is set and is returned as-is otherwise.
    pub fn finish(self, error_if_partial: bool) -> Result<Replies<M>, RequestError> {
        if self.replies.is_empty() || (!self.is_complete() && error_if_partial) {
            return Err(RequestError::Timeout);
        }

        let mut replies = self.replies;
        if self.expected == 1 {
            // non-empty and capped at one
            return replies.pop().map(Replies::Single).ok_or(RequestError::Timeout);
        }
        Ok(Replies::Many(replies))
    }
}
