//! Result shape of a fan-in request.

/// Replies returned to the caller.
///
/// A request expecting exactly one reply yields [`Replies::Single`]; any
/// other target yields [`Replies::Many`] in arrival order, which may be
/// shorter than the target when partial results are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replies<M> {
    Single(M),
    Many(Vec<M>),
}

impl<M> Replies<M> {
    /// Number of replies held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(list) => list.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single reply, if this came from a one-reply request.
    pub fn single(self) -> Option<M> {
        match self {
            Self::Single(msg) => Some(msg),
            Self::Many(_) => None,
        }
    }

    /// All replies in arrival order.
    pub fn into_vec(self) -> Vec<M> {
        match self {
            Self::Single(msg) => vec![msg],
            Self::Many(list) => list,
        }
    }
}

impl<M> IntoIterator for Replies<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}
