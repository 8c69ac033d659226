use std::fmt;

/// Issue order of an async operation within one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out sequence numbers and tells whether a completion is the latest issued.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> RequestSeq {
        self.latest += 1;
        RequestSeq(self.latest)
    }

    pub fn latest(&self) -> Option<RequestSeq> {
        (self.latest > 0).then_some(RequestSeq(self.latest))
    }

    pub fn is_latest(&self, seq: RequestSeq) -> bool {
        seq.0 == self.latest
    }
}
