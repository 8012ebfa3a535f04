//! # Chain Handle
//!
//! The node's view of its own chain: the genesis marker and the current tip.

use parking_lot::RwLock;
use shared_types::{Body, Hash, Header};

#[derive(Default)]
struct ChainState {
    genesis_header: Option<Header>,
    genesis_header_hash: Hash,
    current_header: Option<Header>,
    current_header_hash: Hash,
    current_body: Option<Body>,
}

/// Shared, lock-guarded chain tip.
#[derive(Default)]
pub struct BlockChain {
    state: RwLock<ChainState>,
}

impl BlockChain {
    /// Empty chain with an empty genesis hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty chain anchored to a genesis header.
    pub fn with_genesis(header: Header, hash: Hash) -> Self {
        let chain = Self::default();
        {
            let mut state = chain.state.write();
            state.genesis_header = Some(header);
            state.genesis_header_hash = hash;
        }
        chain
    }

    /// Genesis header, if one was set.
    pub fn genesis_header(&self) -> Option<Header> {
        self.state.read().genesis_header.clone()
    }

    /// Hash the first block must link to.
    pub fn genesis_header_hash(&self) -> Hash {
        self.state.read().genesis_header_hash.clone()
    }

    /// Header at the tip.
    pub fn current_header(&self) -> Option<Header> {
        self.state.read().current_header.clone()
    }

    /// Hash of the header at the tip.
    pub fn current_header_hash(&self) -> Hash {
        self.state.read().current_header_hash.clone()
    }

    /// Body at the tip.
    pub fn current_body(&self) -> Option<Body> {
        self.state.read().current_body.clone()
    }

    /// Advance the tip.
    pub fn set_current(&self, header: Header, hash: Hash, body: Body) {
        let mut state = self.state.write();
        state.current_header = Some(header);
        state.current_header_hash = hash;
        state.current_body = Some(body);
    }

    /// Move the tip back to `header`, or to an empty chain.
    pub fn rewind_to(&self, header: Option<(Header, Hash)>) {
        let mut state = self.state.write();
        match header {
            Some((header, hash)) => {
                state.current_header = Some(header);
                state.current_header_hash = hash;
            }
            None => {
                state.current_header = None;
                state.current_header_hash = Hash::new();
            }
        }
        state.current_body = None;
    }
}
