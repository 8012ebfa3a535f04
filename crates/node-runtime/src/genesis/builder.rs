//! # Genesis Builder
//!
//! Creates the genesis header of every shard and of the metachain, and
//! funds the initial accounts that live in the node's shard.

use std::collections::HashMap;

use shared_types::{
    calculate_hash, CodecError, Hash, Hasher, Header, Marshalizer, MetaBlock, ShardHeader,
    ShardId, METACHAIN_SHARD_ID, U256,
};
use sn_01_account_ledger::{AccountsAdapter, AccountsError};
use sn_02_sharding::{AddressConverter, ShardCoordinator, ShardingError};
use thiserror::Error;
use tracing::info;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// A genesis header could not be hashed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An initial balance names a malformed address.
    #[error(transparent)]
    Address(#[from] ShardingError),

    /// Funding the initial accounts failed.
    #[error(transparent)]
    Accounts(#[from] AccountsError),

    /// The node's own shard has no genesis header.
    #[error("No genesis header for shard {0}")]
    MissingShard(ShardId),
}

/// Genesis configuration.
#[derive(Debug, Clone, Default)]
pub struct GenesisConfig {
    /// Unix time stamped on every genesis header.
    pub timestamp: u64,
    /// Initial balances by address.
    pub initial_balances: Vec<(Vec<u8>, U256)>,
}

/// Genesis headers of the whole network.
#[derive(Debug, Clone)]
pub struct GenesisBlocks {
    /// One header per shard plus the metachain.
    pub headers: HashMap<ShardId, Header>,
    /// Hash of the node's own genesis header.
    pub self_hash: Hash,
    /// Ledger root after the initial balances were committed.
    pub root_hash: Hash,
}

impl GenesisBlocks {
    /// Genesis header of `shard_id`.
    pub fn header(&self, shard_id: ShardId) -> Option<&Header> {
        self.headers.get(&shard_id)
    }
}

/// Builds [`GenesisBlocks`].
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    /// Create a builder.
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Fund the local initial accounts, then build every genesis header.
    ///
    /// Only the node's own header carries the funded ledger root; the
    /// others are placeholders other shards overwrite with their own view.
    pub fn build<M: Marshalizer>(
        &self,
        shard_coordinator: &dyn ShardCoordinator,
        address_converter: &dyn AddressConverter,
        accounts: &dyn AccountsAdapter,
        hasher: &dyn Hasher,
        marshalizer: &M,
    ) -> Result<GenesisBlocks, GenesisError> {
        let self_id = shard_coordinator.self_id();
        let root_hash = self.fund_accounts(shard_coordinator, address_converter, accounts)?;

        let mut headers = HashMap::new();
        for shard_id in 0..shard_coordinator.number_of_shards() {
            let header = ShardHeader {
                shard_id,
                timestamp: self.config.timestamp,
                rand_seed: genesis_seed(hasher, shard_id),
                root_hash: if shard_id == self_id {
                    root_hash.clone()
                } else {
                    Vec::new()
                },
                ..Default::default()
            };
            headers.insert(shard_id, Header::from(header));
        }

        let meta = MetaBlock {
            timestamp: self.config.timestamp,
            rand_seed: genesis_seed(hasher, METACHAIN_SHARD_ID),
            ..Default::default()
        };
        headers.insert(METACHAIN_SHARD_ID, Header::from(meta));

        let own = headers
            .get(&self_id)
            .ok_or(GenesisError::MissingShard(self_id))?;
        let self_hash = calculate_hash(marshalizer, hasher, own)?;

        info!(
            "Genesis built for {} shards, own hash {}",
            shard_coordinator.number_of_shards(),
            hex::encode(&self_hash)
        );
        Ok(GenesisBlocks {
            headers,
            self_hash,
            root_hash,
        })
    }

    fn fund_accounts(
        &self,
        shard_coordinator: &dyn ShardCoordinator,
        address_converter: &dyn AddressConverter,
        accounts: &dyn AccountsAdapter,
    ) -> Result<Hash, GenesisError> {
        let mut funded = 0;
        for (pub_key, balance) in &self.config.initial_balances {
            let address = address_converter.create_address(pub_key)?;
            if shard_coordinator.compute_id(&address) != shard_coordinator.self_id() {
                continue;
            }
            let mut account = accounts.get_account_with_journal(&address)?;
            account.add_to_balance(*balance);
            accounts.save_account(&account)?;
            funded += 1;
        }

        let root_hash = accounts.commit()?;
        info!("Funded {} genesis accounts", funded);
        Ok(root_hash)
    }
}

fn genesis_seed(hasher: &dyn Hasher, shard_id: ShardId) -> Vec<u8> {
    let mut seed = b"genesis".to_vec();
    seed.extend_from_slice(&shard_id.to_be_bytes());
    hasher.compute(&seed)
}
