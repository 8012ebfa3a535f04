//! # Node Components
//!
//! Holds every component of one shard node, built once from
//! [`NodeConfig`] and shared by the round loop.
//!
//! ## Initialization Order
//!
//! ```text
//! Level 0: shard coordinator, hasher, codec, ledger, storage, pools
//! Level 1: genesis, chain handle, validator, fork detector
//! Level 2: messenger, resolvers, request handler
//! Level 3: result aggregator, contract and transaction processors
//! Level 4: block processor, broadcaster, interceptors
//! ```
//!
//! Construction failures are fatal; the caller gets the first one with
//! the step that failed.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_types::{
    BincodeMarshalizer, BlockType, DataPools, Hasher, Keccak256Hasher, MemoryStorage,
};
use sn_01_account_ledger::InMemoryAccountsDb;
use sn_02_sharding::{AddressConverter, MultiShardCoordinator, PlainAddressConverter, ShardCoordinator};
use sn_03_transaction_processing::{ResultSettlementProcessor, SettlementContractProcessor, TxProcessor};
use sn_04_intermediate_results::{IntermediateResultsProcessor, SmartContractResultPreprocessor};
use sn_05_block_processing::{BlockChain, BlockValidator, ProcessorComponents, ShardBlockProcessor};
use sn_06_fork_detection::{BasicForkDetector, Rounder};
use sn_07_resolvers::{
    BroadcastQueue, MemoryMessenger, MemoryNetwork, OutboundMessage, ResolverRequestHandler,
    ResolversContainer, ShardChainMessenger, ShardResolversContainerFactory,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::container::config::NodeConfig;
use crate::genesis::{GenesisBlocks, GenesisBuilder, GenesisConfig};
use crate::wiring::InterceptorWiring;

/// Every component of a shard node.
pub struct NodeComponents {
    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
    /// Hasher for every identity.
    pub hasher: Arc<dyn Hasher>,
    /// Canonical codec.
    pub marshalizer: BincodeMarshalizer,
    /// Shard layout.
    pub shard_coordinator: Arc<dyn ShardCoordinator>,
    /// Address validation.
    pub address_converter: Arc<dyn AddressConverter>,
    /// Account ledger.
    pub accounts: Arc<InMemoryAccountsDb>,
    /// Persistent storage.
    pub storage: Arc<MemoryStorage>,
    /// Data pools.
    pub pools: DataPools,
    /// Round clock.
    pub rounder: Arc<dyn Rounder>,
    /// Fork detector.
    pub fork_detector: Arc<BasicForkDetector>,
    /// Network endpoint.
    pub messenger: Arc<MemoryMessenger>,
    /// Resolvers by topic.
    pub resolvers: Arc<ResolversContainer>,
    /// Requests for missing data.
    pub request_handler: Arc<ResolverRequestHandler>,
    /// Block validity and notarization.
    pub validator: Arc<BlockValidator>,
    /// Block producer and executor.
    pub processor: Arc<ShardBlockProcessor>,
    /// Local chain tip.
    pub chain: Arc<BlockChain>,
    /// Outbound broadcaster.
    pub chain_messenger: Arc<ShardChainMessenger>,
    /// Genesis headers of the network.
    pub genesis: GenesisBlocks,
}

impl NodeComponents {
    /// Build a node on `network`. Returns the components and the receiving
    /// end of the broadcast queue, to be drained by the broadcast worker.
    pub fn build(
        config: NodeConfig,
        genesis_config: GenesisConfig,
        network: &Arc<MemoryNetwork>,
        rounder: Arc<dyn Rounder>,
    ) -> Result<(Self, mpsc::Receiver<OutboundMessage>)> {
        config.validate().context("Invalid node configuration")?;
        info!(
            "Initializing node {} in shard {} of {}",
            config.node_name, config.sharding.self_shard_id, config.sharding.number_of_shards
        );

        // Level 0
        let shard_coordinator: Arc<dyn ShardCoordinator> = Arc::new(
            MultiShardCoordinator::new(
                config.sharding.number_of_shards,
                config.sharding.self_shard_id,
            )
            .context("Failed to create shard coordinator")?,
        );
        let hasher: Arc<dyn Hasher> = Arc::new(Keccak256Hasher);
        let marshalizer = BincodeMarshalizer;
        let address_converter: Arc<dyn AddressConverter> =
            Arc::new(PlainAddressConverter::new(config.sharding.address_len));
        let accounts = Arc::new(InMemoryAccountsDb::new(marshalizer, Arc::clone(&hasher)));
        let storage = Arc::new(MemoryStorage::new());
        let pools = DataPools::new();

        // Level 1
        let genesis = GenesisBuilder::new(genesis_config)
            .build(
                shard_coordinator.as_ref(),
                address_converter.as_ref(),
                accounts.as_ref(),
                hasher.as_ref(),
                &marshalizer,
            )
            .context("Failed to build genesis")?;
        let own_genesis = genesis
            .header(config.sharding.self_shard_id)
            .cloned()
            .context("Genesis has no header for the node's shard")?;
        let chain = Arc::new(BlockChain::with_genesis(own_genesis, genesis.self_hash.clone()));

        let validator = Arc::new(BlockValidator::new(
            Arc::clone(&hasher),
            marshalizer,
            Arc::clone(&shard_coordinator),
        ));
        validator
            .set_last_notarized_headers(&genesis.headers)
            .context("Failed to seed notarized headers")?;
        let fork_detector = Arc::new(BasicForkDetector::new(Arc::clone(&rounder)));

        // Level 2
        let messenger = MemoryMessenger::new(config.node_name.clone(), network);
        let resolvers = Arc::new(
            ShardResolversContainerFactory::new(
                Arc::clone(&shard_coordinator),
                messenger.clone(),
                storage.clone(),
                marshalizer,
                pools.clone(),
            )
            .create()
            .context("Failed to create resolvers")?,
        );
        let request_handler = Arc::new(ResolverRequestHandler::new(
            Arc::clone(&resolvers),
            Arc::clone(&shard_coordinator),
        ));

        // Level 3
        let intermediate = Arc::new(IntermediateResultsProcessor::new(
            Arc::clone(&hasher),
            marshalizer,
            Arc::clone(&shard_coordinator),
            Arc::clone(&address_converter),
            storage.clone(),
            BlockType::SmartContractResultBlock,
        ));
        let settlement = Arc::new(ResultSettlementProcessor::new(
            accounts.clone(),
            Arc::clone(&address_converter),
            Arc::clone(&shard_coordinator),
        ));
        let contracts = Arc::new(SettlementContractProcessor::new(
            accounts.clone(),
            Arc::clone(&address_converter),
            Arc::clone(&shard_coordinator),
            Arc::clone(&hasher),
            marshalizer,
            intermediate.clone(),
            Arc::clone(&settlement),
        ));
        let tx_processor = Arc::new(TxProcessor::new(
            accounts.clone(),
            Arc::clone(&address_converter),
            Arc::clone(&shard_coordinator),
            contracts,
        ));
        let scr_preprocessor = Arc::new(SmartContractResultPreprocessor::new(
            Arc::clone(&pools.unsigned_transactions),
            storage.clone(),
            Arc::clone(&hasher),
            marshalizer,
            settlement,
            Arc::clone(&shard_coordinator),
            request_handler.clone(),
        ));

        // Level 4
        let processor = Arc::new(ShardBlockProcessor::new(
            ProcessorComponents {
                accounts: accounts.clone(),
                validator: Arc::clone(&validator),
                tx_processor,
                scr_preprocessor,
                intermediate,
                fork_detector: fork_detector.clone(),
                shard_coordinator: Arc::clone(&shard_coordinator),
                tx_pool: Arc::clone(&pools.transactions),
                mini_block_pool: Arc::clone(&pools.mini_blocks),
                storage: storage.clone(),
                request_handler: request_handler.clone(),
                hasher: Arc::clone(&hasher),
                marshalizer,
            },
            config.processing.processor_config(),
        ));

        let (queue, outbound) = BroadcastQueue::new(&config.network.broadcast_config());
        let chain_messenger = Arc::new(ShardChainMessenger::new(
            marshalizer,
            queue,
            Arc::clone(&shard_coordinator),
        ));

        let topics = InterceptorWiring {
            messenger: messenger.clone(),
            shard_coordinator: Arc::clone(&shard_coordinator),
            address_converter: Arc::clone(&address_converter),
            pools: pools.clone(),
            hasher: Arc::clone(&hasher),
            marshalizer,
            fork_detector: fork_detector.clone(),
        }
        .register()
        .context("Failed to join data topics")?;

        info!(
            "Node {} ready: {} resolvers, {} data topics",
            config.node_name,
            resolvers.len(),
            topics.len()
        );

        Ok((
            Self {
                config,
                hasher,
                marshalizer,
                shard_coordinator,
                address_converter,
                accounts,
                storage,
                pools,
                rounder,
                fork_detector,
                messenger,
                resolvers,
                request_handler,
                validator,
                processor,
                chain,
                chain_messenger,
                genesis,
            },
            outbound,
        ))
    }
}
