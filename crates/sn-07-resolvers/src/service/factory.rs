//! # Resolver Container Factories
//!
//! Wire one resolver per data topic a node serves, join its request topic
//! and attach the resolver as that topic's processor.
//!
//! A shard node serves its transactions, results and mini-blocks toward
//! every shard, its own headers, and metachain headers. A metachain node
//! serves the shard headers it notarizes and metachain headers.

use std::sync::Arc;

use shared_types::{
    BincodeMarshalizer, DataPools, Marshalizer, ShardId, StorageService, UnitType,
    METACHAIN_SHARD_ID,
};
use sn_02_sharding::ShardCoordinator;
use tracing::info;

use crate::domain::topics::{
    request_topic, shard_topic, HEADERS_TOPIC, METACHAIN_BLOCKS_TOPIC, MINI_BLOCKS_TOPIC,
    SHARD_HEADERS_FOR_METACHAIN_TOPIC, TRANSACTIONS_TOPIC, UNSIGNED_TRANSACTIONS_TOPIC,
};
use crate::domain::ResolverResult;
use crate::ports::{Messenger, Resolver};
use crate::service::{
    DiffPeerListCreator, HeaderResolver, MiniBlockResolver, ResolversContainer,
    TopicResolverSender, TxResolver,
};

/// Collaborators shared by both factories.
struct FactoryBase<M: Marshalizer> {
    shard_coordinator: Arc<dyn ShardCoordinator>,
    messenger: Arc<dyn Messenger>,
    storage: Arc<dyn StorageService>,
    marshalizer: M,
    pools: DataPools,
}

impl<M: Marshalizer + Clone> FactoryBase<M> {
    /// Sender asking peers on `topic`'s request topic, skipping peers that
    /// are also on `excluded` (a data topic; empty for none).
    fn sender(&self, topic: &str, excluded: &str, target_shard_id: ShardId) -> TopicResolverSender<M> {
        let excluded_request = if excluded.is_empty() {
            String::new()
        } else {
            request_topic(excluded)
        };
        let peers = DiffPeerListCreator::new(
            Arc::clone(&self.messenger),
            &request_topic(topic),
            &excluded_request,
        );
        TopicResolverSender::new(
            Arc::clone(&self.messenger),
            topic,
            peers,
            self.marshalizer.clone(),
            target_shard_id,
        )
    }

    fn register<R>(&self, container: &ResolversContainer, topic: &str, resolver: Arc<R>) -> ResolverResult<()>
    where
        R: Resolver + 'static,
    {
        let request = request_topic(topic);
        self.messenger.create_topic(&request, false)?;
        self.messenger
            .register_message_processor(&request, resolver.clone())?;
        container.add(topic, resolver)
    }

    fn header_resolver(
        &self,
        topic: &str,
        excluded: &str,
        target_shard_id: ShardId,
    ) -> Arc<HeaderResolver<M>> {
        let (headers, header_unit, nonce_unit) = if target_shard_id == METACHAIN_SHARD_ID {
            (
                Arc::clone(&self.pools.meta_blocks),
                UnitType::MetaBlock,
                UnitType::MetaHdrNonceHash,
            )
        } else {
            (
                Arc::clone(&self.pools.headers),
                UnitType::BlockHeader,
                UnitType::ShardHdrNonceHash(target_shard_id),
            )
        };

        Arc::new(HeaderResolver::new(
            self.sender(topic, excluded, target_shard_id),
            headers,
            Arc::clone(&self.pools.header_nonces),
            Arc::clone(&self.storage),
            header_unit,
            nonce_unit,
        ))
    }

    fn add_meta_header_resolver(&self, container: &ResolversContainer) -> ResolverResult<()> {
        let resolver = self.header_resolver(METACHAIN_BLOCKS_TOPIC, "", METACHAIN_SHARD_ID);
        self.register(container, METACHAIN_BLOCKS_TOPIC, resolver)
    }
}

/// Builds the resolvers of a shard node.
pub struct ShardResolversContainerFactory<M: Marshalizer = BincodeMarshalizer> {
    base: FactoryBase<M>,
}

impl<M: Marshalizer + Clone> ShardResolversContainerFactory<M> {
    /// Create a factory.
    pub fn new(
        shard_coordinator: Arc<dyn ShardCoordinator>,
        messenger: Arc<dyn Messenger>,
        storage: Arc<dyn StorageService>,
        marshalizer: M,
        pools: DataPools,
    ) -> Self {
        Self {
            base: FactoryBase {
                shard_coordinator,
                messenger,
                storage,
                marshalizer,
                pools,
            },
        }
    }

    /// Build the container and join every request topic.
    pub fn create(&self) -> ResolverResult<ResolversContainer> {
        let base = &self.base;
        let coordinator = base.shard_coordinator.as_ref();
        let self_id = coordinator.self_id();
        let container = ResolversContainer::new();

        for shard_id in 0..coordinator.number_of_shards() {
            // Cross-shard requests go to peers of the other shard
            let (tx_excluded, scr_excluded, mb_excluded) = if shard_id == self_id {
                (String::new(), String::new(), String::new())
            } else {
                (
                    shard_topic(coordinator, TRANSACTIONS_TOPIC, self_id),
                    shard_topic(coordinator, UNSIGNED_TRANSACTIONS_TOPIC, self_id),
                    shard_topic(coordinator, MINI_BLOCKS_TOPIC, self_id),
                )
            };

            let topic = shard_topic(coordinator, TRANSACTIONS_TOPIC, shard_id);
            let resolver = Arc::new(TxResolver::new(
                base.sender(&topic, &tx_excluded, shard_id),
                Arc::clone(&base.pools.transactions),
                Arc::clone(&base.storage),
                UnitType::Transaction,
            ));
            base.register(&container, &topic, resolver)?;

            let topic = shard_topic(coordinator, UNSIGNED_TRANSACTIONS_TOPIC, shard_id);
            let resolver = Arc::new(TxResolver::new(
                base.sender(&topic, &scr_excluded, shard_id),
                Arc::clone(&base.pools.unsigned_transactions),
                Arc::clone(&base.storage),
                UnitType::UnsignedTransaction,
            ));
            base.register(&container, &topic, resolver)?;

            let topic = shard_topic(coordinator, MINI_BLOCKS_TOPIC, shard_id);
            let resolver = Arc::new(MiniBlockResolver::new(
                base.sender(&topic, &mb_excluded, shard_id),
                Arc::clone(&base.pools.mini_blocks),
                Arc::clone(&base.storage),
            ));
            base.register(&container, &topic, resolver)?;
        }

        let topic = shard_topic(coordinator, HEADERS_TOPIC, self_id);
        let resolver = base.header_resolver(&topic, "", self_id);
        base.register(&container, &topic, resolver)?;

        base.add_meta_header_resolver(&container)?;

        info!(
            "[sn-07] Created {} resolvers for shard {}",
            container.len(),
            self_id
        );
        Ok(container)
    }
}

/// Builds the resolvers of a metachain node.
pub struct MetaResolversContainerFactory<M: Marshalizer = BincodeMarshalizer> {
    base: FactoryBase<M>,
}

impl<M: Marshalizer + Clone> MetaResolversContainerFactory<M> {
    /// Create a factory.
    pub fn new(
        shard_coordinator: Arc<dyn ShardCoordinator>,
        messenger: Arc<dyn Messenger>,
        storage: Arc<dyn StorageService>,
        marshalizer: M,
        pools: DataPools,
    ) -> Self {
        Self {
            base: FactoryBase {
                shard_coordinator,
                messenger,
                storage,
                marshalizer,
                pools,
            },
        }
    }

    /// Build the container and join every request topic.
    pub fn create(&self) -> ResolverResult<ResolversContainer> {
        let base = &self.base;
        let coordinator = base.shard_coordinator.as_ref();
        let container = ResolversContainer::new();
        let excluded = shard_topic(
            coordinator,
            SHARD_HEADERS_FOR_METACHAIN_TOPIC,
            coordinator.self_id(),
        );

        for shard_id in 0..coordinator.number_of_shards() {
            let topic = shard_topic(coordinator, SHARD_HEADERS_FOR_METACHAIN_TOPIC, shard_id);
            let resolver = base.header_resolver(&topic, &excluded, shard_id);
            base.register(&container, &topic, resolver)?;
        }

        base.add_meta_header_resolver(&container)?;

        info!("[sn-07] Created {} metachain resolvers", container.len());
        Ok(container)
    }
}
