//! Resolver services: request sending and answering, container wiring and
//! outbound broadcast.

pub mod broadcast;
pub mod chain_messenger;
pub mod container;
pub mod factory;
pub mod request_handler;
pub mod resolvers;
pub mod topic_sender;

pub use broadcast::{run_broadcast_worker, BroadcastConfig, BroadcastQueue, OutboundMessage};
pub use chain_messenger::ShardChainMessenger;
pub use container::ResolversContainer;
pub use factory::{MetaResolversContainerFactory, ShardResolversContainerFactory};
pub use request_handler::ResolverRequestHandler;
pub use resolvers::{HeaderResolver, MiniBlockResolver, TxResolver};
pub use topic_sender::{DiffPeerListCreator, TopicResolverSender};
