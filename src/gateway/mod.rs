//! Network-facing collaborators: token resolution, remote intent
//! extraction, ENS, and the routing engine boundary

pub mod ens;
pub mod intent_client;
pub mod routing;
pub mod tokens;

pub use ens::{EnsResolver, HttpEnsResolver};
pub use intent_client::{HttpIntentClient, IntentExtractor, LocalIntentExtractor};
pub use routing::{
    best_dex_info, dex_name, DexInfo, FieldValue, FormField, Route, RouteEvent, RouteStep,
    RouteSubscribers, RoutingEngine, SubscriptionId, ToolDetails,
};
pub use tokens::{
    select_token, HttpTokenResolver, ResolutionGateway, TokenCache, TokenRecord, TokenResolver,
};
