pub mod chat_history;
pub mod controller;
pub mod health_poller;
pub mod metrics_manager;
pub mod renderer;
pub mod router_client;
