pub mod api_routes;
pub mod chat_routes;
