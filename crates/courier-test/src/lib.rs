//! # Courier Test
//!
//! Drives a [`courier_server::Server`] in memory: requests go through the
//! probes, route lookup, body limits and the dispatcher exactly as they
//! would over a socket, without binding a port.
//!
//! ```
//! use courier_core::fixtures;
//! use courier_dispatch::Dispatcher;
//! use courier_router::Router;
//! use courier_server::Server;
//! use courier_test::TestClient;
//! use http::{Method, StatusCode};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let mut router = Router::new();
//! router.resource("/node", Method::POST, "node", "create", Some("json")).unwrap();
//!
//! let server = Server::builder()
//!     .router(router)
//!     .dispatcher(Dispatcher::builder().plugin(fixtures::node_resource()).unwrap().build())
//!     .build();
//!
//! let client = TestClient::new(server);
//! client
//!     .post("/node")
//!     .json(&serde_json::json!({"title": "Hello"}))
//!     .send()
//!     .await
//!     .assert_status(StatusCode::CREATED)
//!     .assert_content_type("application/json");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/courier-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod response;

pub use client::{TestClient, TestRequest};
pub use error::TestError;
pub use response::TestResponse;
